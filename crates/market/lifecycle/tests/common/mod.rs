//! Shared fixtures for the lifecycle integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use labor_market::{LaborMarket, ManualClock};
use labor_market_enforcement::build_engine;
use labor_market_ledger::{SharedTokenLedger, TokenLedger};
use labor_market_types::{
    AccountId, Amount, EnforcementConfig, EnforcementKind, EscrowLeg, MarketConfig, RequestConfig,
    RequestId, SubmissionId, TokenId,
};

pub const SIGNAL_EXPIRY: u64 = 100;
pub const SUBMISSION_EXPIRY: u64 = 200;
pub const ENFORCEMENT_EXPIRY: u64 = 300;

/// Provider-leg token.
pub fn usdc() -> TokenId {
    TokenId::new("USDC")
}

/// Reviewer-leg token.
pub fn dai() -> TokenId {
    TokenId::new("DAI")
}

pub fn owner() -> AccountId {
    AccountId::new("owner")
}

pub fn requester() -> AccountId {
    AccountId::new("requester")
}

pub fn provider(n: u32) -> AccountId {
    AccountId::new(format!("provider-{}", n))
}

pub fn reviewer(n: u32) -> AccountId {
    AccountId::new(format!("reviewer-{}", n))
}

pub fn market_config(kind: EnforcementKind, curve: EnforcementConfig) -> MarketConfig {
    MarketConfig {
        owner: owner(),
        uri: "ipfs://market".into(),
        enforcement: kind,
        curve,
        gated: false,
        reputation: None,
    }
}

/// Pass/fail at 50 out of 100, paying the whole slot share.
pub fn pass_fail() -> EnforcementConfig {
    EnforcementConfig::threshold(100, 50, 10_000)
}

/// Buckets at 50 (weight 1) and 80 (weight 2), out of 100.
pub fn two_buckets() -> EnforcementConfig {
    EnforcementConfig::new(100, vec![50, 80], vec![1, 2])
}

/// 1-to-4 Likert scale; 1 pays nothing, 4 pays the full slot share.
pub fn likert() -> EnforcementConfig {
    EnforcementConfig::new(4, vec![0, 1, 2, 3, 4], vec![0, 0, 100, 200, 300])
}

pub fn request_config(
    provider_total: Amount,
    reviewer_total: Amount,
    provider_limit: u64,
    reviewer_limit: u64,
) -> RequestConfig {
    RequestConfig {
        signal_expiry: SIGNAL_EXPIRY,
        submission_expiry: SUBMISSION_EXPIRY,
        enforcement_expiry: ENFORCEMENT_EXPIRY,
        provider_limit,
        reviewer_limit,
        provider_leg: EscrowLeg::new(usdc(), provider_total),
        reviewer_leg: EscrowLeg::new(dai(), reviewer_total),
    }
}

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub tokens: SharedTokenLedger,
    pub market: LaborMarket<SharedTokenLedger>,
}

impl Harness {
    /// An uninitialized market with the engine for `kind`, clock at zero.
    pub fn blank(kind: EnforcementKind) -> Self {
        let clock = Arc::new(ManualClock::new(0));
        let tokens = SharedTokenLedger::new();
        let market = LaborMarket::new(tokens.clone(), build_engine(kind), clock.clone());
        Self {
            clock,
            tokens,
            market,
        }
    }

    pub fn new(kind: EnforcementKind, curve: EnforcementConfig) -> Self {
        let mut harness = Self::blank(kind);
        harness
            .market
            .initialize(market_config(kind, curve))
            .unwrap();
        harness
    }

    pub fn fund(&self, account: &AccountId, usdc_amount: Amount, dai_amount: Amount) {
        self.tokens.mint(&usdc(), account, usdc_amount).unwrap();
        self.tokens.mint(&dai(), account, dai_amount).unwrap();
    }

    /// Fund the requester with exactly the escrow and submit the request.
    pub fn open_request(&mut self, config: RequestConfig) -> RequestId {
        self.fund(&requester(), config.provider_leg.total, config.reviewer_leg.total);
        self.market
            .submit_request(&requester(), config, "ipfs://request")
            .unwrap()
    }

    pub fn at(&self, now: u64) {
        self.clock.set(now);
    }

    pub fn usdc_of(&self, account: &AccountId) -> Amount {
        self.tokens.balance_of(&usdc(), account).unwrap()
    }

    pub fn dai_of(&self, account: &AccountId) -> Amount {
        self.tokens.balance_of(&dai(), account).unwrap()
    }

    pub fn escrowed(&self) -> (Amount, Amount) {
        let escrow = self.market.escrow_account().clone();
        (self.usdc_of(&escrow), self.dai_of(&escrow))
    }

    /// Signal and provide in one go; leaves the clock in the submission window.
    pub fn deliver(&mut self, request: RequestId, who: &AccountId) -> SubmissionId {
        self.at(SIGNAL_EXPIRY);
        self.market.signal(who, request).unwrap();
        self.market.provide(who, request, "ipfs://work").unwrap()
    }

    pub fn score(&mut self, request: RequestId, submission: SubmissionId, who: &AccountId, score: u64) {
        self.at(SUBMISSION_EXPIRY);
        self.market
            .review(who, request, submission, score, "ipfs://review")
            .unwrap();
    }

    pub fn settle(&self) {
        self.at(ENFORCEMENT_EXPIRY + 1);
    }
}
