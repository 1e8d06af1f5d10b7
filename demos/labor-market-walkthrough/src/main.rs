//! Labor market walkthrough
//!
//! Walks requests through their whole lifecycle:
//!
//! 1. **Constant threshold** with reputation: escrow, reservations, work,
//!    reviews, claims, remainder, and the reputation each claim mints
//! 2. **Dynamic bucket**: a late qualifier marks down an earlier share, and
//!    the event log shows each revision
//! 3. **Guards**: double reservation, double claim, and an early claim
//!
//! Set `RUST_LOG=debug` to see every reservation and ledger move.

use std::sync::Arc;

use anyhow::Result;
use colored::Colorize;
use labor_market::{LaborMarket, ManualClock, MarketEvent};
use labor_market_enforcement::build_engine;
use labor_market_ledger::{SharedTokenLedger, TokenLedger};
use labor_market_reputation::{ReputationEngine, ReputationToken, SharedReputation};
use labor_market_types::{
    AccountId, EnforcementConfig, EnforcementKind, EscrowLeg, MarketConfig, ReputationParams,
    RequestConfig, TokenId,
};
use tracing_subscriber::EnvFilter;

const SIGNAL_EXPIRY: u64 = 1_000;
const SUBMISSION_EXPIRY: u64 = 2_000;
const ENFORCEMENT_EXPIRY: u64 = 3_000;

fn header(title: &str) {
    println!();
    println!("{}", "═".repeat(72).cyan());
    println!("  {}", title.cyan().bold());
    println!("{}", "═".repeat(72).cyan());
}

fn step(text: impl std::fmt::Display) {
    println!("  {} {}", "├".dimmed(), text);
}

fn rejected(call: &str, err: impl std::fmt::Display) {
    println!("  {} {} {}", "├".dimmed(), call, format!("rejected: {}", err).red());
}

fn request_config(provider: &TokenId, reviewer: &TokenId, limits: (u64, u64), totals: (u128, u128)) -> RequestConfig {
    RequestConfig {
        signal_expiry: SIGNAL_EXPIRY,
        submission_expiry: SUBMISSION_EXPIRY,
        enforcement_expiry: ENFORCEMENT_EXPIRY,
        provider_limit: limits.0,
        reviewer_limit: limits.1,
        provider_leg: EscrowLeg::new(provider.clone(), totals.0),
        reviewer_leg: EscrowLeg::new(reviewer.clone(), totals.1),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    println!();
    println!("{}", "╔══════════════════════════════════════════════════════════════╗".cyan());
    println!("{}", "║    Labor Market Walkthrough                                  ║".cyan().bold());
    println!("{}", "╚══════════════════════════════════════════════════════════════╝".cyan());

    let usdc = TokenId::new("USDC");
    let dai = TokenId::new("DAI");
    let owner = AccountId::new("market-owner");
    let requester = AccountId::new("acme");
    let alice = AccountId::new("alice");
    let bob = AccountId::new("bob");
    let carol = AccountId::new("carol");
    let dave = AccountId::new("dave");

    let tokens = SharedTokenLedger::new();
    tokens.mint(&usdc, &requester, 10_000)?;
    tokens.mint(&dai, &requester, 1_000)?;

    // ── Part 1: Constant threshold with reputation ──────────────────
    header("Part 1: Constant threshold, reputation rewards");

    let clock = Arc::new(ManualClock::new(0));
    let reputation = SharedReputation::new(ReputationEngine::new());
    let badge = ReputationToken::new("badge", 1);
    let mut market = LaborMarket::new(
        tokens.clone(),
        build_engine(EnforcementKind::ConstantThreshold),
        clock.clone(),
    )
    .with_reputation(reputation.clone());
    {
        let mut engine = reputation.write()?;
        engine.use_reputation_module(market.market_id(), badge.clone());
        engine.set_decay_config(badge.clone(), 1, 500, 0)?;
    }
    market.initialize(MarketConfig {
        owner: owner.clone(),
        uri: "ipfs://translation-market".into(),
        enforcement: EnforcementKind::ConstantThreshold,
        curve: EnforcementConfig::threshold(100, 60, 10_000),
        gated: false,
        reputation: Some(ReputationParams {
            signal_min: 0,
            signal_max: None,
            provider_reward: 10,
            reviewer_reward: 2,
            provide_stake: 0,
            review_stake: 0,
        }),
    })?;
    step(format!("market {} initialized", market.market_id().to_string().yellow()));

    let request = market.submit_request(
        &requester,
        request_config(&usdc, &dai, (2, 4), (2_000, 400)),
        "ipfs://translate-whitepaper",
    )?;
    let (held_usdc, held_dai) = (
        tokens.balance_of(&usdc, market.escrow_account())?,
        tokens.balance_of(&dai, market.escrow_account())?,
    );
    step(format!("{} escrowed {} USDC / {} DAI", request, held_usdc, held_dai));

    market.signal_review(&carol, request, 2)?;
    market.signal_review(&dave, request, 2)?;
    market.signal(&alice, request)?;
    market.signal(&bob, request)?;
    step("alice and bob reserved provider slots; carol and dave two reviews each");

    clock.set(SIGNAL_EXPIRY);
    let good = market.provide(&alice, request, "ipfs://alice-translation")?;
    let poor = market.provide(&bob, request, "ipfs://bob-translation")?;
    step(format!("submissions {} (alice) and {} (bob)", good, poor));

    clock.set(SUBMISSION_EXPIRY);
    market.review(&carol, request, good, 90, "ipfs://carol-1")?;
    market.review(&dave, request, good, 70, "ipfs://dave-1")?;
    market.review(&carol, request, poor, 40, "ipfs://carol-2")?;
    market.review(&dave, request, poor, 50, "ipfs://dave-2")?;
    for submission in [good, poor] {
        if let Some(acc) = market.accumulator(submission) {
            step(format!(
                "{} average {} -> {}",
                submission,
                acc.average(),
                if acc.qualified { "qualified".green() } else { "below threshold".red() }
            ));
        }
    }

    clock.set(ENFORCEMENT_EXPIRY + 1);
    step(format!("phase: {:?}", market.phase(request)?));
    for submission in [good, poor] {
        let receipt = market.claim(&requester, request, submission)?;
        step(format!(
            "claim {}: provider {} paid {}, reviewers paid {}",
            submission,
            receipt.provider,
            receipt.provider_paid.to_string().green(),
            receipt.reviewer_total()
        ));
    }
    let (usdc_back, dai_back) = market.claim_remainder(&requester, request)?;
    step(format!("remainder refunded: {} USDC / {} DAI", usdc_back, dai_back));
    let (again_usdc, again_dai) = market.claim_remainder(&requester, request)?;
    step(format!("second remainder call pays {} / {}", again_usdc, again_dai));

    if let Some(state) = market.payment_state(request) {
        step(format!(
            "conserved: {}",
            if state.is_conserved() { "yes".green() } else { "no".red() }
        ));
    }
    {
        let engine = reputation.read()?;
        let now = ENFORCEMENT_EXPIRY + 1;
        for who in [&alice, &bob, &carol, &dave] {
            step(format!(
                "reputation of {}: {}",
                who,
                engine.get_available_reputation(&market.market_id(), who, now)?
            ));
        }
        let later = now + 1_000;
        step(format!(
            "alice after 1000 more epochs of decay: {}",
            engine.get_available_reputation(&market.market_id(), &alice, later)?
        ));
    }

    // ── Part 2: Dynamic bucket ───────────────────────────────────────
    header("Part 2: Dynamic bucket revisions");

    let clock = Arc::new(ManualClock::new(0));
    let mut buckets = LaborMarket::new(
        tokens.clone(),
        build_engine(EnforcementKind::DynamicBucket),
        clock.clone(),
    );
    buckets.initialize(MarketConfig {
        owner: owner.clone(),
        uri: "ipfs://audit-market".into(),
        enforcement: EnforcementKind::DynamicBucket,
        curve: EnforcementConfig::new(100, vec![50, 80], vec![1, 2]),
        gated: false,
        reputation: None,
    })?;
    let request = buckets.submit_request(
        &requester,
        request_config(&usdc, &dai, (3, 3), (900, 90)),
        "ipfs://audit-contract",
    )?;
    buckets.signal_review(&dave, request, 3)?;
    for who in [&alice, &bob, &carol] {
        buckets.signal(who, request)?;
    }
    clock.set(SIGNAL_EXPIRY);
    let mut submissions = Vec::new();
    for who in [&alice, &bob, &carol] {
        submissions.push(buckets.provide(who, request, format!("ipfs://{}-audit", who))?);
    }
    clock.set(SUBMISSION_EXPIRY);
    for (submission, score) in submissions.iter().zip([95, 60, 30]) {
        buckets.review(&dave, request, *submission, score, "ipfs://dave-audit")?;
    }
    for event in buckets.events() {
        if let MarketEvent::RequestReviewed {
            submission,
            score,
            earnings,
            remainder,
            intent_change,
            ..
        } = event
        {
            step(format!(
                "{} scored {}: earns {}, remainder {}, intent change {}",
                submission, score, earnings, remainder, intent_change
            ));
        }
    }
    clock.set(ENFORCEMENT_EXPIRY + 1);
    for submission in &submissions {
        let receipt = buckets.claim(&requester, request, *submission)?;
        step(format!("{} paid {}", submission, receipt.provider_paid.to_string().green()));
    }
    let (usdc_back, _) = buckets.claim_remainder(&requester, request)?;
    step(format!("remainder {}", usdc_back));

    // ── Part 3: Guards ───────────────────────────────────────────────
    header("Part 3: Guards");

    let clock = Arc::new(ManualClock::new(0));
    let mut guarded = LaborMarket::new(
        tokens.clone(),
        build_engine(EnforcementKind::ConstantThreshold),
        clock.clone(),
    );
    guarded.initialize(MarketConfig {
        owner,
        uri: "ipfs://guarded".into(),
        enforcement: EnforcementKind::ConstantThreshold,
        curve: EnforcementConfig::threshold(100, 50, 10_000),
        gated: false,
        reputation: None,
    })?;
    let request = guarded.submit_request(
        &requester,
        request_config(&usdc, &dai, (1, 1), (100, 10)),
        "ipfs://small-job",
    )?;
    guarded.signal(&alice, request)?;
    if let Err(err) = guarded.signal(&alice, request) {
        rejected("second signal", &err);
    }
    if let Err(err) = guarded.signal(&bob, request) {
        rejected("signal on full request", &err);
    }
    guarded.signal_review(&carol, request, 1)?;
    clock.set(SIGNAL_EXPIRY);
    let submission = guarded.provide(&alice, request, "ipfs://job")?;
    clock.set(SUBMISSION_EXPIRY);
    guarded.review(&carol, request, submission, 80, "ipfs://ok")?;
    if let Err(err) = guarded.claim(&alice, request, submission) {
        rejected("claim during enforcement window", &err);
    }
    clock.set(ENFORCEMENT_EXPIRY + 1);
    guarded.claim(&alice, request, submission)?;
    if let Err(err) = guarded.claim(&alice, request, submission) {
        rejected("second claim", &err);
    }

    println!();
    println!("{}", "Event log of the guarded market:".bold());
    println!("{}", serde_json::to_string_pretty(guarded.events())?);
    Ok(())
}
