use labor_market_types::{AccountId, Amount, Epoch, MarketId, TokenId};
use serde::{Deserialize, Serialize};

/// One reputation badge: a token contract plus the id within it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReputationToken {
    pub token: TokenId,
    pub token_id: u64,
}

impl ReputationToken {
    pub fn new(token: impl Into<String>, token_id: u64) -> Self {
        Self {
            token: TokenId::new(token),
            token_id,
        }
    }
}

impl std::fmt::Display for ReputationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.token, self.token_id)
    }
}

/// Decay schedule of one reputation token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecayConfig {
    /// Units lost per elapsed interval.
    pub rate: Amount,
    /// Epochs per interval.
    pub interval: Epoch,
    /// No decay accrues before this epoch.
    pub start_epoch: Epoch,
}

impl DecayConfig {
    pub fn is_active(&self) -> bool {
        self.rate > 0 && self.interval > 0
    }
}

/// Stored balance of one participant in one reputation token.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationAccount {
    pub balance: Amount,
    pub last_decay_epoch: Epoch,
    pub frozen_until_epoch: Epoch,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReputationEvent {
    MarketReputationConfigured {
        market: MarketId,
        token: ReputationToken,
    },
    ReputationDecayConfigured {
        token: ReputationToken,
        config: DecayConfig,
    },
    /// `delta` is signed: mints are positive, revokes and decay negative.
    ReputationBalanceChange {
        token: ReputationToken,
        account: AccountId,
        delta: i128,
        balance: Amount,
    },
    ReputationFrozen {
        token: ReputationToken,
        account: AccountId,
        until_epoch: Epoch,
    },
}
