use labor_market_types::{AccountId, Amount, MarketId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReputationError {
    #[error("market {0} has no reputation token")]
    MarketNotConfigured(MarketId),

    #[error("invalid decay configuration: {0}")]
    InvalidDecayConfig(String),

    #[error("insufficient reputation for {account}: required {required}, available {available}")]
    InsufficientReputation {
        account: AccountId,
        required: Amount,
        available: Amount,
    },

    #[error("reputation overflow in {0}")]
    Overflow(String),

    #[error("reputation engine unavailable: {0}")]
    Unavailable(String),
}
