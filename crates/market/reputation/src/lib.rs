//! # labor-market-reputation
//!
//! Market-scoped reputation balances that decay over discrete epochs.
//!
//! A market binds to one `ReputationToken`; each token carries a
//! `DecayConfig` (`rate` units lost per `interval` epochs, never before
//! `start_epoch`). Decay is lazy: `pending_decay` is a pure function of the
//! stored account and the current epoch, and it is only written back when a
//! mint, revoke or freeze touches the account.
//!
//! Freezing an account pauses decay entirely until the freeze epoch; the
//! frozen epochs never count towards elapsed intervals.

pub mod decay;
pub mod engine;
pub mod error;
pub mod shared;
pub mod types;

pub use decay::pending_decay;
pub use engine::ReputationEngine;
pub use error::ReputationError;
pub use shared::SharedReputation;
pub use types::{DecayConfig, ReputationAccount, ReputationEvent, ReputationToken};
