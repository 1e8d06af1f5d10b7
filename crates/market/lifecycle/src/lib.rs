//! # labor-market
//!
//! Request lifecycle of a decentralized labor market.
//!
//! A requester escrows a provider pool and a reviewer pool, providers and
//! reviewers reserve capacity, providers submit work, reviewers score it,
//! and the market's enforcement engine decides how the pools are paid out.
//!
//! ## Windows
//!
//! Phases are never stored; every call derives them from the clock and the
//! request deadlines (all bounds inclusive):
//!
//! | Call | Open while |
//! |---|---|
//! | `signal`, `signal_review` | `now <= signal_expiry` |
//! | `provide` | `signal_expiry <= now <= submission_expiry` |
//! | `review` | `submission_expiry <= now <= enforcement_expiry` |
//! | `claim`, `claim_remainder` | `now > enforcement_expiry` |
//! | `retrieve_reputation` | once the caller's reservation is used up |
//!
//! ## Guarantees
//!
//! - `arrived <= reserved <= limit` for both roles
//! - a submission is paid at most once
//! - a failed call changes nothing
//! - once every reviewed submission is claimed and the remainder refunded,
//!   each leg's claims plus refunds equal what it escrowed

pub mod auth;
pub mod clock;
pub mod error;
pub mod events;
pub mod market;
pub mod mocks;
pub mod records;

pub use auth::{AuthorizationOracle, MarketAction};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ErrorClass, MarketError};
pub use events::MarketEvent;
pub use market::LaborMarket;
pub use records::{ClaimReceipt, PerformanceStatus, ReviewRecord};
