//! # labor-market-types
//!
//! Shared vocabulary for the labor market crates:
//!
//! - **Identifiers**: market, account, token, request and submission ids
//! - **Requests**: `RequestConfig` (two escrow legs, three deadlines, slot limits),
//!   `ServiceRequest`, `SignalState`, `ServiceSubmission`
//! - **Scoring**: `ReviewAccumulator`, `RequestPhase`
//! - **Configuration**: `MarketConfig`, `EnforcementConfig`, `EnforcementKind`,
//!   `ReputationParams`
//!
//! ## Invariants
//!
//! - `signal_expiry < submission_expiry <= enforcement_expiry`
//! - `arrived <= reserved <= limit` for both provider and reviewer slots

pub mod config;
pub mod error;
pub mod ids;
pub mod request;

pub use config::{
    EnforcementConfig, EnforcementKind, MarketConfig, ReputationParams, BPS_DENOMINATOR,
};
pub use error::ConfigError;
pub use ids::{
    signed, signed_change, AccountId, Amount, Epoch, MarketId, RequestId, SubmissionId, Timestamp,
    TokenId,
};
pub use request::{
    EscrowLeg, LegKind, RequestConfig, RequestPhase, ReviewAccumulator, ServiceRequest,
    ServiceSubmission, SignalState,
};
