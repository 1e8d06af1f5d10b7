use labor_market_enforcement::EnforcementError;
use labor_market_ledger::LedgerError;
use labor_market_reputation::ReputationError;
use labor_market_types::{
    AccountId, Amount, ConfigError, LegKind, RequestId, RequestPhase, SubmissionId, Timestamp,
};
use thiserror::Error;

use crate::auth::MarketAction;

/// Coarse failure classes callers can branch on without matching every
/// variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    InvalidConfiguration,
    CapacityExhausted,
    NotAuthorized,
    WindowViolation,
    AlreadySettled,
    DoubleReservation,
    NotFound,
    MissingReservation,
    QuorumNotReached,
    Ledger,
}

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("market not initialized")]
    NotInitialized,

    #[error("market already initialized")]
    AlreadyInitialized,

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid market setup: {0}")]
    InvalidConfiguration(String),

    #[error("reservation quantity must be non-zero")]
    InvalidQuantity,

    #[error("{role} slots of {request} exhausted: requested {requested}, available {available}")]
    CapacityExhausted {
        request: RequestId,
        role: LegKind,
        requested: u64,
        available: u64,
    },

    #[error("{account} is not authorized to {action}")]
    NotAuthorized {
        account: AccountId,
        action: MarketAction,
    },

    #[error("{account} cannot review own submission {submission}")]
    SelfReview {
        account: AccountId,
        submission: SubmissionId,
    },

    #[error("reputation {available} of {account} outside admitted range [{min}, {max:?}]")]
    InsufficientReputation {
        account: AccountId,
        available: Amount,
        min: Amount,
        max: Option<Amount>,
    },

    #[error("{action} on {request} not open during {phase:?} (now {now})")]
    WindowViolation {
        request: RequestId,
        action: MarketAction,
        phase: RequestPhase,
        now: Timestamp,
    },

    #[error("{0} was withdrawn")]
    RequestWithdrawn(RequestId),

    #[error("{0} already has provider reservations")]
    RequestCommitted(RequestId),

    #[error("{submission} of {request} already settled")]
    AlreadySettled {
        request: RequestId,
        submission: SubmissionId,
    },

    #[error("{account} already holds a {role} reservation on {request}")]
    DoubleReservation {
        request: RequestId,
        account: AccountId,
        role: LegKind,
    },

    #[error("{account} already reviewed {submission}")]
    AlreadyReviewed {
        account: AccountId,
        submission: SubmissionId,
    },

    #[error("{account} has no live {role} reservation on {request}")]
    NoReservation {
        request: RequestId,
        account: AccountId,
        role: LegKind,
    },

    #[error("request {0} not found")]
    RequestNotFound(RequestId),

    #[error("submission {0} not found")]
    SubmissionNotFound(SubmissionId),

    #[error("{submission} does not belong to {request}")]
    SubmissionMismatch {
        request: RequestId,
        submission: SubmissionId,
    },

    #[error("{0} has no reviews")]
    QuorumNotReached(SubmissionId),

    #[error("stake of {account} on {request} is still locked")]
    StakeLocked { request: RequestId, account: AccountId },

    #[error("{account} already retrieved its stake on {request}")]
    StakeRetrieved { request: RequestId, account: AccountId },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("enforcement error: {0}")]
    Enforcement(#[from] EnforcementError),

    #[error("reputation error: {0}")]
    Reputation(#[from] ReputationError),
}

impl MarketError {
    pub fn class(&self) -> ErrorClass {
        match self {
            MarketError::NotInitialized
            | MarketError::AlreadyInitialized
            | MarketError::Config(_)
            | MarketError::InvalidConfiguration(_)
            | MarketError::InvalidQuantity => ErrorClass::InvalidConfiguration,
            MarketError::CapacityExhausted { .. } => ErrorClass::CapacityExhausted,
            MarketError::NotAuthorized { .. }
            | MarketError::SelfReview { .. }
            | MarketError::InsufficientReputation { .. }
            | MarketError::StakeLocked { .. } => ErrorClass::NotAuthorized,
            MarketError::WindowViolation { .. }
            | MarketError::RequestWithdrawn(_)
            | MarketError::RequestCommitted(_) => ErrorClass::WindowViolation,
            MarketError::AlreadySettled { .. } | MarketError::StakeRetrieved { .. } => {
                ErrorClass::AlreadySettled
            }
            MarketError::DoubleReservation { .. } | MarketError::AlreadyReviewed { .. } => {
                ErrorClass::DoubleReservation
            }
            MarketError::NoReservation { .. } => ErrorClass::MissingReservation,
            MarketError::RequestNotFound(_)
            | MarketError::SubmissionNotFound(_)
            | MarketError::SubmissionMismatch { .. } => ErrorClass::NotFound,
            MarketError::QuorumNotReached(_) => ErrorClass::QuorumNotReached,
            MarketError::Ledger(_) => ErrorClass::Ledger,
            MarketError::Enforcement(err) => match err {
                EnforcementError::AlreadyFinalized { .. } => ErrorClass::AlreadySettled,
                EnforcementError::UnknownSubmission { .. } => ErrorClass::NotFound,
                EnforcementError::Overflow(_) => ErrorClass::Ledger,
                _ => ErrorClass::InvalidConfiguration,
            },
            MarketError::Reputation(err) => match err {
                ReputationError::InsufficientReputation { .. } => ErrorClass::NotAuthorized,
                ReputationError::Overflow(_) | ReputationError::Unavailable(_) => ErrorClass::Ledger,
                _ => ErrorClass::InvalidConfiguration,
            },
        }
    }
}
