use labor_market_types::{ConfigError, MarketId, RequestId, SubmissionId};
use thiserror::Error;

/// Errors from the enforcement engines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnforcementError {
    #[error("no enforcement curve configured for {0}")]
    NotConfigured(MarketId),

    #[error("enforcement curve of {0} is in use and can no longer be reconfigured")]
    AlreadyInUse(MarketId),

    #[error("invalid enforcement curve: {0}")]
    InvalidCurve(#[from] ConfigError),

    #[error("score {score} exceeds max score {max_score}")]
    ScoreOutOfRange { score: u64, max_score: u64 },

    #[error("{submission} of {request} has no recorded reviews")]
    UnknownSubmission {
        request: RequestId,
        submission: SubmissionId,
    },

    #[error("{submission} of {request} already has a finalized reward")]
    AlreadyFinalized {
        request: RequestId,
        submission: SubmissionId,
    },

    #[error("arithmetic overflow computing {0}")]
    Overflow(String),
}
