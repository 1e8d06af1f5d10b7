use thiserror::Error;

use crate::ids::Timestamp;

/// Configuration errors, detected synchronously when a market, curve or
/// request is configured. The caller has to resubmit corrected input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("deadlines out of order: signal {signal} < submission {submission} <= enforcement {enforcement} required")]
    DeadlineOrder {
        signal: Timestamp,
        submission: Timestamp,
        enforcement: Timestamp,
    },

    #[error("signal deadline {signal} already passed at {now}")]
    DeadlineInPast { signal: Timestamp, now: Timestamp },

    #[error("{leg} limit must be non-zero")]
    ZeroLimit { leg: String },

    #[error("{leg} leg total is zero while its limit is {limit}")]
    UnfundedLeg { leg: String, limit: u64 },

    #[error("curve needs at least one breakpoint")]
    EmptyCurve,

    #[error("curve has {breakpoints} breakpoints but {weights} weights")]
    CurveLengthMismatch { breakpoints: usize, weights: usize },

    #[error("curve {series} must be non-decreasing (index {index})")]
    NonMonotonicCurve { series: String, index: usize },

    #[error("curve pays nothing: highest weight is zero")]
    ZeroCurve,

    #[error("max score must be non-zero")]
    ZeroMaxScore,

    #[error("breakpoint {breakpoint} exceeds max score {max_score}")]
    BreakpointAboveMax { breakpoint: u64, max_score: u64 },

    #[error("invalid curve shape: {0}")]
    InvalidCurveShape(String),

    #[error("invalid market configuration: {0}")]
    InvalidMarket(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),
}
