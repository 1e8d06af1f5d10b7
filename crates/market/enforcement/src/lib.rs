//! # labor-market-enforcement
//!
//! Pluggable scoring engines behind the `EnforcementCriteria` trait:
//!
//! - **Constant-Threshold**: a fixed fraction of the slot share once the
//!   average clears the threshold, nothing below it
//! - **Scalable-Curve**: slot share scaled by a piecewise-linear curve
//! - **Dynamic-Bucket**: the whole provider pool split across qualifying
//!   submissions in proportion to their bucket weights; shares are revised
//!   as submissions qualify and pinned once claimed
//!
//! Reviewers earn a flat per-review rate under every engine.

pub mod bucket;
pub mod constant;
pub mod curve;
pub mod engine;
pub mod error;
pub mod scalable;
mod tally;

pub use bucket::DynamicBucketEnforcement;
pub use constant::ConstantThresholdEnforcement;
pub use curve::{Curve, CurveRegistry};
pub use engine::{build_engine, EnforcementCriteria, RequestPool, ReviewUpdate, Reward};
pub use error::EnforcementError;
pub use scalable::ScalableCurveEnforcement;
