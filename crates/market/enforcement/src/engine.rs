use labor_market_types::{
    Amount, EnforcementConfig, EnforcementKind, MarketId, RequestConfig, RequestId, SubmissionId,
};
use serde::{Deserialize, Serialize};

use crate::bucket::DynamicBucketEnforcement;
use crate::constant::ConstantThresholdEnforcement;
use crate::error::EnforcementError;
use crate::scalable::ScalableCurveEnforcement;

/// Economic terms of one request, as seen by an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPool {
    pub provider_total: Amount,
    pub provider_limit: u64,
    pub reviewer_total: Amount,
    pub reviewer_limit: u64,
}

impl RequestPool {
    pub fn from_config(config: &RequestConfig) -> Self {
        Self {
            provider_total: config.provider_leg.total,
            provider_limit: config.provider_limit,
            reviewer_total: config.reviewer_leg.total,
            reviewer_limit: config.reviewer_limit,
        }
    }

    /// Provider pool divided evenly across provider slots.
    pub fn slot_share(&self) -> Amount {
        if self.provider_limit == 0 {
            0
        } else {
            self.provider_total / self.provider_limit as Amount
        }
    }

    /// Flat reviewer pay per recorded review.
    pub fn per_review(&self) -> Amount {
        if self.reviewer_limit == 0 {
            0
        } else {
            self.reviewer_total / self.reviewer_limit as Amount
        }
    }
}

/// Payout of one submission.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub provider: Amount,
    pub reviewer_per_review: Amount,
}

/// Running state reported after each review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub submission: SubmissionId,
    pub average: u64,
    pub qualified: bool,
    /// Provider reward this submission would currently earn.
    pub earnings: Amount,
    /// Provider pool not spoken for after this review.
    pub remainder: Amount,
    /// How much this review moved the remainder (positive = remainder shrank).
    pub intent_change: i128,
    /// First review of this submission.
    pub new_submission: bool,
}

/// Converts review scores into reward shares.
///
/// All state is keyed by market, so one engine may serve many markets.
pub trait EnforcementCriteria: Send + Sync {
    fn kind(&self) -> EnforcementKind;

    /// Install or replace the market curve. Fails once the curve has scored
    /// a review.
    fn configure(&mut self, market: MarketId, config: EnforcementConfig) -> Result<(), EnforcementError>;

    fn configuration(&self, market: &MarketId) -> Result<&EnforcementConfig, EnforcementError>;

    fn on_review(
        &mut self,
        market: &MarketId,
        request: RequestId,
        pool: &RequestPool,
        submission: SubmissionId,
        score: u64,
    ) -> Result<ReviewUpdate, EnforcementError>;

    /// Payout for a submission whose reviews averaged `average`.
    fn compute_reward(
        &self,
        market: &MarketId,
        request: RequestId,
        pool: &RequestPool,
        submission: SubmissionId,
        average: u64,
    ) -> Result<Reward, EnforcementError>;

    /// Record that `reward` was paid. Engines whose shares move with later
    /// submissions pin the amount here.
    fn finalize_reward(
        &mut self,
        _market: &MarketId,
        _request: RequestId,
        _submission: SubmissionId,
        _reward: &Reward,
    ) -> Result<(), EnforcementError> {
        Ok(())
    }

    /// Provider pool not owed to any reviewed submission.
    fn compute_remainder(
        &self,
        market: &MarketId,
        request: RequestId,
        pool: &RequestPool,
    ) -> Result<Amount, EnforcementError>;
}

/// Build a fresh engine of the given kind.
pub fn build_engine(kind: EnforcementKind) -> Box<dyn EnforcementCriteria> {
    match kind {
        EnforcementKind::ConstantThreshold => Box::new(ConstantThresholdEnforcement::new()),
        EnforcementKind::ScalableCurve => Box::new(ScalableCurveEnforcement::new()),
        EnforcementKind::DynamicBucket => Box::new(DynamicBucketEnforcement::new()),
    }
}
