use std::collections::HashMap;

use labor_market_types::{
    Amount, EnforcementConfig, EnforcementKind, MarketId, RequestId, SubmissionId,
};
use tracing::debug;

use crate::curve::{Curve, CurveRegistry};
use crate::engine::{EnforcementCriteria, RequestPool, ReviewUpdate, Reward};
use crate::error::EnforcementError;
use crate::tally::RequestTally;

/// Likert-style enforcement: the slot share scaled by a piecewise-linear
/// weight curve, `reward = share * weight(average) / max_weight`.
#[derive(Debug, Default)]
pub struct ScalableCurveEnforcement {
    curves: CurveRegistry,
    requests: HashMap<(MarketId, RequestId), RequestTally>,
}

impl ScalableCurveEnforcement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of `configure` under the name market owners know it by.
    pub fn set_buckets(
        &mut self,
        market: MarketId,
        max_score: u64,
        ranges: Vec<u64>,
        weights: Vec<u64>,
    ) -> Result<(), EnforcementError> {
        self.configure(market, EnforcementConfig::new(max_score, ranges, weights))
    }

    /// Submissions of a request whose reward is currently non-zero.
    pub fn qualifying_count(&self, market: &MarketId, request: RequestId) -> u64 {
        self.requests
            .get(&(*market, request))
            .map_or(0, |t| t.qualifying_count)
    }

    fn price(curve: &Curve, pool: &RequestPool, average: u64) -> Result<(Amount, bool), EnforcementError> {
        let (numerator, _) = curve.interpolated_weight(average);
        let reward = curve.interpolated_reward(pool.slot_share(), average)?;
        Ok((reward, numerator > 0))
    }
}

impl EnforcementCriteria for ScalableCurveEnforcement {
    fn kind(&self) -> EnforcementKind {
        EnforcementKind::ScalableCurve
    }

    fn configure(&mut self, market: MarketId, config: EnforcementConfig) -> Result<(), EnforcementError> {
        self.curves.configure(market, Curve::new(config)?)
    }

    fn configuration(&self, market: &MarketId) -> Result<&EnforcementConfig, EnforcementError> {
        Ok(self.curves.get(market)?.config())
    }

    fn on_review(
        &mut self,
        market: &MarketId,
        request: RequestId,
        pool: &RequestPool,
        submission: SubmissionId,
        score: u64,
    ) -> Result<ReviewUpdate, EnforcementError> {
        let curve = self.curves.get(market)?;
        curve.check_score(score)?;

        let tally = self.requests.entry((*market, request)).or_default();
        let update = tally.apply(submission, score, pool.provider_total, |avg| {
            Self::price(curve, pool, avg)
        })?;
        let qualifying = tally.qualifying_count;
        self.curves.mark_used(market);

        debug!(
            request = %request,
            submission = %submission,
            average = update.average,
            earnings = update.earnings,
            qualifying,
            "Scalable curve review applied"
        );
        Ok(update)
    }

    fn compute_reward(
        &self,
        market: &MarketId,
        request: RequestId,
        pool: &RequestPool,
        submission: SubmissionId,
        average: u64,
    ) -> Result<Reward, EnforcementError> {
        let curve = self.curves.get(market)?;
        let reviewed = self
            .requests
            .get(&(*market, request))
            .is_some_and(|t| t.submissions.contains_key(&submission));
        if !reviewed {
            return Err(EnforcementError::UnknownSubmission { request, submission });
        }
        let (provider, _) = Self::price(curve, pool, average)?;
        Ok(Reward {
            provider,
            reviewer_per_review: pool.per_review(),
        })
    }

    fn compute_remainder(
        &self,
        market: &MarketId,
        request: RequestId,
        pool: &RequestPool,
    ) -> Result<Amount, EnforcementError> {
        self.curves.get(market)?;
        Ok(self
            .requests
            .get(&(*market, request))
            .map_or(pool.provider_total, |t| t.remainder(pool.provider_total)))
    }
}
