use std::collections::HashMap;

use labor_market_types::{
    Amount, ConfigError, EnforcementConfig, EnforcementKind, MarketId, RequestId, SubmissionId,
    BPS_DENOMINATOR,
};
use tracing::debug;

use crate::curve::{mul_div, Curve, CurveRegistry};
use crate::engine::{EnforcementCriteria, RequestPool, ReviewUpdate, Reward};
use crate::error::EnforcementError;
use crate::tally::RequestTally;

/// Pass/fail enforcement.
///
/// The curve holds one point: `breakpoints[0]` is the threshold score,
/// `weights[0]` the fraction of the slot share paid at or above it, in
/// basis points.
#[derive(Debug, Default)]
pub struct ConstantThresholdEnforcement {
    curves: CurveRegistry,
    requests: HashMap<(MarketId, RequestId), RequestTally>,
}

impl ConstantThresholdEnforcement {
    pub fn new() -> Self {
        Self::default()
    }

    fn price(curve: &Curve, pool: &RequestPool, average: u64) -> Result<(Amount, bool), EnforcementError> {
        let threshold = curve.config().breakpoints[0];
        if average < threshold {
            return Ok((0, false));
        }
        let bps = curve.config().weights[0] as u128;
        Ok((mul_div(pool.slot_share(), bps, BPS_DENOMINATOR as u128)?, true))
    }
}

impl EnforcementCriteria for ConstantThresholdEnforcement {
    fn kind(&self) -> EnforcementKind {
        EnforcementKind::ConstantThreshold
    }

    fn configure(&mut self, market: MarketId, config: EnforcementConfig) -> Result<(), EnforcementError> {
        if config.breakpoints.len() != 1 {
            return Err(ConfigError::InvalidCurveShape(format!(
                "constant threshold takes exactly one breakpoint, got {}",
                config.breakpoints.len()
            ))
            .into());
        }
        if config.weights.first().is_some_and(|&bps| bps > BPS_DENOMINATOR) {
            return Err(ConfigError::InvalidCurveShape(format!(
                "paid fraction {} exceeds {} basis points",
                config.weights[0], BPS_DENOMINATOR
            ))
            .into());
        }
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
        self.curves.mark_used(market);

        debug!(
            request = %request,
            submission = %submission,
            average = update.average,
            qualified = update.qualified,
            "Constant threshold review applied"
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

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(provider_total: Amount, provider_limit: u64) -> RequestPool {
        RequestPool {
            provider_total,
            provider_limit,
            reviewer_total: 100,
            reviewer_limit: 1,
        }
    }

    fn engine(market: MarketId, threshold: u64, bps: u64) -> ConstantThresholdEnforcement {
        let mut engine = ConstantThresholdEnforcement::new();
        engine
            .configure(market, EnforcementConfig::threshold(100, threshold, bps))
            .unwrap();
        engine
    }

    #[test]
    fn full_score_pays_whole_slot() {
        let market = MarketId::new();
        let mut engine = engine(market, 50, BPS_DENOMINATOR);
        let pool = pool(100, 1);

        let update = engine
            .on_review(&market, RequestId(1), &pool, SubmissionId(1), 100)
            .unwrap();
        assert!(update.qualified);
        assert_eq!(update.earnings, 100);

        let reward = engine
            .compute_reward(&market, RequestId(1), &pool, SubmissionId(1), 100)
            .unwrap();
        assert_eq!(reward.provider, 100);
        assert_eq!(reward.reviewer_per_review, 100);
        assert_eq!(engine.compute_remainder(&market, RequestId(1), &pool).unwrap(), 0);
    }

    #[test]
    fn below_threshold_pays_nothing() {
        let market = MarketId::new();
        let mut engine = engine(market, 50, BPS_DENOMINATOR);
        let pool = pool(100, 2);

        let update = engine
            .on_review(&market, RequestId(1), &pool, SubmissionId(1), 49)
            .unwrap();
        assert!(!update.qualified);
        assert_eq!(update.earnings, 0);
        assert_eq!(engine.compute_remainder(&market, RequestId(1), &pool).unwrap(), 100);
    }

    #[test]
    fn threshold_is_inclusive_and_fraction_applies() {
        let market = MarketId::new();
        let mut engine = engine(market, 50, 2_500);
        let pool = pool(1_000, 2);

        let update = engine
            .on_review(&market, RequestId(1), &pool, SubmissionId(1), 50)
            .unwrap();
        assert!(update.qualified);
        // 25% of a 500 slot share.
        assert_eq!(update.earnings, 125);
        assert_eq!(engine.compute_remainder(&market, RequestId(1), &pool).unwrap(), 875);
    }

    #[test]
    fn untouched_request_returns_full_pool() {
        let market = MarketId::new();
        let engine = engine(market, 50, BPS_DENOMINATOR);
        assert_eq!(
            engine.compute_remainder(&market, RequestId(9), &pool(77, 3)).unwrap(),
            77
        );
    }

    #[test]
    fn shape_is_validated() {
        let mut engine = ConstantThresholdEnforcement::new();
        let market = MarketId::new();
        assert!(matches!(
            engine.configure(market, EnforcementConfig::new(4, vec![0, 1], vec![0, 1])),
            Err(EnforcementError::InvalidCurve(ConfigError::InvalidCurveShape(_)))
        ));
        assert!(matches!(
            engine.configure(market, EnforcementConfig::threshold(4, 2, 10_001)),
            Err(EnforcementError::InvalidCurve(ConfigError::InvalidCurveShape(_)))
        ));
    }

    #[test]
    fn reward_requires_a_review() {
        let market = MarketId::new();
        let engine = engine(market, 50, BPS_DENOMINATOR);
        assert_eq!(
            engine.compute_reward(&market, RequestId(1), &pool(100, 1), SubmissionId(1), 100),
            Err(EnforcementError::UnknownSubmission {
                request: RequestId(1),
                submission: SubmissionId(1)
            })
        );
    }

    #[test]
    fn reconfigure_after_review_rejected() {
        let market = MarketId::new();
        let mut engine = engine(market, 50, BPS_DENOMINATOR);
        engine
            .on_review(&market, RequestId(1), &pool(100, 1), SubmissionId(1), 10)
            .unwrap();
        assert_eq!(
            engine.configure(market, EnforcementConfig::threshold(100, 10, 100)),
            Err(EnforcementError::AlreadyInUse(market))
        );
    }
}
