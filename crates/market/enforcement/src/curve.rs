use std::collections::HashMap;

use labor_market_types::{Amount, ConfigError, EnforcementConfig, MarketId};
use tracing::info;

use crate::error::EnforcementError;

/// `value * numerator / denominator`, floored, without overflowing on the
/// intermediate product when the quotient fits.
pub(crate) fn mul_div(
    value: Amount,
    numerator: u128,
    denominator: u128,
) -> Result<Amount, EnforcementError> {
    if denominator == 0 {
        return Err(EnforcementError::Overflow("division by zero weight".into()));
    }
    let overflow = || EnforcementError::Overflow(format!("{} * {} / {}", value, numerator, denominator));
    let whole = (value / denominator).checked_mul(numerator).ok_or_else(overflow)?;
    let part = (value % denominator).checked_mul(numerator).ok_or_else(overflow)? / denominator;
    whole.checked_add(part).ok_or_else(overflow)
}

/// A validated score-to-weight curve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Curve {
    config: EnforcementConfig,
}

impl Curve {
    pub fn new(config: EnforcementConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EnforcementConfig {
        &self.config
    }

    pub fn max_score(&self) -> u64 {
        self.config.max_score
    }

    pub fn check_score(&self, score: u64) -> Result<(), EnforcementError> {
        if score > self.config.max_score {
            return Err(EnforcementError::ScoreOutOfRange {
                score,
                max_score: self.config.max_score,
            });
        }
        Ok(())
    }

    /// Weight of the highest breakpoint at or below `average`; zero below
    /// the first breakpoint.
    pub fn stepped_weight(&self, average: u64) -> u64 {
        let idx = self.config.breakpoints.partition_point(|&b| b <= average);
        if idx == 0 {
            0
        } else {
            self.config.weights[idx - 1]
        }
    }

    /// Linearly interpolated weight at `average` as `(numerator, denominator)`,
    /// clamped to the first and last weights outside the breakpoint range.
    pub fn interpolated_weight(&self, average: u64) -> (u128, u128) {
        let b = &self.config.breakpoints;
        let w = &self.config.weights;
        let last = b.len() - 1;

        if average <= b[0] {
            return (w[0] as u128, 1);
        }
        if average >= b[last] {
            return (w[last] as u128, 1);
        }

        let i = b.partition_point(|&x| x <= average) - 1;
        let span = (b[i + 1] - b[i]) as u128;
        let rise = (w[i + 1] - w[i]) as u128;
        let offset = (average - b[i]) as u128;
        (w[i] as u128 * span + rise * offset, span)
    }

    /// `share * weight(average) / max_weight` using the interpolated weight.
    pub fn interpolated_reward(&self, share: Amount, average: u64) -> Result<Amount, EnforcementError> {
        let (numerator, denominator) = self.interpolated_weight(average);
        let denominator = denominator
            .checked_mul(self.config.max_weight() as u128)
            .ok_or_else(|| EnforcementError::Overflow("curve denominator".into()))?;
        mul_div(share, numerator, denominator)
    }
}

#[derive(Debug)]
struct RegisteredCurve {
    curve: Curve,
    in_use: bool,
}

/// Per-market curves. A curve may be replaced until its first review.
#[derive(Debug, Default)]
pub struct CurveRegistry {
    curves: HashMap<MarketId, RegisteredCurve>,
}

impl CurveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn configure(&mut self, market: MarketId, curve: Curve) -> Result<(), EnforcementError> {
        if self.curves.get(&market).is_some_and(|c| c.in_use) {
            return Err(EnforcementError::AlreadyInUse(market));
        }
        info!(
            market = %market,
            max_score = curve.max_score(),
            points = curve.config().breakpoints.len(),
            "Enforcement curve configured"
        );
        self.curves.insert(
            market,
            RegisteredCurve {
                curve,
                in_use: false,
            },
        );
        Ok(())
    }

    pub fn get(&self, market: &MarketId) -> Result<&Curve, EnforcementError> {
        self.curves
            .get(market)
            .map(|c| &c.curve)
            .ok_or(EnforcementError::NotConfigured(*market))
    }

    pub fn mark_used(&mut self, market: &MarketId) {
        if let Some(entry) = self.curves.get_mut(market) {
            entry.in_use = true;
        }
    }
}
