use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ids::{AccountId, Amount};

/// Basis-point denominator used by the constant-threshold curve.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Which enforcement engine scores a market's submissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnforcementKind {
    ConstantThreshold,
    ScalableCurve,
    DynamicBucket,
}

impl std::fmt::Display for EnforcementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnforcementKind::ConstantThreshold => write!(f, "constant-threshold"),
            EnforcementKind::ScalableCurve => write!(f, "scalable-curve"),
            EnforcementKind::DynamicBucket => write!(f, "dynamic-bucket"),
        }
    }
}

/// Score-to-weight curve of a market.
///
/// `breakpoints[i]` maps to `weights[i]`. Both series are non-decreasing.
/// For the constant-threshold engine the curve has exactly one point: the
/// threshold score and the paid fraction in basis points.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnforcementConfig {
    pub max_score: u64,
    pub breakpoints: Vec<u64>,
    pub weights: Vec<u64>,
}

impl EnforcementConfig {
    pub fn new(max_score: u64, breakpoints: Vec<u64>, weights: Vec<u64>) -> Self {
        Self {
            max_score,
            breakpoints,
            weights,
        }
    }

    /// Pass/fail: a single threshold paying `share_bps` of the slot share.
    pub fn threshold(max_score: u64, threshold: u64, share_bps: u64) -> Self {
        Self::new(max_score, vec![threshold], vec![share_bps])
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_score == 0 {
            return Err(ConfigError::ZeroMaxScore);
        }
        if self.breakpoints.is_empty() {
            return Err(ConfigError::EmptyCurve);
        }
        if self.breakpoints.len() != self.weights.len() {
            return Err(ConfigError::CurveLengthMismatch {
                breakpoints: self.breakpoints.len(),
                weights: self.weights.len(),
            });
        }
        if let Some(index) = first_decrease(&self.breakpoints) {
            return Err(ConfigError::NonMonotonicCurve {
                series: "breakpoints".into(),
                index,
            });
        }
        if let Some(index) = first_decrease(&self.weights) {
            return Err(ConfigError::NonMonotonicCurve {
                series: "weights".into(),
                index,
            });
        }
        if self.max_weight() == 0 {
            return Err(ConfigError::ZeroCurve);
        }
        let top = self.breakpoints[self.breakpoints.len() - 1];
        if top > self.max_score {
            return Err(ConfigError::BreakpointAboveMax {
                breakpoint: top,
                max_score: self.max_score,
            });
        }
        Ok(())
    }

    /// Highest weight on the curve (the last one, weights being sorted).
    pub fn max_weight(&self) -> u64 {
        self.weights.last().copied().unwrap_or(0)
    }
}

fn first_decrease(series: &[u64]) -> Option<usize> {
    series
        .windows(2)
        .position(|pair| pair[1] < pair[0])
        .map(|i| i + 1)
}

/// Reputation gating and rewards of a market.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationParams {
    /// Minimum available reputation needed to signal.
    pub signal_min: Amount,
    /// Maximum available reputation allowed to signal, if bounded.
    #[serde(default)]
    pub signal_max: Option<Amount>,
    /// Minted to the provider of a qualified submission on claim.
    pub provider_reward: Amount,
    /// Minted to each reviewer of a qualified submission on claim.
    pub reviewer_reward: Amount,
    /// Revoked from a provider on `signal`; retrievable once it has delivered.
    #[serde(default)]
    pub provide_stake: Amount,
    /// Revoked per reserved review slot on `signal_review`; retrievable once
    /// every slot is used.
    #[serde(default)]
    pub review_stake: Amount,
}

impl ReputationParams {
    pub fn admits(&self, available: Amount) -> bool {
        available >= self.signal_min && self.signal_max.map_or(true, |max| available <= max)
    }
}

/// Market-wide configuration, applied once through `initialize`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub owner: AccountId,
    pub uri: String,
    pub enforcement: EnforcementKind,
    pub curve: EnforcementConfig,
    /// Consult the authorization oracle before every mutating call.
    #[serde(default)]
    pub gated: bool,
    #[serde(default)]
    pub reputation: Option<ReputationParams>,
}

impl MarketConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.curve.validate()?;
        if let Some(params) = &self.reputation {
            if let Some(max) = params.signal_max {
                if max < params.signal_min {
                    return Err(ConfigError::InvalidMarket(format!(
                        "reputation signal_max {} below signal_min {}",
                        max, params.signal_min
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn likert_curve_validates() {
        let curve = EnforcementConfig::new(4, vec![0, 1, 2, 3, 4], vec![0, 0, 100, 200, 300]);
        assert!(curve.validate().is_ok());
        assert_eq!(curve.max_weight(), 300);
    }

    #[test]
    fn decreasing_weights_rejected() {
        let curve = EnforcementConfig::new(4, vec![0, 2, 4], vec![0, 200, 100]);
        assert_eq!(
            curve.validate(),
            Err(ConfigError::NonMonotonicCurve {
                series: "weights".into(),
                index: 2
            })
        );
    }

    #[test]
    fn decreasing_breakpoints_rejected() {
        let curve = EnforcementConfig::new(4, vec![2, 1], vec![0, 1]);
        assert!(matches!(
            curve.validate(),
            Err(ConfigError::NonMonotonicCurve { .. })
        ));
    }

    #[test]
    fn malformed_curves_rejected() {
        assert_eq!(
            EnforcementConfig::new(4, vec![], vec![]).validate(),
            Err(ConfigError::EmptyCurve)
        );
        assert_eq!(
            EnforcementConfig::new(4, vec![0, 1], vec![1]).validate(),
            Err(ConfigError::CurveLengthMismatch {
                breakpoints: 2,
                weights: 1
            })
        );
        assert_eq!(
            EnforcementConfig::new(4, vec![0, 1], vec![0, 0]).validate(),
            Err(ConfigError::ZeroCurve)
        );
        assert_eq!(
            EnforcementConfig::new(0, vec![0], vec![1]).validate(),
            Err(ConfigError::ZeroMaxScore)
        );
        assert_eq!(
            EnforcementConfig::new(4, vec![0, 5], vec![0, 1]).validate(),
            Err(ConfigError::BreakpointAboveMax {
                breakpoint: 5,
                max_score: 4
            })
        );
    }

    #[test]
    fn market_config_from_json() {
        let json = r#"{
            "owner": "dao",
            "uri": "ipfs://market",
            "enforcement": "scalable_curve",
            "curve": { "max_score": 1, "breakpoints": [0, 1], "weights": [0, 1] }
        }"#;
        let config = MarketConfig::from_json(json).unwrap();
        assert_eq!(config.enforcement, EnforcementKind::ScalableCurve);
        assert!(!config.gated);
        assert!(config.reputation.is_none());
    }

    #[test]
    fn stakes_default_to_zero() {
        let json = r#"{
            "owner": "dao",
            "uri": "ipfs://market",
            "enforcement": "constant_threshold",
            "curve": { "max_score": 100, "breakpoints": [50], "weights": [10000] },
            "reputation": { "signal_min": 1, "provider_reward": 3, "reviewer_reward": 1, "review_stake": 2 }
        }"#;
        let params = MarketConfig::from_json(json).unwrap().reputation.unwrap();
        assert_eq!(params.provide_stake, 0);
        assert_eq!(params.review_stake, 2);
        assert_eq!(params.signal_max, None);
    }

    #[test]
    fn market_config_rejects_unknown_engine() {
        let json = r#"{
            "owner": "dao",
            "uri": "",
            "enforcement": "quadratic",
            "curve": { "max_score": 1, "breakpoints": [0], "weights": [1] }
        }"#;
        assert!(matches!(
            MarketConfig::from_json(json),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn reputation_window() {
        let params = ReputationParams {
            signal_min: 10,
            signal_max: Some(100),
            provider_reward: 5,
            reviewer_reward: 1,
            provide_stake: 0,
            review_stake: 0,
        };
        assert!(!params.admits(9));
        assert!(params.admits(10));
        assert!(params.admits(100));
        assert!(!params.admits(101));
    }
}
