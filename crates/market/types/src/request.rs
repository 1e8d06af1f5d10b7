use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::ids::{AccountId, Amount, RequestId, SubmissionId, Timestamp, TokenId};

/// Which of the two escrow legs of a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    /// Pays providers for their submissions.
    Provider,
    /// Pays reviewers for their scores.
    Reviewer,
}

impl std::fmt::Display for LegKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LegKind::Provider => write!(f, "provider"),
            LegKind::Reviewer => write!(f, "reviewer"),
        }
    }
}

/// One escrowed token pool of a request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowLeg {
    pub token: TokenId,
    pub total: Amount,
}

impl EscrowLeg {
    pub fn new(token: TokenId, total: Amount) -> Self {
        Self { token, total }
    }
}

/// Requester-supplied terms of a service request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestConfig {
    pub signal_expiry: Timestamp,
    pub submission_expiry: Timestamp,
    pub enforcement_expiry: Timestamp,
    /// Maximum number of provider slots.
    pub provider_limit: u64,
    /// Maximum number of reviews.
    pub reviewer_limit: u64,
    pub provider_leg: EscrowLeg,
    pub reviewer_leg: EscrowLeg,
}

impl RequestConfig {
    /// Check deadline ordering and economic consistency at time `now`.
    pub fn validate(&self, now: Timestamp) -> Result<(), ConfigError> {
        if self.signal_expiry >= self.submission_expiry
            || self.submission_expiry > self.enforcement_expiry
        {
            return Err(ConfigError::DeadlineOrder {
                signal: self.signal_expiry,
                submission: self.submission_expiry,
                enforcement: self.enforcement_expiry,
            });
        }

        if self.signal_expiry < now {
            return Err(ConfigError::DeadlineInPast {
                signal: self.signal_expiry,
                now,
            });
        }

        for (kind, limit, leg) in [
            (LegKind::Provider, self.provider_limit, &self.provider_leg),
            (LegKind::Reviewer, self.reviewer_limit, &self.reviewer_leg),
        ] {
            if limit == 0 {
                return Err(ConfigError::ZeroLimit {
                    leg: kind.to_string(),
                });
            }
            if leg.total == 0 {
                return Err(ConfigError::UnfundedLeg {
                    leg: kind.to_string(),
                    limit,
                });
            }
        }

        Ok(())
    }

    pub fn leg(&self, kind: LegKind) -> &EscrowLeg {
        match kind {
            LegKind::Provider => &self.provider_leg,
            LegKind::Reviewer => &self.reviewer_leg,
        }
    }

    /// Derive the phase of a request governed by these deadlines.
    pub fn phase_at(&self, now: Timestamp) -> RequestPhase {
        if now <= self.signal_expiry {
            RequestPhase::SignalWindow
        } else if now <= self.submission_expiry {
            RequestPhase::SubmissionWindow
        } else if now <= self.enforcement_expiry {
            RequestPhase::EnforcementWindow
        } else {
            RequestPhase::Settlement
        }
    }
}

/// Phase of a request, recomputed from the clock and stored deadlines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequestPhase {
    SignalWindow,
    SubmissionWindow,
    EnforcementWindow,
    /// Past enforcement expiry: claims and remainder refunds are open.
    Settlement,
    Withdrawn,
}

/// A request as recorded by the market.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: RequestId,
    pub requester: AccountId,
    pub config: RequestConfig,
    pub submission_count: u64,
    pub uri: String,
    pub withdrawn: bool,
}

impl ServiceRequest {
    pub fn phase_at(&self, now: Timestamp) -> RequestPhase {
        if self.withdrawn {
            RequestPhase::Withdrawn
        } else {
            self.config.phase_at(now)
        }
    }
}

/// Slot bookkeeping for one request.
///
/// `*_arrived <= *_reserved <= limit` holds after every call.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    pub providers_reserved: u64,
    pub reviewers_reserved: u64,
    pub providers_arrived: u64,
    pub reviewers_arrived: u64,
}

impl SignalState {
    pub fn providers_available(&self, limit: u64) -> u64 {
        limit.saturating_sub(self.providers_reserved)
    }

    pub fn reviewers_available(&self, limit: u64) -> u64 {
        limit.saturating_sub(self.reviewers_reserved)
    }

    /// Whether the slot invariant holds against the given limits.
    pub fn within(&self, provider_limit: u64, reviewer_limit: u64) -> bool {
        self.providers_arrived <= self.providers_reserved
            && self.providers_reserved <= provider_limit
            && self.reviewers_arrived <= self.reviewers_reserved
            && self.reviewers_reserved <= reviewer_limit
    }
}

/// Work delivered by a provider against a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceSubmission {
    pub id: SubmissionId,
    pub provider: AccountId,
    pub request_id: RequestId,
    pub created_at: Timestamp,
    pub uri: String,
}

/// Append-only score tally of one submission.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAccumulator {
    pub review_count: u64,
    pub review_sum: u64,
    /// Whether the current average clears the market floor.
    pub qualified: bool,
}

impl ReviewAccumulator {
    pub fn record(&mut self, score: u64) {
        self.review_count += 1;
        self.review_sum += score;
    }

    /// Integer average, zero while unreviewed.
    pub fn average(&self) -> u64 {
        if self.review_count == 0 {
            0
        } else {
            self.review_sum / self.review_count
        }
    }
}
