use std::collections::{HashMap, HashSet};

use labor_market_types::{AccountId, Amount, LegKind, RequestId, SubmissionId};
use serde::{Deserialize, Serialize};

/// Guard state of one `(request, participant, role)` performance record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceStatus {
    #[default]
    Unmarked,
    /// Slots reserved and not yet used up.
    Reserved,
    /// Reservation fully consumed.
    Settled,
}

/// One recorded review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewer: AccountId,
    pub score: u64,
    pub uri: String,
}

/// What a successful claim paid out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub request: RequestId,
    pub submission: SubmissionId,
    pub provider: AccountId,
    pub provider_paid: Amount,
    pub reviewer_payouts: Vec<(AccountId, Amount)>,
}

impl ClaimReceipt {
    pub fn reviewer_total(&self) -> Amount {
        self.reviewer_payouts.iter().map(|(_, amount)| amount).sum()
    }
}

/// Reservation, review and claim guards of a market.
#[derive(Debug, Default)]
pub(crate) struct PerformanceRecords {
    marks: HashMap<(RequestId, AccountId, LegKind), PerformanceStatus>,
    review_quota: HashMap<(RequestId, AccountId), u64>,
    scored: HashSet<(SubmissionId, AccountId)>,
    claimed: HashSet<SubmissionId>,
    stakes: HashMap<(RequestId, AccountId, LegKind), Amount>,
    retrieved: HashSet<(RequestId, AccountId, LegKind)>,
}

impl PerformanceRecords {
    pub fn status(&self, request: RequestId, account: &AccountId, role: LegKind) -> PerformanceStatus {
        self.marks
            .get(&(request, account.clone(), role))
            .copied()
            .unwrap_or_default()
    }

    pub fn reserve_provider(&mut self, request: RequestId, account: &AccountId) {
        self.marks
            .insert((request, account.clone(), LegKind::Provider), PerformanceStatus::Reserved);
    }

    pub fn consume_provider(&mut self, request: RequestId, account: &AccountId) {
        self.marks
            .insert((request, account.clone(), LegKind::Provider), PerformanceStatus::Settled);
    }

    pub fn reserve_reviews(&mut self, request: RequestId, account: &AccountId, quantity: u64) {
        self.marks
            .insert((request, account.clone(), LegKind::Reviewer), PerformanceStatus::Reserved);
        self.review_quota.insert((request, account.clone()), quantity);
    }

    pub fn review_quota(&self, request: RequestId, account: &AccountId) -> u64 {
        self.review_quota
            .get(&(request, account.clone()))
            .copied()
            .unwrap_or(0)
    }

    pub fn has_scored(&self, submission: SubmissionId, account: &AccountId) -> bool {
        self.scored.contains(&(submission, account.clone()))
    }

    /// Use one review slot; the record settles with the last one.
    pub fn consume_review(&mut self, request: RequestId, submission: SubmissionId, account: &AccountId) {
        let remaining = self.review_quota(request, account).saturating_sub(1);
        self.review_quota.insert((request, account.clone()), remaining);
        if remaining == 0 {
            self.marks
                .insert((request, account.clone(), LegKind::Reviewer), PerformanceStatus::Settled);
        }
        self.scored.insert((submission, account.clone()));
    }

    pub fn is_claimed(&self, submission: SubmissionId) -> bool {
        self.claimed.contains(&submission)
    }

    pub fn mark_claimed(&mut self, submission: SubmissionId) {
        self.claimed.insert(submission);
    }

    pub fn record_stake(&mut self, request: RequestId, account: &AccountId, role: LegKind, amount: Amount) {
        self.stakes.insert((request, account.clone(), role), amount);
    }

    pub fn stake(&self, request: RequestId, account: &AccountId, role: LegKind) -> Option<Amount> {
        self.stakes.get(&(request, account.clone(), role)).copied()
    }

    pub fn is_retrieved(&self, request: RequestId, account: &AccountId, role: LegKind) -> bool {
        self.retrieved.contains(&(request, account.clone(), role))
    }

    pub fn mark_retrieved(&mut self, request: RequestId, account: &AccountId, role: LegKind) {
        self.retrieved.insert((request, account.clone(), role));
    }
}
