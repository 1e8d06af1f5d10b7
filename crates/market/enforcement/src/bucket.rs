use std::collections::HashMap;

use labor_market_types::{
    signed_change, Amount, EnforcementConfig, EnforcementKind, MarketId, RequestId, SubmissionId,
};
use tracing::{debug, info};

use crate::curve::{mul_div, Curve, CurveRegistry};
use crate::engine::{EnforcementCriteria, RequestPool, ReviewUpdate, Reward};
use crate::error::EnforcementError;

#[derive(Clone, Debug, Default)]
struct BucketEntry {
    count: u64,
    sum: u64,
    weight: u64,
    claimed: Option<Amount>,
}

impl BucketEntry {
    fn average(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.sum / self.count
        }
    }
}

/// Weights of every reviewed submission in one request.
#[derive(Clone, Debug, Default)]
struct BucketBook {
    total_weight: u128,
    entries: HashMap<SubmissionId, BucketEntry>,
    claimed_total: Amount,
}

impl BucketBook {
    fn share(&self, pool: Amount, entry: &BucketEntry) -> Result<Amount, EnforcementError> {
        if let Some(paid) = entry.claimed {
            return Ok(paid);
        }
        if entry.weight == 0 || self.total_weight == 0 {
            return Ok(0);
        }
        let share = mul_div(pool, entry.weight as u128, self.total_weight)?;
        Ok(share.min(pool.saturating_sub(self.claimed_total)))
    }

    fn allocated(&self, pool: Amount) -> Result<Amount, EnforcementError> {
        self.entries.values().try_fold(0, |acc: Amount, entry| {
            let share = self.share(pool, entry)?;
            acc.checked_add(share)
                .ok_or_else(|| EnforcementError::Overflow("allocated rewards".into()))
        })
    }
}

/// Bucketed enforcement: every qualifying submission draws on the whole
/// provider pool, `reward_i = pool * w_i / Σw`, so each new qualifier
/// dilutes the others until they claim.
#[derive(Debug, Default)]
pub struct DynamicBucketEnforcement {
    curves: CurveRegistry,
    books: HashMap<(MarketId, RequestId), BucketBook>,
}

impl DynamicBucketEnforcement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Alias of `configure` taking the curve as parallel range and weight lists.
    pub fn set_configuration(
        &mut self,
        market: MarketId,
        max_score: u64,
        ranges: Vec<u64>,
        weights: Vec<u64>,
    ) -> Result<(), EnforcementError> {
        self.configure(market, EnforcementConfig::new(max_score, ranges, weights))
    }

    /// Sum of bucket weights across the reviewed submissions of a request.
    pub fn total_weight(&self, market: &MarketId, request: RequestId) -> u128 {
        self.books
            .get(&(*market, request))
            .map_or(0, |b| b.total_weight)
    }

    /// Submissions of a request currently sitting in a non-zero bucket.
    pub fn qualifying_count(&self, market: &MarketId, request: RequestId) -> u64 {
        self.books.get(&(*market, request)).map_or(0, |b| {
            b.entries.values().filter(|e| e.weight > 0).count() as u64
        })
    }
}

impl EnforcementCriteria for DynamicBucketEnforcement {
    fn kind(&self) -> EnforcementKind {
        EnforcementKind::DynamicBucket
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

        let key = (*market, request);
        let mut book = self.books.get(&key).cloned().unwrap_or_default();
        let total = pool.provider_total;
        let remainder_before = total.saturating_sub(book.allocated(total)?);

        let previous = book.entries.get(&submission).cloned();
        if previous.as_ref().is_some_and(|e| e.claimed.is_some()) {
            return Err(EnforcementError::AlreadyFinalized { request, submission });
        }
        let new_submission = previous.is_none();
        let previous = previous.unwrap_or_default();

        let sum = previous
            .sum
            .checked_add(score)
            .ok_or_else(|| EnforcementError::Overflow("review sum".into()))?;
        let mut entry = BucketEntry {
            count: previous.count + 1,
            sum,
            weight: 0,
            claimed: None,
        };
        entry.weight = curve.stepped_weight(entry.average());

        book.total_weight = book.total_weight - previous.weight as u128 + entry.weight as u128;
        let average = entry.average();
        let qualified = entry.weight > 0;
        let earnings = book.share(total, &entry)?;
        book.entries.insert(submission, entry);
        let remainder = total.saturating_sub(book.allocated(total)?);

        self.books.insert(key, book);
        self.curves.mark_used(market);

        debug!(
            request = %request,
            submission = %submission,
            average,
            earnings,
            remainder,
            "Bucket review applied"
        );
        Ok(ReviewUpdate {
            submission,
            average,
            qualified,
            earnings,
            remainder,
            intent_change: signed_change(remainder_before, remainder),
            new_submission,
        })
    }

    fn compute_reward(
        &self,
        market: &MarketId,
        request: RequestId,
        pool: &RequestPool,
        submission: SubmissionId,
        _average: u64,
    ) -> Result<Reward, EnforcementError> {
        self.curves.get(market)?;
        let book = self
            .books
            .get(&(*market, request))
            .ok_or(EnforcementError::UnknownSubmission { request, submission })?;
        let entry = book
            .entries
            .get(&submission)
            .ok_or(EnforcementError::UnknownSubmission { request, submission })?;
        Ok(Reward {
            provider: book.share(pool.provider_total, entry)?,
            reviewer_per_review: pool.per_review(),
        })
    }

    fn finalize_reward(
        &mut self,
        market: &MarketId,
        request: RequestId,
        submission: SubmissionId,
        reward: &Reward,
    ) -> Result<(), EnforcementError> {
        let book = self
            .books
            .get_mut(&(*market, request))
            .ok_or(EnforcementError::UnknownSubmission { request, submission })?;
        let entry = book
            .entries
            .get_mut(&submission)
            .ok_or(EnforcementError::UnknownSubmission { request, submission })?;
        if entry.claimed.is_some() {
            return Err(EnforcementError::AlreadyFinalized { request, submission });
        }
        entry.claimed = Some(reward.provider);
        book.claimed_total = book
            .claimed_total
            .checked_add(reward.provider)
            .ok_or_else(|| EnforcementError::Overflow("claimed rewards".into()))?;
        info!(
            request = %request,
            submission = %submission,
            amount = reward.provider,
            "Bucket share pinned"
        );
        Ok(())
    }

    fn compute_remainder(
        &self,
        market: &MarketId,
        request: RequestId,
        pool: &RequestPool,
    ) -> Result<Amount, EnforcementError> {
        self.curves.get(market)?;
        let total = pool.provider_total;
        match self.books.get(&(*market, request)) {
            Some(book) => Ok(total.saturating_sub(book.allocated(total)?)),
            None => Ok(total),
        }
    }
}
