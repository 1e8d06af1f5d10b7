use std::collections::HashMap;

use labor_market_types::{signed_change, Amount, SubmissionId};

use crate::engine::ReviewUpdate;
use crate::error::EnforcementError;

#[derive(Clone, Debug, Default)]
pub(crate) struct SubmissionTally {
    pub count: u64,
    pub sum: u64,
    pub reward: Amount,
    pub qualified: bool,
}

impl SubmissionTally {
    pub fn average(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.sum / self.count
        }
    }
}

/// Rewards allocated so far within one request, for engines whose
/// per-submission reward depends only on that submission's average.
#[derive(Clone, Debug, Default)]
pub(crate) struct RequestTally {
    pub allocated: Amount,
    pub qualifying_count: u64,
    pub submissions: HashMap<SubmissionId, SubmissionTally>,
}

impl RequestTally {
    /// Fold `score` into `submission` and re-price it with `price`, which maps
    /// an average onto `(reward, qualified)`. Nothing changes on error.
    pub fn apply<F>(
        &mut self,
        submission: SubmissionId,
        score: u64,
        provider_total: Amount,
        price: F,
    ) -> Result<ReviewUpdate, EnforcementError>
    where
        F: Fn(u64) -> Result<(Amount, bool), EnforcementError>,
    {
        let previous = self.submissions.get(&submission).cloned();
        let new_submission = previous.is_none();
        let previous = previous.unwrap_or_default();

        let sum = previous
            .sum
            .checked_add(score)
            .ok_or_else(|| EnforcementError::Overflow("review sum".into()))?;
        let next = SubmissionTally {
            count: previous.count + 1,
            sum,
            ..SubmissionTally::default()
        };
        let average = next.average();
        let (reward, qualified) = price(average)?;

        let allocated = (self.allocated - previous.reward)
            .checked_add(reward)
            .ok_or_else(|| EnforcementError::Overflow("allocated rewards".into()))?;
        let remainder_before = provider_total.saturating_sub(self.allocated);
        let remainder = provider_total.saturating_sub(allocated);

        match (previous.qualified, qualified) {
            (false, true) => self.qualifying_count += 1,
            (true, false) => self.qualifying_count -= 1,
            _ => {}
        }
        self.allocated = allocated;
        self.submissions.insert(
            submission,
            SubmissionTally {
                reward,
                qualified,
                ..next
            },
        );

        Ok(ReviewUpdate {
            submission,
            average,
            qualified,
            earnings: reward,
            remainder,
            intent_change: signed_change(remainder_before, remainder),
            new_submission,
        })
    }

    pub fn remainder(&self, provider_total: Amount) -> Amount {
        provider_total.saturating_sub(self.allocated)
    }
}
