use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use labor_market_enforcement::{EnforcementCriteria, RequestPool, Reward};
use labor_market_ledger::{PaymentLedger, ReleaseKind, RequestPaymentState, TokenLedger};
use labor_market_reputation::SharedReputation;
use labor_market_types::{
    AccountId, Amount, EnforcementConfig, LegKind, MarketConfig, MarketId, RequestConfig,
    RequestId, RequestPhase, ReviewAccumulator, ServiceRequest, ServiceSubmission, SignalState,
    SubmissionId, Timestamp,
};
use tracing::{debug, info, warn};

use crate::auth::{AuthorizationOracle, MarketAction};
use crate::clock::Clock;
use crate::error::MarketError;
use crate::events::MarketEvent;
use crate::records::{ClaimReceipt, PerformanceRecords, PerformanceStatus, ReviewRecord};

/// One labor market: requests, their escrow, reservations, submissions,
/// reviews and settlement.
///
/// Every call reads the clock once, validates everything, then performs
/// the fallible collaborator calls, and commits its own bookkeeping last.
/// A call that returns `Err` leaves the market and every ledger unchanged.
pub struct LaborMarket<L: TokenLedger> {
    market_id: MarketId,
    config: Option<MarketConfig>,
    clock: Arc<dyn Clock>,
    enforcement: Box<dyn EnforcementCriteria>,
    payments: PaymentLedger<L>,
    authorization: Option<Arc<dyn AuthorizationOracle>>,
    reputation: Option<SharedReputation>,

    requests: BTreeMap<RequestId, ServiceRequest>,
    signals: HashMap<RequestId, SignalState>,
    submissions: BTreeMap<SubmissionId, ServiceSubmission>,
    accumulators: HashMap<SubmissionId, ReviewAccumulator>,
    reviews: HashMap<SubmissionId, Vec<ReviewRecord>>,
    records: PerformanceRecords,
    next_request: u64,
    next_submission: u64,
    events: Vec<MarketEvent>,
}

impl<L: TokenLedger> LaborMarket<L> {
    /// A fresh, uninitialized market settling against `tokens`. Escrow is
    /// held by an account derived from the market id.
    pub fn new(tokens: L, enforcement: Box<dyn EnforcementCriteria>, clock: Arc<dyn Clock>) -> Self {
        let market_id = MarketId::new();
        let escrow_account = AccountId::new(format!("escrow:{}", market_id));
        Self {
            market_id,
            config: None,
            clock,
            enforcement,
            payments: PaymentLedger::new(tokens, escrow_account),
            authorization: None,
            reputation: None,
            requests: BTreeMap::new(),
            signals: HashMap::new(),
            submissions: BTreeMap::new(),
            accumulators: HashMap::new(),
            reviews: HashMap::new(),
            records: PerformanceRecords::default(),
            next_request: 0,
            next_submission: 0,
            events: Vec::new(),
        }
    }

    pub fn with_authorization(mut self, oracle: Arc<dyn AuthorizationOracle>) -> Self {
        self.authorization = Some(oracle);
        self
    }

    pub fn with_reputation(mut self, reputation: SharedReputation) -> Self {
        self.reputation = Some(reputation);
        self
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Bind the market configuration. Callable exactly once.
    pub fn initialize(&mut self, config: MarketConfig) -> Result<(), MarketError> {
        if self.config.is_some() {
            return Err(MarketError::AlreadyInitialized);
        }
        config.validate()?;
        if config.enforcement != self.enforcement.kind() {
            return Err(MarketError::InvalidConfiguration(format!(
                "market configured for {} but engine is {}",
                config.enforcement,
                self.enforcement.kind()
            )));
        }
        if config.reputation.is_some() {
            let reputation = self.reputation.as_ref().ok_or_else(|| {
                MarketError::InvalidConfiguration("reputation parameters need a reputation engine".into())
            })?;
            reputation.read()?.market_token(&self.market_id)?;
        }

        self.enforcement.configure(self.market_id, config.curve.clone())?;

        info!(
            market = %self.market_id,
            owner = %config.owner,
            enforcement = %config.enforcement,
            gated = config.gated,
            "Labor market initialized"
        );
        self.events.push(MarketEvent::MarketInitialized {
            market: self.market_id,
            owner: config.owner.clone(),
            enforcement: config.enforcement,
            uri: config.uri.clone(),
        });
        self.config = Some(config);
        Ok(())
    }

    /// Replace the enforcement curve. Owner only, and only until the curve
    /// has scored its first review.
    pub fn configure_enforcement(
        &mut self,
        caller: &AccountId,
        curve: EnforcementConfig,
    ) -> Result<(), MarketError> {
        let config = self.market_config()?;
        if &config.owner != caller {
            return Err(MarketError::NotAuthorized {
                account: caller.clone(),
                action: MarketAction::ConfigureEnforcement,
            });
        }
        self.authorize(caller, MarketAction::ConfigureEnforcement)?;

        self.enforcement.configure(self.market_id, curve.clone())?;

        self.events.push(MarketEvent::EnforcementConfigured {
            market: self.market_id,
            max_score: curve.max_score,
            breakpoints: curve.breakpoints.clone(),
            weights: curve.weights.clone(),
        });
        if let Some(config) = self.config.as_mut() {
            config.curve = curve;
        }
        Ok(())
    }

    // ── Request setup ────────────────────────────────────────────────

    /// Create a request, pulling both escrow legs from `caller`.
    pub fn submit_request(
        &mut self,
        caller: &AccountId,
        config: RequestConfig,
        uri: impl Into<String>,
    ) -> Result<RequestId, MarketError> {
        self.market_config()?;
        self.authorize(caller, MarketAction::SubmitRequest)?;
        let now = self.clock.now();
        config.validate(now)?;

        let id = RequestId(self.next_request + 1);
        self.payments
            .escrow(id, caller, &config.provider_leg, &config.reviewer_leg)?;

        let uri = uri.into();
        info!(
            request = %id,
            requester = %caller,
            provider_total = config.provider_leg.total,
            reviewer_total = config.reviewer_leg.total,
            provider_limit = config.provider_limit,
            reviewer_limit = config.reviewer_limit,
            "Request configured"
        );
        self.events.push(MarketEvent::RequestConfigured {
            request: id,
            requester: caller.clone(),
            provider_total: config.provider_leg.total,
            reviewer_total: config.reviewer_leg.total,
            provider_limit: config.provider_limit,
            reviewer_limit: config.reviewer_limit,
            signal_expiry: config.signal_expiry,
            submission_expiry: config.submission_expiry,
            enforcement_expiry: config.enforcement_expiry,
            uri: uri.clone(),
        });

        self.next_request = id.0;
        self.signals.insert(id, SignalState::default());
        self.requests.insert(
            id,
            ServiceRequest {
                id,
                requester: caller.clone(),
                config,
                submission_count: 0,
                uri,
                withdrawn: false,
            },
        );
        Ok(id)
    }

    /// Replace the terms of a request nobody has signaled to provide for.
    /// The old escrow is refunded and the new escrow pulled.
    pub fn edit_request(
        &mut self,
        caller: &AccountId,
        id: RequestId,
        config: RequestConfig,
        uri: impl Into<String>,
    ) -> Result<(), MarketError> {
        self.market_config()?;
        self.authorize(caller, MarketAction::EditRequest)?;
        let now = self.clock.now();
        self.ensure_uncommitted(caller, id, MarketAction::EditRequest)?;
        config.validate(now)?;

        let reserved = self.signal_state(id)?.reviewers_reserved;
        if config.reviewer_limit < reserved {
            return Err(MarketError::CapacityExhausted {
                request: id,
                role: LegKind::Reviewer,
                requested: reserved,
                available: config.reviewer_limit,
            });
        }

        self.payments
            .replace_escrow(id, caller, &config.provider_leg, &config.reviewer_leg)?;

        let uri = uri.into();
        info!(request = %id, requester = %caller, "Request edited");
        self.events.push(MarketEvent::RequestEdited {
            request: id,
            provider_total: config.provider_leg.total,
            reviewer_total: config.reviewer_leg.total,
            provider_limit: config.provider_limit,
            reviewer_limit: config.reviewer_limit,
            uri: uri.clone(),
        });
        if let Some(request) = self.requests.get_mut(&id) {
            request.config = config;
            request.uri = uri;
        }
        Ok(())
    }

    /// Cancel a request nobody has signaled to provide for, refunding both
    /// legs in full.
    pub fn withdraw_request(
        &mut self,
        caller: &AccountId,
        id: RequestId,
    ) -> Result<(Amount, Amount), MarketError> {
        self.market_config()?;
        self.authorize(caller, MarketAction::WithdrawRequest)?;
        self.ensure_uncommitted(caller, id, MarketAction::WithdrawRequest)?;

        let (provider_refund, reviewer_refund) = self.payments.refund_outstanding(id, caller)?;
        self.payments.mark_remainder_claimed(id)?;

        info!(request = %id, provider_refund, reviewer_refund, "Request withdrawn");
        self.events.push(MarketEvent::RequestWithdrawn {
            request: id,
            provider_refund,
            reviewer_refund,
        });
        if let Some(request) = self.requests.get_mut(&id) {
            request.withdrawn = true;
        }
        Ok((provider_refund, reviewer_refund))
    }

    // ── Reservations ─────────────────────────────────────────────────

    /// Reserve one provider slot.
    pub fn signal(&mut self, caller: &AccountId, id: RequestId) -> Result<(), MarketError> {
        let stake = self.market_config()?.reputation.as_ref().map(|p| p.provide_stake);
        self.authorize(caller, MarketAction::Signal)?;
        let now = self.clock.now();
        let request = self.live_request(id)?;
        let limit = request.config.provider_limit;
        if now > request.config.signal_expiry {
            return Err(self.window_violation(request, MarketAction::Signal, now));
        }
        if self.records.status(id, caller, LegKind::Provider) != PerformanceStatus::Unmarked {
            return Err(MarketError::DoubleReservation {
                request: id,
                account: caller.clone(),
                role: LegKind::Provider,
            });
        }
        let available = self.signal_state(id)?.providers_available(limit);
        if available == 0 {
            return Err(MarketError::CapacityExhausted {
                request: id,
                role: LegKind::Provider,
                requested: 1,
                available,
            });
        }
        self.check_reputation(caller, now)?;
        if let Some(stake) = stake {
            self.lock_stake(caller, stake, now)?;
        }

        if let Some(state) = self.signals.get_mut(&id) {
            state.providers_reserved += 1;
        }
        self.records.reserve_provider(id, caller);
        if let Some(stake) = stake {
            self.records.record_stake(id, caller, LegKind::Provider, stake);
        }
        debug!(request = %id, provider = %caller, "Provider slot reserved");
        self.events.push(MarketEvent::RequestSignal {
            request: id,
            provider: caller.clone(),
        });
        Ok(())
    }

    /// Reserve `quantity` review slots. All or nothing.
    pub fn signal_review(
        &mut self,
        caller: &AccountId,
        id: RequestId,
        quantity: u64,
    ) -> Result<(), MarketError> {
        let per_slot = self.market_config()?.reputation.as_ref().map(|p| p.review_stake);
        self.authorize(caller, MarketAction::SignalReview)?;
        if quantity == 0 {
            return Err(MarketError::InvalidQuantity);
        }
        let stake = per_slot
            .map(|per_slot| {
                per_slot.checked_mul(Amount::from(quantity)).ok_or_else(|| {
                    MarketError::InvalidConfiguration(format!("review stake for {} slots overflows", quantity))
                })
            })
            .transpose()?;
        let now = self.clock.now();
        let request = self.live_request(id)?;
        let limit = request.config.reviewer_limit;
        if now > request.config.signal_expiry {
            return Err(self.window_violation(request, MarketAction::SignalReview, now));
        }
        if self.records.status(id, caller, LegKind::Reviewer) != PerformanceStatus::Unmarked {
            return Err(MarketError::DoubleReservation {
                request: id,
                account: caller.clone(),
                role: LegKind::Reviewer,
            });
        }
        let available = self.signal_state(id)?.reviewers_available(limit);
        if quantity > available {
            return Err(MarketError::CapacityExhausted {
                request: id,
                role: LegKind::Reviewer,
                requested: quantity,
                available,
            });
        }
        self.check_reputation(caller, now)?;
        if let Some(stake) = stake {
            self.lock_stake(caller, stake, now)?;
        }

        if let Some(state) = self.signals.get_mut(&id) {
            state.reviewers_reserved += quantity;
        }
        self.records.reserve_reviews(id, caller, quantity);
        if let Some(stake) = stake {
            self.records.record_stake(id, caller, LegKind::Reviewer, stake);
        }
        debug!(request = %id, reviewer = %caller, quantity, "Review slots reserved");
        self.events.push(MarketEvent::ReviewSignal {
            request: id,
            reviewer: caller.clone(),
            quantity,
        });
        Ok(())
    }

    // ── Work ─────────────────────────────────────────────────────────

    /// Deliver work against a provider reservation.
    pub fn provide(
        &mut self,
        caller: &AccountId,
        id: RequestId,
        uri: impl Into<String>,
    ) -> Result<SubmissionId, MarketError> {
        self.market_config()?;
        self.authorize(caller, MarketAction::Provide)?;
        let now = self.clock.now();
        let request = self.live_request(id)?;
        if now < request.config.signal_expiry || now > request.config.submission_expiry {
            return Err(self.window_violation(request, MarketAction::Provide, now));
        }
        if self.records.status(id, caller, LegKind::Provider) != PerformanceStatus::Reserved {
            return Err(MarketError::NoReservation {
                request: id,
                account: caller.clone(),
                role: LegKind::Provider,
            });
        }

        let submission = SubmissionId(self.next_submission + 1);
        let uri = uri.into();
        self.next_submission = submission.0;
        self.submissions.insert(
            submission,
            ServiceSubmission {
                id: submission,
                provider: caller.clone(),
                request_id: id,
                created_at: now,
                uri: uri.clone(),
            },
        );
        if let Some(state) = self.signals.get_mut(&id) {
            state.providers_arrived += 1;
        }
        if let Some(request) = self.requests.get_mut(&id) {
            request.submission_count += 1;
        }
        self.records.consume_provider(id, caller);

        info!(request = %id, submission = %submission, provider = %caller, "Submission created");
        self.events.push(MarketEvent::RequestFulfilled {
            request: id,
            submission,
            provider: caller.clone(),
            uri,
        });
        Ok(submission)
    }

    /// Score a submission, using one review slot.
    pub fn review(
        &mut self,
        caller: &AccountId,
        id: RequestId,
        submission: SubmissionId,
        score: u64,
        uri: impl Into<String>,
    ) -> Result<(), MarketError> {
        self.market_config()?;
        self.authorize(caller, MarketAction::Review)?;
        let now = self.clock.now();
        let request = self.live_request(id)?;
        if now < request.config.submission_expiry || now > request.config.enforcement_expiry {
            return Err(self.window_violation(request, MarketAction::Review, now));
        }
        let pool = RequestPool::from_config(&request.config);
        let provider = self.submission_of(id, submission)?.provider.clone();
        if &provider == caller {
            return Err(MarketError::SelfReview {
                account: caller.clone(),
                submission,
            });
        }
        if self.records.review_quota(id, caller) == 0 {
            return Err(MarketError::NoReservation {
                request: id,
                account: caller.clone(),
                role: LegKind::Reviewer,
            });
        }
        if self.records.has_scored(submission, caller) {
            return Err(MarketError::AlreadyReviewed {
                account: caller.clone(),
                submission,
            });
        }

        let update = self
            .enforcement
            .on_review(&self.market_id, id, &pool, submission, score)?;

        let accumulator = self.accumulators.entry(submission).or_default();
        accumulator.record(score);
        accumulator.qualified = update.qualified;
        let uri = uri.into();
        self.reviews.entry(submission).or_default().push(ReviewRecord {
            reviewer: caller.clone(),
            score,
            uri: uri.clone(),
        });
        if let Some(state) = self.signals.get_mut(&id) {
            state.reviewers_arrived += 1;
        }
        self.records.consume_review(id, submission, caller);

        debug!(
            request = %id,
            submission = %submission,
            reviewer = %caller,
            score,
            average = update.average,
            qualified = update.qualified,
            "Review recorded"
        );
        self.events.push(MarketEvent::RequestReviewed {
            request: id,
            submission,
            reviewer: caller.clone(),
            score,
            uri,
            average: update.average,
            qualified: update.qualified,
            earnings: update.earnings,
            remainder: update.remainder,
            intent_change: update.intent_change,
            new_submission: update.new_submission,
        });
        Ok(())
    }

    // ── Settlement ───────────────────────────────────────────────────

    /// Pay a reviewed submission's provider and each of its reviewers.
    /// Anyone may trigger it; funds only flow to the participants.
    pub fn claim(
        &mut self,
        caller: &AccountId,
        id: RequestId,
        submission: SubmissionId,
    ) -> Result<ClaimReceipt, MarketError> {
        let params = self.market_config()?.reputation.clone();
        self.authorize(caller, MarketAction::Claim)?;
        let now = self.clock.now();
        let request = self.live_request(id)?;
        if now <= request.config.enforcement_expiry {
            return Err(self.window_violation(request, MarketAction::Claim, now));
        }
        let pool = RequestPool::from_config(&request.config);
        let provider = self.submission_of(id, submission)?.provider.clone();
        if self.records.is_claimed(submission) {
            return Err(MarketError::AlreadySettled { request: id, submission });
        }
        let accumulator = self
            .accumulators
            .get(&submission)
            .filter(|acc| acc.review_count > 0)
            .ok_or(MarketError::QuorumNotReached(submission))?;
        let qualified = accumulator.qualified;

        let reward = self
            .enforcement
            .compute_reward(&self.market_id, id, &pool, submission, accumulator.average())?;
        let reviewer_payouts: Vec<(AccountId, Amount)> = self
            .reviews
            .get(&submission)
            .map(|reviews| {
                reviews
                    .iter()
                    .map(|r| (r.reviewer.clone(), reward.reviewer_per_review))
                    .collect()
            })
            .unwrap_or_default();
        let reviewer_total = reviewer_payouts
            .iter()
            .try_fold(0 as Amount, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or_else(|| MarketError::InvalidConfiguration("reviewer payout overflow".into()))?;

        self.payments.check_release(id, LegKind::Provider, reward.provider)?;
        self.payments.check_release(id, LegKind::Reviewer, reviewer_total)?;

        // Reputation rewards are checked, and the engine held, before any
        // funds move.
        let mut mints: Vec<(&AccountId, Amount)> = Vec::new();
        if qualified {
            if let Some(params) = &params {
                mints.push((&provider, params.provider_reward));
                mints.extend(reviewer_payouts.iter().map(|(r, _)| (r, params.reviewer_reward)));
            }
        }
        let reputation = self.reputation.clone();
        let mut minter = match &reputation {
            Some(reputation) if !mints.is_empty() => {
                let engine = reputation.write()?;
                for (account, amount) in &mints {
                    engine.check_mint(&self.market_id, account, *amount, now)?;
                }
                Some(engine)
            }
            _ => None,
        };

        self.payments
            .release(id, LegKind::Provider, &provider, reward.provider, ReleaseKind::Claim)?;
        self.payments
            .release_batch(id, LegKind::Reviewer, &reviewer_payouts, ReleaseKind::Claim)?;
        self.enforcement
            .finalize_reward(&self.market_id, id, submission, &reward)?;
        self.records.mark_claimed(submission);

        if let Some(engine) = minter.as_mut() {
            for (account, amount) in &mints {
                engine.mint_reputation(&self.market_id, account, *amount, now)?;
            }
        }
        drop(minter);

        info!(
            request = %id,
            submission = %submission,
            provider = %provider,
            provider_paid = reward.provider,
            reviewer_paid = reviewer_total,
            "Claim paid"
        );
        self.events.push(MarketEvent::RequestPayClaimed {
            request: id,
            submission,
            provider: provider.clone(),
            provider_paid: reward.provider,
            reviewer_paid: reviewer_total,
            reviewers: reviewer_payouts.len() as u64,
        });
        Ok(ClaimReceipt {
            request: id,
            submission,
            provider,
            provider_paid: reward.provider,
            reviewer_payouts,
        })
    }

    /// Refund to the requester whatever no submission or review can claim.
    /// Repeat calls, and calls on a withdrawn request, pay zero.
    pub fn claim_remainder(
        &mut self,
        caller: &AccountId,
        id: RequestId,
    ) -> Result<(Amount, Amount), MarketError> {
        self.market_config()?;
        self.authorize(caller, MarketAction::ClaimRemainder)?;
        let now = self.clock.now();
        let request = self.request(id)?;
        if &request.requester != caller {
            return Err(MarketError::NotAuthorized {
                account: caller.clone(),
                action: MarketAction::ClaimRemainder,
            });
        }
        if request.withdrawn {
            return Ok((0, 0));
        }
        if now <= request.config.enforcement_expiry {
            return Err(self.window_violation(request, MarketAction::ClaimRemainder, now));
        }
        if self.payment_state(id).is_some_and(|state| state.remainder_claimed) {
            debug!(request = %id, "Remainder already claimed");
            return Ok((0, 0));
        }

        let pool = RequestPool::from_config(&request.config);
        let provider_amount = self.enforcement.compute_remainder(&self.market_id, id, &pool)?;
        let reviews = self.signal_state(id)?.reviewers_arrived as Amount;
        let reviewer_amount = pool
            .per_review()
            .checked_mul(reviews)
            .and_then(|owed| pool.reviewer_total.checked_sub(owed))
            .ok_or_else(|| MarketError::InvalidConfiguration(format!("reviewer leg of {} overdrawn", id)))?;

        self.payments.check_release(id, LegKind::Provider, provider_amount)?;
        self.payments.check_release(id, LegKind::Reviewer, reviewer_amount)?;
        self.payments
            .release(id, LegKind::Provider, caller, provider_amount, ReleaseKind::Refund)?;
        self.payments
            .release(id, LegKind::Reviewer, caller, reviewer_amount, ReleaseKind::Refund)?;
        self.payments.mark_remainder_claimed(id)?;

        info!(request = %id, requester = %caller, provider_amount, reviewer_amount, "Remainder refunded");
        self.events.push(MarketEvent::RemainderClaimed {
            request: id,
            requester: caller.clone(),
            provider_amount,
            reviewer_amount,
        });
        Ok((provider_amount, reviewer_amount))
    }

    /// Return the reputation `caller` staked on `id` once its reservation is
    /// used up: delivered for a provider, every slot scored for a reviewer.
    /// Stakes on a withdrawn request are free at once.
    pub fn retrieve_reputation(&mut self, caller: &AccountId, id: RequestId) -> Result<Amount, MarketError> {
        self.market_config()?;
        self.authorize(caller, MarketAction::RetrieveReputation)?;
        let now = self.clock.now();
        let withdrawn = self.request(id)?.withdrawn;

        let mut locked = false;
        let mut retrievable = Vec::new();
        let mut amount: Amount = 0;
        for role in [LegKind::Provider, LegKind::Reviewer] {
            let Some(stake) = self.records.stake(id, caller, role) else {
                continue;
            };
            if self.records.is_retrieved(id, caller, role) {
                continue;
            }
            if !withdrawn && self.records.status(id, caller, role) != PerformanceStatus::Settled {
                locked = true;
                continue;
            }
            amount = amount
                .checked_add(stake)
                .ok_or_else(|| MarketError::InvalidConfiguration("stake overflow".into()))?;
            retrievable.push(role);
        }
        if retrievable.is_empty() {
            let staked = [LegKind::Provider, LegKind::Reviewer]
                .iter()
                .any(|role| self.records.stake(id, caller, *role).is_some());
            return Err(if staked && !locked {
                MarketError::StakeRetrieved {
                    request: id,
                    account: caller.clone(),
                }
            } else {
                MarketError::StakeLocked {
                    request: id,
                    account: caller.clone(),
                }
            });
        }

        if amount > 0 {
            let reputation = self.reputation.as_ref().ok_or_else(|| {
                MarketError::InvalidConfiguration("reputation parameters need a reputation engine".into())
            })?;
            reputation
                .write()?
                .mint_reputation(&self.market_id, caller, amount, now)?;
        }
        for role in retrievable {
            self.records.mark_retrieved(id, caller, role);
        }

        info!(request = %id, account = %caller, amount, "Reputation stake retrieved");
        self.events.push(MarketEvent::ReputationRetrieved {
            request: id,
            account: caller.clone(),
            amount,
        });
        Ok(amount)
    }

    // ── Views ────────────────────────────────────────────────────────

    /// Current payout of a reviewed submission, without paying it.
    pub fn preview_reward(&self, id: RequestId, submission: SubmissionId) -> Result<Reward, MarketError> {
        let request = self.request(id)?;
        self.submission_of(id, submission)?;
        let average = self
            .accumulators
            .get(&submission)
            .filter(|acc| acc.review_count > 0)
            .ok_or(MarketError::QuorumNotReached(submission))?
            .average();
        let pool = RequestPool::from_config(&request.config);
        Ok(self
            .enforcement
            .compute_reward(&self.market_id, id, &pool, submission, average)?)
    }

    pub fn phase(&self, id: RequestId) -> Result<RequestPhase, MarketError> {
        Ok(self.request(id)?.phase_at(self.clock.now()))
    }

    pub fn market_id(&self) -> MarketId {
        self.market_id
    }

    pub fn escrow_account(&self) -> &AccountId {
        self.payments.escrow_account()
    }

    pub fn config(&self) -> Option<&MarketConfig> {
        self.config.as_ref()
    }

    pub fn enforcement(&self) -> &dyn EnforcementCriteria {
        self.enforcement.as_ref()
    }

    pub fn tokens(&self) -> &L {
        self.payments.tokens()
    }

    pub fn request(&self, id: RequestId) -> Result<&ServiceRequest, MarketError> {
        self.requests.get(&id).ok_or(MarketError::RequestNotFound(id))
    }

    pub fn requests(&self) -> impl Iterator<Item = &ServiceRequest> {
        self.requests.values()
    }

    pub fn signal_state(&self, id: RequestId) -> Result<&SignalState, MarketError> {
        self.signals.get(&id).ok_or(MarketError::RequestNotFound(id))
    }

    pub fn submission(&self, id: SubmissionId) -> Result<&ServiceSubmission, MarketError> {
        self.submissions.get(&id).ok_or(MarketError::SubmissionNotFound(id))
    }

    /// Submissions of one request, in creation order.
    pub fn submissions_for(&self, id: RequestId) -> Vec<&ServiceSubmission> {
        self.submissions
            .values()
            .filter(|s| s.request_id == id)
            .collect()
    }

    pub fn accumulator(&self, id: SubmissionId) -> Option<&ReviewAccumulator> {
        self.accumulators.get(&id)
    }

    pub fn reviews(&self, id: SubmissionId) -> &[ReviewRecord] {
        self.reviews.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn payment_state(&self, id: RequestId) -> Option<&RequestPaymentState> {
        self.payments.state(id)
    }

    pub fn performance(&self, id: RequestId, account: &AccountId, role: LegKind) -> PerformanceStatus {
        self.records.status(id, account, role)
    }

    pub fn remaining_reviews(&self, id: RequestId, account: &AccountId) -> u64 {
        self.records.review_quota(id, account)
    }

    pub fn is_claimed(&self, submission: SubmissionId) -> bool {
        self.records.is_claimed(submission)
    }

    pub fn events(&self) -> &[MarketEvent] {
        &self.events
    }

    // ── Guards ───────────────────────────────────────────────────────

    fn market_config(&self) -> Result<&MarketConfig, MarketError> {
        self.config.as_ref().ok_or(MarketError::NotInitialized)
    }

    fn authorize(&self, caller: &AccountId, action: MarketAction) -> Result<(), MarketError> {
        let gated = self.config.as_ref().is_some_and(|c| c.gated);
        if !gated {
            return Ok(());
        }
        let allowed = self
            .authorization
            .as_ref()
            .is_some_and(|oracle| oracle.is_authorized(caller, action));
        if !allowed {
            warn!(account = %caller, action = %action, "Authorization denied");
            return Err(MarketError::NotAuthorized {
                account: caller.clone(),
                action,
            });
        }
        Ok(())
    }

    fn check_reputation(&self, caller: &AccountId, now: Timestamp) -> Result<(), MarketError> {
        let Some(params) = self.config.as_ref().and_then(|c| c.reputation.as_ref()) else {
            return Ok(());
        };
        let reputation = self.reputation.as_ref().ok_or_else(|| {
            MarketError::InvalidConfiguration("reputation parameters need a reputation engine".into())
        })?;
        let available = reputation
            .read()?
            .get_available_reputation(&self.market_id, caller, now)?;
        if !params.admits(available) {
            warn!(account = %caller, available, min = params.signal_min, "Reputation gate rejected signal");
            return Err(MarketError::InsufficientReputation {
                account: caller.clone(),
                available,
                min: params.signal_min,
                max: params.signal_max,
            });
        }
        Ok(())
    }

    fn lock_stake(&self, caller: &AccountId, stake: Amount, now: Timestamp) -> Result<(), MarketError> {
        if stake == 0 {
            return Ok(());
        }
        let reputation = self.reputation.as_ref().ok_or_else(|| {
            MarketError::InvalidConfiguration("reputation parameters need a reputation engine".into())
        })?;
        reputation
            .write()?
            .revoke_reputation(&self.market_id, caller, stake, now)?;
        debug!(account = %caller, stake, "Reputation staked");
        Ok(())
    }

    fn live_request(&self, id: RequestId) -> Result<&ServiceRequest, MarketError> {
        let request = self.request(id)?;
        if request.withdrawn {
            return Err(MarketError::RequestWithdrawn(id));
        }
        Ok(request)
    }

    fn ensure_uncommitted(
        &self,
        caller: &AccountId,
        id: RequestId,
        action: MarketAction,
    ) -> Result<(), MarketError> {
        let request = self.live_request(id)?;
        if &request.requester != caller {
            return Err(MarketError::NotAuthorized {
                account: caller.clone(),
                action,
            });
        }
        if self.signal_state(id)?.providers_reserved > 0 {
            return Err(MarketError::RequestCommitted(id));
        }
        Ok(())
    }

    fn submission_of(&self, id: RequestId, submission: SubmissionId) -> Result<&ServiceSubmission, MarketError> {
        let record = self.submission(submission)?;
        if record.request_id != id {
            return Err(MarketError::SubmissionMismatch {
                request: id,
                submission,
            });
        }
        Ok(record)
    }

    fn window_violation(&self, request: &ServiceRequest, action: MarketAction, now: Timestamp) -> MarketError {
        MarketError::WindowViolation {
            request: request.id,
            action,
            phase: request.phase_at(now),
            now,
        }
    }
}
