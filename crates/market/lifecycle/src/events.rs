use labor_market_types::{
    AccountId, Amount, EnforcementKind, MarketId, RequestId, SubmissionId, Timestamp,
};
use serde::{Deserialize, Serialize};

/// Append-only log of successful market calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketEvent {
    MarketInitialized {
        market: MarketId,
        owner: AccountId,
        enforcement: EnforcementKind,
        uri: String,
    },
    EnforcementConfigured {
        market: MarketId,
        max_score: u64,
        breakpoints: Vec<u64>,
        weights: Vec<u64>,
    },
    RequestConfigured {
        request: RequestId,
        requester: AccountId,
        provider_total: Amount,
        reviewer_total: Amount,
        provider_limit: u64,
        reviewer_limit: u64,
        signal_expiry: Timestamp,
        submission_expiry: Timestamp,
        enforcement_expiry: Timestamp,
        uri: String,
    },
    RequestEdited {
        request: RequestId,
        provider_total: Amount,
        reviewer_total: Amount,
        provider_limit: u64,
        reviewer_limit: u64,
        uri: String,
    },
    RequestWithdrawn {
        request: RequestId,
        provider_refund: Amount,
        reviewer_refund: Amount,
    },
    RequestSignal {
        request: RequestId,
        provider: AccountId,
    },
    ReviewSignal {
        request: RequestId,
        reviewer: AccountId,
        quantity: u64,
    },
    RequestFulfilled {
        request: RequestId,
        submission: SubmissionId,
        provider: AccountId,
        uri: String,
    },
    /// Carries the engine's running view after the review.
    RequestReviewed {
        request: RequestId,
        submission: SubmissionId,
        reviewer: AccountId,
        score: u64,
        uri: String,
        average: u64,
        qualified: bool,
        earnings: Amount,
        remainder: Amount,
        intent_change: i128,
        new_submission: bool,
    },
    RequestPayClaimed {
        request: RequestId,
        submission: SubmissionId,
        provider: AccountId,
        provider_paid: Amount,
        reviewer_paid: Amount,
        reviewers: u64,
    },
    RemainderClaimed {
        request: RequestId,
        requester: AccountId,
        provider_amount: Amount,
        reviewer_amount: Amount,
    },
    ReputationRetrieved {
        request: RequestId,
        account: AccountId,
        amount: Amount,
    },
}

impl MarketEvent {
    pub fn name(&self) -> &'static str {
        match self {
            MarketEvent::MarketInitialized { .. } => "MarketInitialized",
            MarketEvent::EnforcementConfigured { .. } => "EnforcementConfigured",
            MarketEvent::RequestConfigured { .. } => "RequestConfigured",
            MarketEvent::RequestEdited { .. } => "RequestEdited",
            MarketEvent::RequestWithdrawn { .. } => "RequestWithdrawn",
            MarketEvent::RequestSignal { .. } => "RequestSignal",
            MarketEvent::ReviewSignal { .. } => "ReviewSignal",
            MarketEvent::RequestFulfilled { .. } => "RequestFulfilled",
            MarketEvent::RequestReviewed { .. } => "RequestReviewed",
            MarketEvent::RequestPayClaimed { .. } => "RequestPayClaimed",
            MarketEvent::RemainderClaimed { .. } => "RemainderClaimed",
            MarketEvent::ReputationRetrieved { .. } => "ReputationRetrieved",
        }
    }
}
