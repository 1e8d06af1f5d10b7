use labor_market_types::AccountId;
use serde::{Deserialize, Serialize};

/// Mutating market calls an authorization oracle can gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketAction {
    ConfigureEnforcement,
    SubmitRequest,
    EditRequest,
    WithdrawRequest,
    Signal,
    SignalReview,
    Provide,
    Review,
    Claim,
    ClaimRemainder,
    RetrieveReputation,
}

impl std::fmt::Display for MarketAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MarketAction::ConfigureEnforcement => "configure enforcement",
            MarketAction::SubmitRequest => "submit request",
            MarketAction::EditRequest => "edit request",
            MarketAction::WithdrawRequest => "withdraw request",
            MarketAction::Signal => "signal",
            MarketAction::SignalReview => "signal review",
            MarketAction::Provide => "provide",
            MarketAction::Review => "review",
            MarketAction::Claim => "claim",
            MarketAction::ClaimRemainder => "claim remainder",
            MarketAction::RetrieveReputation => "retrieve reputation",
        };
        f.write_str(name)
    }
}

/// External permission check consulted before every mutating call of a
/// gated market. Must be a pure predicate.
pub trait AuthorizationOracle: Send + Sync {
    fn is_authorized(&self, account: &AccountId, action: MarketAction) -> bool;
}
