use labor_market_types::{AccountId, Amount, LegKind, RequestId, TokenId};
use thiserror::Error;

/// Errors from token moves and escrow bookkeeping.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient {token} balance for {account}: required {required}, available {available}")]
    InsufficientBalance {
        token: TokenId,
        account: AccountId,
        required: Amount,
        available: Amount,
    },

    #[error("{leg} leg of {request} would over-release: escrowed {escrowed}, released {released}, requested {requested}")]
    ReleaseExceedsEscrow {
        request: RequestId,
        leg: LegKind,
        escrowed: Amount,
        released: Amount,
        requested: Amount,
    },

    #[error("{0} already has escrow recorded")]
    AlreadyEscrowed(RequestId),

    #[error("no escrow recorded for {0}")]
    UnknownRequest(RequestId),

    #[error("amount overflow in {0}")]
    Overflow(String),

    #[error("token ledger unavailable: {0}")]
    Unavailable(String),
}
