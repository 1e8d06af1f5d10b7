//! # labor-market-ledger
//!
//! Escrow bookkeeping for service requests.
//!
//! - **`TokenLedger`**: the external fungible-balance seam with atomic
//!   `transfer` with revert-on-insufficient-funds semantics
//! - **`InMemoryTokenLedger` / `SharedTokenLedger`**: reference ledger with
//!   a faucet, shareable between markets
//! - **`PaymentLedger`**: per-request two-leg escrow; `escrow` pulls funds in,
//!   `release` pushes them out
//!
//! ## Conservation
//!
//! Cumulative releases of a leg never exceed what that leg escrowed. The
//! check lives here, independent of whatever computed the release amount.

pub mod error;
pub mod payment;
pub mod token;

pub use error::LedgerError;
pub use payment::{LegAccount, PaymentLedger, ReleaseKind, RequestPaymentState};
pub use token::{InMemoryTokenLedger, SharedTokenLedger, TokenLedger};
