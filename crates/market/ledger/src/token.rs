use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use labor_market_types::{AccountId, Amount, TokenId};
use tracing::debug;

use crate::error::LedgerError;

/// Fungible-balance systems the escrow legs settle against.
///
/// A transfer either moves the full amount or fails and moves nothing.
pub trait TokenLedger {
    fn balance_of(&self, token: &TokenId, account: &AccountId) -> Result<Amount, LedgerError>;

    fn transfer(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}

/// Balance table keyed by `(token, account)`.
#[derive(Debug, Default, Clone)]
pub struct InMemoryTokenLedger {
    balances: HashMap<(TokenId, AccountId), Amount>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faucet: credit `amount` out of thin air.
    pub fn mint(
        &mut self,
        token: &TokenId,
        account: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let balance = self
            .balances
            .entry((token.clone(), account.clone()))
            .or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("mint of {} {}", amount, token)))?;
        Ok(())
    }

    /// Sum of all balances held in `token`.
    pub fn supply(&self, token: &TokenId) -> Amount {
        self.balances
            .iter()
            .filter(|((t, _), _)| t == token)
            .map(|(_, amount)| *amount)
            .sum()
    }

    fn balance(&self, token: &TokenId, account: &AccountId) -> Amount {
        self.balances
            .get(&(token.clone(), account.clone()))
            .copied()
            .unwrap_or(0)
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance_of(&self, token: &TokenId, account: &AccountId) -> Result<Amount, LedgerError> {
        Ok(self.balance(token, account))
    }

    fn transfer(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let available = self.balance(token, from);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                token: token.clone(),
                account: from.clone(),
                required: amount,
                available,
            });
        }
        if amount == 0 || from == to {
            return Ok(());
        }

        let credited = self
            .balance(token, to)
            .checked_add(amount)
            .ok_or_else(|| LedgerError::Overflow(format!("credit of {} {} to {}", amount, token, to)))?;

        self.balances
            .insert((token.clone(), from.clone()), available - amount);
        self.balances.insert((token.clone(), to.clone()), credited);

        debug!(token = %token, from = %from, to = %to, amount = amount, "Token transfer");
        Ok(())
    }
}

/// Cloneable handle over one `InMemoryTokenLedger`, so several markets and
/// their callers observe the same balances.
#[derive(Debug, Clone, Default)]
pub struct SharedTokenLedger {
    inner: Arc<RwLock<InMemoryTokenLedger>>,
}

impl SharedTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(
        &self,
        token: &TokenId,
        account: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.inner
            .write()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?
            .mint(token, account, amount)
    }

    pub fn supply(&self, token: &TokenId) -> Result<Amount, LedgerError> {
        Ok(self
            .inner
            .read()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?
            .supply(token))
    }
}

impl TokenLedger for SharedTokenLedger {
    fn balance_of(&self, token: &TokenId, account: &AccountId) -> Result<Amount, LedgerError> {
        self.inner
            .read()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?
            .balance_of(token, account)
    }

    fn transfer(
        &mut self,
        token: &TokenId,
        from: &AccountId,
        to: &AccountId,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        self.inner
            .write()
            .map_err(|e| LedgerError::Unavailable(e.to_string()))?
            .transfer(token, from, to, amount)
    }
}
