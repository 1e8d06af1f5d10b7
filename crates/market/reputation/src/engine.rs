use std::collections::HashMap;

use labor_market_types::{signed, AccountId, Amount, Epoch, MarketId};
use tracing::{debug, info, warn};

use crate::decay::pending_decay;
use crate::error::ReputationError;
use crate::types::{DecayConfig, ReputationAccount, ReputationEvent, ReputationToken};

/// Reputation balances, decay schedules and market bindings.
#[derive(Debug, Default)]
pub struct ReputationEngine {
    decay_configs: HashMap<ReputationToken, DecayConfig>,
    market_tokens: HashMap<MarketId, ReputationToken>,
    accounts: HashMap<(ReputationToken, AccountId), ReputationAccount>,
    events: Vec<ReputationEvent>,
}

impl ReputationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the decay schedule of `token`. A non-zero rate needs a non-zero
    /// interval.
    pub fn set_decay_config(
        &mut self,
        token: ReputationToken,
        rate: Amount,
        interval: Epoch,
        start_epoch: Epoch,
    ) -> Result<(), ReputationError> {
        if rate > 0 && interval == 0 {
            return Err(ReputationError::InvalidDecayConfig(format!(
                "rate {} with zero interval",
                rate
            )));
        }
        let config = DecayConfig {
            rate,
            interval,
            start_epoch,
        };
        info!(token = %token, rate, interval, start_epoch, "Reputation decay configured");
        self.decay_configs.insert(token.clone(), config);
        self.events
            .push(ReputationEvent::ReputationDecayConfigured { token, config });
        Ok(())
    }

    /// Bind `market` to `token`, replacing any earlier binding.
    pub fn use_reputation_module(&mut self, market: MarketId, token: ReputationToken) {
        info!(market = %market, token = %token, "Market reputation configured");
        self.market_tokens.insert(market, token.clone());
        self.events
            .push(ReputationEvent::MarketReputationConfigured { market, token });
    }

    pub fn market_token(&self, market: &MarketId) -> Result<&ReputationToken, ReputationError> {
        self.market_tokens
            .get(market)
            .ok_or(ReputationError::MarketNotConfigured(*market))
    }

    pub fn decay_config(&self, token: &ReputationToken) -> Option<&DecayConfig> {
        self.decay_configs.get(token)
    }

    /// Stored account state, before any pending decay.
    pub fn account(&self, token: &ReputationToken, account: &AccountId) -> ReputationAccount {
        self.accounts
            .get(&(token.clone(), account.clone()))
            .copied()
            .unwrap_or_default()
    }

    pub fn get_pending_decay(&self, token: &ReputationToken, account: &AccountId, now: Epoch) -> Amount {
        let stored = self.account(token, account);
        pending_decay(&stored, self.decay_configs.get(token), now).0
    }

    /// Balance net of pending decay in the market's reputation token.
    pub fn get_available_reputation(
        &self,
        market: &MarketId,
        account: &AccountId,
        now: Epoch,
    ) -> Result<Amount, ReputationError> {
        let token = self.market_token(market)?;
        let stored = self.account(token, account);
        let (decay, _) = pending_decay(&stored, self.decay_configs.get(token), now);
        Ok(stored.balance - decay)
    }

    /// Balance `mint_reputation` would leave, without minting. Fails exactly
    /// when the mint would.
    pub fn check_mint(
        &self,
        market: &MarketId,
        account: &AccountId,
        amount: Amount,
        now: Epoch,
    ) -> Result<Amount, ReputationError> {
        let token = self.market_token(market)?;
        let (decayed, _) = self.settled(token, account, now);
        decayed
            .balance
            .checked_add(amount)
            .ok_or_else(|| ReputationError::Overflow(format!("mint of {} to {}", amount, account)))
    }

    pub fn mint_reputation(
        &mut self,
        market: &MarketId,
        account: &AccountId,
        amount: Amount,
        now: Epoch,
    ) -> Result<Amount, ReputationError> {
        let balance = self.check_mint(market, account, amount, now)?;
        let token = self.market_token(market)?.clone();
        let (decayed, decay) = self.settled(&token, account, now);
        let mut state = decayed;
        state.balance = balance;

        self.commit_decay(&token, account, &decayed, decay);
        self.store(&token, account, state, signed(amount));
        info!(token = %token, account = %account, amount, balance = state.balance, "Reputation minted");
        Ok(state.balance)
    }

    pub fn revoke_reputation(
        &mut self,
        market: &MarketId,
        account: &AccountId,
        amount: Amount,
        now: Epoch,
    ) -> Result<Amount, ReputationError> {
        let token = self.market_token(market)?.clone();
        let (decayed, decay) = self.settled(&token, account, now);
        let mut state = decayed;
        if state.balance < amount {
            warn!(account = %account, required = amount, available = state.balance, "Reputation revoke rejected");
            return Err(ReputationError::InsufficientReputation {
                account: account.clone(),
                required: amount,
                available: state.balance,
            });
        }
        state.balance -= amount;

        self.commit_decay(&token, account, &decayed, decay);
        self.store(&token, account, state, -signed(amount));
        info!(token = %token, account = %account, amount, balance = state.balance, "Reputation revoked");
        Ok(state.balance)
    }

    /// Pause decay of `account` until `until_epoch`. Pending decay is applied
    /// first, and an existing later freeze is kept.
    pub fn freeze_reputation(
        &mut self,
        token: &ReputationToken,
        account: &AccountId,
        until_epoch: Epoch,
        now: Epoch,
    ) -> Epoch {
        let (mut state, decay) = self.settled(token, account, now);
        self.commit_decay(token, account, &state, decay);
        state.frozen_until_epoch = state.frozen_until_epoch.max(until_epoch);
        let frozen = state.frozen_until_epoch;

        self.accounts.insert((token.clone(), account.clone()), state);
        info!(token = %token, account = %account, until_epoch = frozen, "Reputation frozen");
        self.events.push(ReputationEvent::ReputationFrozen {
            token: token.clone(),
            account: account.clone(),
            until_epoch: frozen,
        });
        frozen
    }

    pub fn events(&self) -> &[ReputationEvent] {
        &self.events
    }

    /// Stored account with pending decay applied, and the decay amount.
    fn settled(&self, token: &ReputationToken, account: &AccountId, now: Epoch) -> (ReputationAccount, Amount) {
        let mut state = self.account(token, account);
        let (decay, anchor) = pending_decay(&state, self.decay_configs.get(token), now);
        state.last_decay_epoch = anchor;
        state.balance -= decay;
        (state, decay)
    }

    fn commit_decay(&mut self, token: &ReputationToken, account: &AccountId, state: &ReputationAccount, decay: Amount) {
        if decay == 0 {
            return;
        }
        debug!(
            token = %token,
            account = %account,
            decay,
            anchor = state.last_decay_epoch,
            "Reputation decay applied"
        );
        self.events.push(ReputationEvent::ReputationBalanceChange {
            token: token.clone(),
            account: account.clone(),
            delta: -signed(decay),
            balance: state.balance,
        });
    }

    fn store(&mut self, token: &ReputationToken, account: &AccountId, state: ReputationAccount, delta: i128) {
        self.accounts.insert((token.clone(), account.clone()), state);
        self.events.push(ReputationEvent::ReputationBalanceChange {
            token: token.clone(),
            account: account.clone(),
            delta,
            balance: state.balance,
        });
    }
}
