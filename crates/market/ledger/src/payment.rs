use std::collections::HashMap;

use labor_market_types::{AccountId, Amount, EscrowLeg, LegKind, RequestId, TokenId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::token::TokenLedger;

/// Why funds leave escrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseKind {
    /// Paid to a provider or reviewer for settled work.
    Claim,
    /// Returned to the requester (withdrawal or remainder).
    Refund,
}

/// Bookkeeping of one escrow leg.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegAccount {
    pub token: TokenId,
    pub escrowed: Amount,
    pub claimed: Amount,
    pub refunded: Amount,
}

impl LegAccount {
    fn new(leg: &EscrowLeg) -> Self {
        Self {
            token: leg.token.clone(),
            escrowed: leg.total,
            claimed: 0,
            refunded: 0,
        }
    }

    pub fn released(&self) -> Amount {
        self.claimed + self.refunded
    }

    /// Still held in escrow.
    pub fn outstanding(&self) -> Amount {
        self.escrowed - self.released()
    }

    /// `claimed + refunded == escrowed`.
    pub fn is_conserved(&self) -> bool {
        self.released() == self.escrowed
    }
}

/// Payment state of one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestPaymentState {
    pub provider: LegAccount,
    pub reviewer: LegAccount,
    pub remainder_claimed: bool,
}

impl RequestPaymentState {
    pub fn leg(&self, kind: LegKind) -> &LegAccount {
        match kind {
            LegKind::Provider => &self.provider,
            LegKind::Reviewer => &self.reviewer,
        }
    }

    fn leg_mut(&mut self, kind: LegKind) -> &mut LegAccount {
        match kind {
            LegKind::Provider => &mut self.provider,
            LegKind::Reviewer => &mut self.reviewer,
        }
    }

    pub fn is_conserved(&self) -> bool {
        self.provider.is_conserved() && self.reviewer.is_conserved()
    }
}

/// Two-leg escrow over a `TokenLedger`.
///
/// Escrowed funds sit in `escrow_account` on the token ledger. Every
/// release is checked against the leg's escrowed total before any token
/// moves.
pub struct PaymentLedger<L: TokenLedger> {
    tokens: L,
    escrow_account: AccountId,
    requests: HashMap<RequestId, RequestPaymentState>,
}

impl<L: TokenLedger> PaymentLedger<L> {
    pub fn new(tokens: L, escrow_account: AccountId) -> Self {
        Self {
            tokens,
            escrow_account,
            requests: HashMap::new(),
        }
    }

    pub fn tokens(&self) -> &L {
        &self.tokens
    }

    pub fn escrow_account(&self) -> &AccountId {
        &self.escrow_account
    }

    pub fn state(&self, request: RequestId) -> Option<&RequestPaymentState> {
        self.requests.get(&request)
    }

    /// Pull both legs of a request from `from`, atomically.
    pub fn escrow(
        &mut self,
        request: RequestId,
        from: &AccountId,
        provider: &EscrowLeg,
        reviewer: &EscrowLeg,
    ) -> Result<(), LedgerError> {
        if self.requests.contains_key(&request) {
            return Err(LedgerError::AlreadyEscrowed(request));
        }

        self.ensure_funds(from, provider, reviewer)?;

        self.tokens
            .transfer(&provider.token, from, &self.escrow_account, provider.total)?;
        if let Err(err) =
            self.tokens
                .transfer(&reviewer.token, from, &self.escrow_account, reviewer.total)
        {
            if let Err(rollback) =
                self.tokens
                    .transfer(&provider.token, &self.escrow_account, from, provider.total)
            {
                warn!(request = %request, error = %rollback, "Escrow rollback failed");
            }
            return Err(err);
        }

        self.requests.insert(
            request,
            RequestPaymentState {
                provider: LegAccount::new(provider),
                reviewer: LegAccount::new(reviewer),
                remainder_claimed: false,
            },
        );

        debug!(
            request = %request,
            from = %from,
            provider_total = provider.total,
            reviewer_total = reviewer.total,
            "Escrowed request legs"
        );
        Ok(())
    }

    /// Swap the escrow of a not-yet-paid request for new terms.
    ///
    /// The old legs go back to `requester` and the new ones are pulled. On
    /// failure the old escrow is restored.
    pub fn replace_escrow(
        &mut self,
        request: RequestId,
        requester: &AccountId,
        provider: &EscrowLeg,
        reviewer: &EscrowLeg,
    ) -> Result<(), LedgerError> {
        let previous = self
            .requests
            .get(&request)
            .cloned()
            .ok_or(LedgerError::UnknownRequest(request))?;

        self.refund_outstanding(request, requester)?;
        self.requests.remove(&request);

        if let Err(err) = self.escrow(request, requester, provider, reviewer) {
            let old_provider = EscrowLeg::new(previous.provider.token.clone(), previous.provider.outstanding());
            let old_reviewer = EscrowLeg::new(previous.reviewer.token.clone(), previous.reviewer.outstanding());
            if let Err(restore) = self.escrow(request, requester, &old_provider, &old_reviewer) {
                warn!(request = %request, error = %restore, "Escrow restore failed");
            } else {
                self.requests.insert(request, previous);
            }
            return Err(err);
        }
        Ok(())
    }

    /// Verify that `amount` more can leave `leg` without over-releasing.
    pub fn check_release(
        &self,
        request: RequestId,
        leg: LegKind,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let state = self
            .requests
            .get(&request)
            .ok_or(LedgerError::UnknownRequest(request))?;
        let account = state.leg(leg);
        let over = account
            .released()
            .checked_add(amount)
            .map_or(true, |total| total > account.escrowed);
        if over {
            warn!(
                request = %request,
                leg = %leg,
                escrowed = account.escrowed,
                released = account.released(),
                requested = amount,
                "Release rejected by conservation guard"
            );
            return Err(LedgerError::ReleaseExceedsEscrow {
                request,
                leg,
                escrowed: account.escrowed,
                released: account.released(),
                requested: amount,
            });
        }
        Ok(())
    }

    /// Push `amount` of `leg` to `to`.
    pub fn release(
        &mut self,
        request: RequestId,
        leg: LegKind,
        to: &AccountId,
        amount: Amount,
        kind: ReleaseKind,
    ) -> Result<(), LedgerError> {
        self.check_release(request, leg, amount)?;
        if amount == 0 {
            return Ok(());
        }

        let token = self
            .requests
            .get(&request)
            .map(|state| state.leg(leg).token.clone())
            .ok_or(LedgerError::UnknownRequest(request))?;
        self.tokens
            .transfer(&token, &self.escrow_account, to, amount)?;

        if let Some(state) = self.requests.get_mut(&request) {
            let account = state.leg_mut(leg);
            match kind {
                ReleaseKind::Claim => account.claimed += amount,
                ReleaseKind::Refund => account.refunded += amount,
            }
        }

        debug!(request = %request, leg = %leg, to = %to, amount = amount, kind = ?kind, "Released escrow");
        Ok(())
    }

    /// Release several payouts from one leg; the total is checked up front
    /// so either every payout fits or none moves.
    pub fn release_batch(
        &mut self,
        request: RequestId,
        leg: LegKind,
        payouts: &[(AccountId, Amount)],
        kind: ReleaseKind,
    ) -> Result<(), LedgerError> {
        let total = payouts
            .iter()
            .try_fold(0 as Amount, |acc, (_, amount)| acc.checked_add(*amount))
            .ok_or_else(|| LedgerError::Overflow(format!("batch release for {}", request)))?;
        self.check_release(request, leg, total)?;

        for (to, amount) in payouts {
            self.release(request, leg, to, *amount, kind)?;
        }
        Ok(())
    }

    /// Return everything still escrowed on both legs to `to`.
    pub fn refund_outstanding(
        &mut self,
        request: RequestId,
        to: &AccountId,
    ) -> Result<(Amount, Amount), LedgerError> {
        let state = self
            .requests
            .get(&request)
            .ok_or(LedgerError::UnknownRequest(request))?;
        let provider = state.provider.outstanding();
        let reviewer = state.reviewer.outstanding();

        self.release(request, LegKind::Provider, to, provider, ReleaseKind::Refund)?;
        self.release(request, LegKind::Reviewer, to, reviewer, ReleaseKind::Refund)?;

        info!(request = %request, to = %to, provider, reviewer, "Refunded outstanding escrow");
        Ok((provider, reviewer))
    }

    pub fn mark_remainder_claimed(&mut self, request: RequestId) -> Result<(), LedgerError> {
        let state = self
            .requests
            .get_mut(&request)
            .ok_or(LedgerError::UnknownRequest(request))?;
        state.remainder_claimed = true;
        Ok(())
    }

    fn ensure_funds(
        &self,
        from: &AccountId,
        provider: &EscrowLeg,
        reviewer: &EscrowLeg,
    ) -> Result<(), LedgerError> {
        let mut needs: Vec<(&TokenId, Amount)> = vec![(&provider.token, provider.total)];
        if reviewer.token == provider.token {
            needs[0].1 = provider
                .total
                .checked_add(reviewer.total)
                .ok_or_else(|| LedgerError::Overflow("escrow total".into()))?;
        } else {
            needs.push((&reviewer.token, reviewer.total));
        }

        for (token, required) in needs {
            let available = self.tokens.balance_of(token, from)?;
            if available < required {
                return Err(LedgerError::InsufficientBalance {
                    token: token.clone(),
                    account: from.clone(),
                    required,
                    available,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::InMemoryTokenLedger;

    fn pepe() -> TokenId {
        TokenId::new("PEPE")
    }

    fn usdc() -> TokenId {
        TokenId::new("USDC")
    }

    fn requester() -> AccountId {
        AccountId::new("requester")
    }

    fn escrow() -> AccountId {
        AccountId::new("market-escrow")
    }

    fn funded(pepe_amount: Amount, usdc_amount: Amount) -> PaymentLedger<InMemoryTokenLedger> {
        let mut tokens = InMemoryTokenLedger::new();
        tokens.mint(&pepe(), &requester(), pepe_amount).unwrap();
        tokens.mint(&usdc(), &requester(), usdc_amount).unwrap();
        PaymentLedger::new(tokens, escrow())
    }

    fn legs() -> (EscrowLeg, EscrowLeg) {
        (EscrowLeg::new(pepe(), 100), EscrowLeg::new(usdc(), 50))
    }

    #[test]
    fn escrow_pulls_both_legs() {
        let mut ledger = funded(100, 50);
        let (p, r) = legs();
        ledger.escrow(RequestId(1), &requester(), &p, &r).unwrap();

        assert_eq!(ledger.tokens().balance_of(&pepe(), &escrow()).unwrap(), 100);
        assert_eq!(ledger.tokens().balance_of(&usdc(), &escrow()).unwrap(), 50);
        let state = ledger.state(RequestId(1)).unwrap();
        assert_eq!(state.provider.outstanding(), 100);
        assert!(!state.remainder_claimed);
    }

    #[test]
    fn failed_escrow_leaves_balances_untouched() {
        let mut ledger = funded(100, 49);
        let (p, r) = legs();
        let err = ledger.escrow(RequestId(1), &requester(), &p, &r).unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(ledger.tokens().balance_of(&pepe(), &requester()).unwrap(), 100);
        assert_eq!(ledger.tokens().balance_of(&usdc(), &requester()).unwrap(), 49);
        assert!(ledger.state(RequestId(1)).is_none());
    }

    #[test]
    fn same_token_legs_need_combined_balance() {
        let mut ledger = funded(149, 0);
        let p = EscrowLeg::new(pepe(), 100);
        let r = EscrowLeg::new(pepe(), 50);
        assert!(ledger.escrow(RequestId(1), &requester(), &p, &r).is_err());
        assert_eq!(ledger.tokens().balance_of(&pepe(), &requester()).unwrap(), 149);
    }

    #[test]
    fn duplicate_escrow_rejected() {
        let mut ledger = funded(200, 100);
        let (p, r) = legs();
        ledger.escrow(RequestId(1), &requester(), &p, &r).unwrap();
        assert_eq!(
            ledger.escrow(RequestId(1), &requester(), &p, &r),
            Err(LedgerError::AlreadyEscrowed(RequestId(1)))
        );
    }

    #[test]
    fn release_never_exceeds_escrow() {
        let mut ledger = funded(100, 50);
        let (p, r) = legs();
        ledger.escrow(RequestId(1), &requester(), &p, &r).unwrap();
        let worker = AccountId::new("worker");

        ledger
            .release(RequestId(1), LegKind::Provider, &worker, 70, ReleaseKind::Claim)
            .unwrap();
        let err = ledger
            .release(RequestId(1), LegKind::Provider, &worker, 31, ReleaseKind::Claim)
            .unwrap_err();

        assert!(matches!(
            err,
            LedgerError::ReleaseExceedsEscrow {
                escrowed: 100,
                released: 70,
                requested: 31,
                ..
            }
        ));
        assert_eq!(ledger.tokens().balance_of(&pepe(), &worker).unwrap(), 70);
    }

    #[test]
    fn batch_release_is_all_or_nothing() {
        let mut ledger = funded(100, 50);
        let (p, r) = legs();
        ledger.escrow(RequestId(1), &requester(), &p, &r).unwrap();
        let a = AccountId::new("a");
        let b = AccountId::new("b");

        let err = ledger
            .release_batch(
                RequestId(1),
                LegKind::Reviewer,
                &[(a.clone(), 30), (b.clone(), 30)],
                ReleaseKind::Claim,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::ReleaseExceedsEscrow { .. }));
        assert_eq!(ledger.tokens().balance_of(&usdc(), &a).unwrap(), 0);

        ledger
            .release_batch(
                RequestId(1),
                LegKind::Reviewer,
                &[(a.clone(), 25), (b.clone(), 25)],
                ReleaseKind::Claim,
            )
            .unwrap();
        assert_eq!(ledger.state(RequestId(1)).unwrap().reviewer.claimed, 50);
    }

    #[test]
    fn refund_outstanding_conserves_legs() {
        let mut ledger = funded(100, 50);
        let (p, r) = legs();
        ledger.escrow(RequestId(1), &requester(), &p, &r).unwrap();
        ledger
            .release(RequestId(1), LegKind::Provider, &AccountId::new("w"), 40, ReleaseKind::Claim)
            .unwrap();

        let (provider, reviewer) = ledger.refund_outstanding(RequestId(1), &requester()).unwrap();
        assert_eq!((provider, reviewer), (60, 50));

        let state = ledger.state(RequestId(1)).unwrap();
        assert!(state.is_conserved());
        assert_eq!(ledger.tokens().balance_of(&pepe(), &escrow()).unwrap(), 0);
    }

    #[test]
    fn replace_escrow_swaps_terms() {
        let mut ledger = funded(300, 100);
        let (p, r) = legs();
        ledger.escrow(RequestId(1), &requester(), &p, &r).unwrap();

        let bigger = EscrowLeg::new(pepe(), 250);
        ledger
            .replace_escrow(RequestId(1), &requester(), &bigger, &r)
            .unwrap();

        assert_eq!(ledger.tokens().balance_of(&pepe(), &escrow()).unwrap(), 250);
        assert_eq!(ledger.tokens().balance_of(&pepe(), &requester()).unwrap(), 50);
        assert_eq!(ledger.state(RequestId(1)).unwrap().provider.escrowed, 250);
    }

    #[test]
    fn failed_replace_restores_old_escrow() {
        let mut ledger = funded(100, 50);
        let (p, r) = legs();
        ledger.escrow(RequestId(1), &requester(), &p, &r).unwrap();

        let too_big = EscrowLeg::new(pepe(), 101);
        assert!(ledger
            .replace_escrow(RequestId(1), &requester(), &too_big, &r)
            .is_err());

        assert_eq!(ledger.tokens().balance_of(&pepe(), &escrow()).unwrap(), 100);
        assert_eq!(ledger.tokens().balance_of(&usdc(), &escrow()).unwrap(), 50);
        let state = ledger.state(RequestId(1)).unwrap();
        assert_eq!(state.provider.escrowed, 100);
        assert_eq!(state.provider.refunded, 0);
    }
}
