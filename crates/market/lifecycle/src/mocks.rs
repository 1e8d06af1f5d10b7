use std::collections::HashSet;

use labor_market_types::AccountId;

use crate::auth::{AuthorizationOracle, MarketAction};

/// Mock authorization oracle for testing.
///
/// Denies everything except explicitly allowed `(account, action)` pairs
/// and accounts allowed outright.
#[derive(Debug, Default)]
pub struct MockAuthorizationOracle {
    grants: HashSet<(AccountId, MarketAction)>,
    trusted: HashSet<AccountId>,
}

impl MockAuthorizationOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, account: AccountId, action: MarketAction) -> Self {
        self.grants.insert((account, action));
        self
    }

    pub fn allow_all(mut self, account: AccountId) -> Self {
        self.trusted.insert(account);
        self
    }
}

impl AuthorizationOracle for MockAuthorizationOracle {
    fn is_authorized(&self, account: &AccountId, action: MarketAction) -> bool {
        self.trusted.contains(account) || self.grants.contains(&(account.clone(), action))
    }
}
