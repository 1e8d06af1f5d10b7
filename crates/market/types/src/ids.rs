use serde::{Deserialize, Serialize};

/// Token amounts in the token's smallest unit.
pub type Amount = u128;

/// `amount` as a signed delta, saturating at `i128::MAX`.
pub fn signed(amount: Amount) -> i128 {
    i128::try_from(amount).unwrap_or(i128::MAX)
}

/// `before - after` as a signed delta, saturating at the `i128` bounds.
pub fn signed_change(before: Amount, after: Amount) -> i128 {
    if before >= after {
        signed(before - after)
    } else {
        -signed(after - before)
    }
}

/// Seconds on the externally supplied clock.
pub type Timestamp = u64;

/// Discrete time unit of the reputation decay schedule.
pub type Epoch = u64;

/// Identifies one labor market instance. Every table is scoped by it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(pub uuid::Uuid);

impl MarketId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for MarketId {
    fn default() -> Self {
        Self::new()
    }
}

/// A participant identity (requester, provider, reviewer, or an escrow holder).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// A fungible token, e.g. the provider-leg or reviewer-leg payment token.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

/// Monotonic, market-scoped request id. The first request is `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

/// Monotonic, market-scoped submission id. The first submission is `1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubmissionId(pub u64);

impl std::fmt::Display for MarketId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mkt:{}", self.0)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "req:{}", self.0)
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_id_uniqueness() {
        assert_ne!(MarketId::new(), MarketId::new());
    }

    #[test]
    fn display_formats() {
        assert!(format!("{}", MarketId::new()).starts_with("mkt:"));
        assert_eq!(format!("{}", RequestId(7)), "req:7");
        assert_eq!(format!("{}", SubmissionId(3)), "sub:3");
        assert_eq!(format!("{}", AccountId::new("alice")), "alice");
        assert_eq!(format!("{}", TokenId::new("USDC")), "USDC");
    }

    #[test]
    fn signed_deltas_saturate() {
        assert_eq!(signed(5), 5);
        assert_eq!(signed(Amount::MAX), i128::MAX);
        assert_eq!(signed_change(10, 4), 6);
        assert_eq!(signed_change(4, 10), -6);
        assert_eq!(signed_change(Amount::MAX, 0), i128::MAX);
        assert_eq!(signed_change(0, Amount::MAX), -i128::MAX);
    }

    #[test]
    fn ids_order_by_value() {
        assert!(RequestId(1) < RequestId(2));
        assert!(SubmissionId(9) < SubmissionId(10));
    }
}
