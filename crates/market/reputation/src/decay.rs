use labor_market_types::{Amount, Epoch};

use crate::types::{DecayConfig, ReputationAccount};

/// Decay owed by `account` at epoch `now`, and the epoch the account's
/// decay clock should move to once that decay is applied.
///
/// Only whole intervals count. Nothing accrues before the schedule starts
/// or while the account is frozen. An account that is empty, or that this
/// decay empties, re-anchors at `now`.
pub fn pending_decay(account: &ReputationAccount, config: Option<&DecayConfig>, now: Epoch) -> (Amount, Epoch) {
    let config = match config {
        Some(c) if c.is_active() => c,
        _ => return (0, account.last_decay_epoch),
    };
    if account.balance == 0 {
        return (0, now.max(account.last_decay_epoch));
    }
    if now < account.frozen_until_epoch {
        return (0, account.last_decay_epoch);
    }

    let from = account
        .last_decay_epoch
        .max(account.frozen_until_epoch)
        .max(config.start_epoch);
    if now < from {
        return (0, account.last_decay_epoch);
    }

    let intervals = (now - from) / config.interval;
    let owed = (intervals as Amount).saturating_mul(config.rate);
    if owed >= account.balance {
        // Decay empties the account, so it re-anchors like any empty one.
        return (account.balance, now);
    }
    (owed, from + intervals * config.interval)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(rate: Amount, interval: Epoch) -> DecayConfig {
        DecayConfig {
            rate,
            interval,
            start_epoch: 0,
        }
    }

    fn account(balance: Amount, last: Epoch, frozen: Epoch) -> ReputationAccount {
        ReputationAccount {
            balance,
            last_decay_epoch: last,
            frozen_until_epoch: frozen,
        }
    }

    #[test]
    fn whole_intervals_only() {
        let cfg = config(2, 10);
        assert_eq!(pending_decay(&account(100, 0, 0), Some(&cfg), 9), (0, 0));
        assert_eq!(pending_decay(&account(100, 0, 0), Some(&cfg), 10), (2, 10));
        assert_eq!(pending_decay(&account(100, 0, 0), Some(&cfg), 35), (6, 30));
    }

    #[test]
    fn decay_capped_at_balance() {
        let cfg = config(50, 1);
        assert_eq!(pending_decay(&account(30, 0, 0), Some(&cfg), 5), (30, 5));
    }

    #[test]
    fn exhausting_decay_reanchors_at_now() {
        let cfg = config(50, 10);
        // One interval would already empty the account; the clock restarts at 35.
        assert_eq!(pending_decay(&account(30, 0, 0), Some(&cfg), 35), (30, 35));
        let cfg = config(2, 10);
        assert_eq!(pending_decay(&account(6, 0, 0), Some(&cfg), 47), (6, 47));
        assert_eq!(pending_decay(&account(7, 0, 0), Some(&cfg), 37), (6, 30));
    }

    #[test]
    fn inactive_schedule_never_decays() {
        assert_eq!(pending_decay(&account(100, 3, 0), None, 1_000), (0, 3));
        assert_eq!(pending_decay(&account(100, 3, 0), Some(&config(0, 10)), 1_000), (0, 3));
        assert_eq!(pending_decay(&account(100, 3, 0), Some(&config(5, 0)), 1_000), (0, 3));
    }

    #[test]
    fn freeze_pauses_and_excludes_frozen_epochs() {
        let cfg = config(1, 10);
        // Frozen until 50: nothing at 49.
        assert_eq!(pending_decay(&account(100, 0, 50), Some(&cfg), 49), (0, 0));
        // Counting restarts at 50, not at 0.
        assert_eq!(pending_decay(&account(100, 0, 50), Some(&cfg), 59), (0, 50));
        assert_eq!(pending_decay(&account(100, 0, 50), Some(&cfg), 60), (1, 60));
    }

    #[test]
    fn start_epoch_delays_schedule() {
        let cfg = DecayConfig {
            rate: 1,
            interval: 5,
            start_epoch: 100,
        };
        assert_eq!(pending_decay(&account(10, 0, 0), Some(&cfg), 99), (0, 0));
        assert_eq!(pending_decay(&account(10, 0, 0), Some(&cfg), 110), (2, 110));
    }

    #[test]
    fn empty_account_reanchors() {
        assert_eq!(pending_decay(&account(0, 0, 0), Some(&config(1, 1)), 40), (0, 40));
    }

    proptest! {
        #[test]
        fn decay_is_bounded_and_monotonic(
            balance in 0u128..10_000,
            rate in 0u128..100,
            interval in 1u64..50,
            last in 0u64..500,
            frozen in 0u64..500,
            a in 0u64..2_000,
            b in 0u64..2_000,
        ) {
            let cfg = config(rate, interval);
            let acct = account(balance, last, frozen);
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (early, _) = pending_decay(&acct, Some(&cfg), lo);
            let (late, anchor) = pending_decay(&acct, Some(&cfg), hi);
            prop_assert!(late <= balance);
            prop_assert!(early <= late);
            prop_assert!(anchor <= hi.max(last));
        }
    }
}
