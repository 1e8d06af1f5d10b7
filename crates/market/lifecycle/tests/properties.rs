//! Randomized lifecycles: conservation, capacity and remainder idempotence
//! hold whatever participants do.

mod common;

use common::*;
use labor_market_types::{Amount, EnforcementConfig, EnforcementKind, SubmissionId};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Scenario {
    kind: EnforcementKind,
    provider_total: Amount,
    reviewer_total: Amount,
    provider_limit: u64,
    reviewer_limit: u64,
    providers: u32,
    /// Review slots each reviewer asks for.
    reviewers: Vec<u64>,
    /// `(reviewer, submission, score)`, indices taken modulo what exists.
    scores: Vec<(usize, usize, u64)>,
}

fn curve_for(kind: EnforcementKind) -> EnforcementConfig {
    match kind {
        EnforcementKind::ConstantThreshold => pass_fail(),
        EnforcementKind::ScalableCurve => EnforcementConfig::new(100, vec![0, 50, 100], vec![0, 10, 30]),
        EnforcementKind::DynamicBucket => two_buckets(),
    }
}

fn kind_strategy() -> impl Strategy<Value = EnforcementKind> {
    prop_oneof![
        Just(EnforcementKind::ConstantThreshold),
        Just(EnforcementKind::ScalableCurve),
        Just(EnforcementKind::DynamicBucket),
    ]
}

prop_compose! {
    fn scenario()(
        kind in kind_strategy(),
        provider_total in 1u128..100_000,
        reviewer_total in 1u128..10_000,
        provider_limit in 1u64..5,
        reviewer_limit in 1u64..8,
        providers in 0u32..7,
        reviewers in proptest::collection::vec(1u64..4, 0..5),
        scores in proptest::collection::vec((0usize..5, 0usize..7, 0u64..=100), 0..20),
    ) -> Scenario {
        Scenario {
            kind,
            provider_total,
            reviewer_total,
            provider_limit,
            reviewer_limit,
            providers,
            reviewers,
            scores,
        }
    }
}

/// Drive a scenario to settlement, ignoring rejected calls and checking the
/// slot invariant after each one.
fn run(s: &Scenario) -> Result<(Harness, Vec<SubmissionId>), TestCaseError> {
    let mut h = Harness::new(s.kind, curve_for(s.kind));
    let request = h.open_request(request_config(
        s.provider_total,
        s.reviewer_total,
        s.provider_limit,
        s.reviewer_limit,
    ));
    let within = |h: &Harness| {
        h.market
            .signal_state(request)
            .map(|state| state.within(s.provider_limit, s.reviewer_limit))
            .unwrap_or(false)
    };

    for (i, quantity) in s.reviewers.iter().enumerate() {
        let _ = h.market.signal_review(&reviewer(i as u32), request, *quantity);
        prop_assert!(within(&h));
    }

    h.at(SIGNAL_EXPIRY);
    let mut submissions = Vec::new();
    for p in 0..s.providers {
        if h.market.signal(&provider(p), request).is_ok() {
            submissions.push(h.market.provide(&provider(p), request, "work").unwrap());
        }
        prop_assert!(within(&h));
    }

    h.at(SUBMISSION_EXPIRY);
    if !submissions.is_empty() && !s.reviewers.is_empty() {
        for (r, sub, score) in &s.scores {
            let who = reviewer((r % s.reviewers.len()) as u32);
            let target = submissions[sub % submissions.len()];
            let _ = h.market.review(&who, request, target, *score, "review");
            prop_assert!(within(&h));
        }
    }

    h.settle();
    Ok((h, submissions))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn escrow_is_conserved(s in scenario()) {
        let (mut h, submissions) = run(&s)?;
        let request = labor_market_types::RequestId(1);

        let mut provider_claims: Amount = 0;
        let mut reviewer_claims: Amount = 0;
        for submission in &submissions {
            if let Ok(receipt) = h.market.claim(&requester(), request, *submission) {
                provider_claims += receipt.provider_paid;
                reviewer_claims += receipt.reviewer_total();
            }
        }
        let (provider_rest, reviewer_rest) = h.market.claim_remainder(&requester(), request).unwrap();

        prop_assert_eq!(provider_claims + provider_rest, s.provider_total);
        prop_assert_eq!(reviewer_claims + reviewer_rest, s.reviewer_total);
        prop_assert_eq!(h.escrowed(), (0, 0));
        prop_assert!(h.market.payment_state(request).unwrap().is_conserved());
    }

    #[test]
    fn claims_never_double_pay(s in scenario()) {
        let (mut h, submissions) = run(&s)?;
        let request = labor_market_types::RequestId(1);
        for submission in &submissions {
            let _ = h.market.claim(&requester(), request, *submission);
        }
        let escrowed = h.escrowed();
        for submission in &submissions {
            prop_assert!(h.market.claim(&requester(), request, *submission).is_err());
        }
        prop_assert_eq!(h.escrowed(), escrowed);
    }

    #[test]
    fn remainder_is_idempotent(s in scenario(), repeats in 1usize..4) {
        let (mut h, _) = run(&s)?;
        let request = labor_market_types::RequestId(1);
        let first = h.market.claim_remainder(&requester(), request).unwrap();
        let balances = (h.usdc_of(&requester()), h.dai_of(&requester()));
        prop_assert_eq!(balances, first);
        for _ in 0..repeats {
            prop_assert_eq!(h.market.claim_remainder(&requester(), request).unwrap(), (0, 0));
        }
        prop_assert_eq!((h.usdc_of(&requester()), h.dai_of(&requester())), balances);
    }
}
