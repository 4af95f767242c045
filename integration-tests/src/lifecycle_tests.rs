//! Full collection rounds: refresh, plan, estimate, seed.

use {
    crate::harness::{PoolHarness, FEE_DEPOSIT, SYMBOL},
    assert_matches::assert_matches,
    rust_decimal::Decimal,
    rust_decimal_macros::dec,
    tokenpool_collector::{Address, CollectorError, TransferReason},
    tokenpool_monitoring::prometheus,
};

// ═══════════════════════════════════════════════════════════════════════════
//  1. Single round
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_round_with_mixed_tiers() {
    let mut h = PoolHarness::default();
    h.deposit("TA", dec!(100), dec!(0))
        .deposit("TB", dec!(60), dec!(12))
        .deposit("TC", dec!(40), dec!(0))
        .deposit_unactivated("TD", dec!(25))
        .fund_fee_deposit(dec!(100));

    // 40 matches TC exactly; 125 drains TA and takes 25 from TB.
    let mut planner = h.plan(&[("X", dec!(40)), ("Y", dec!(125))]).await.unwrap();
    let plan = planner.planned().unwrap().clone();
    let steps: Vec<_> = plan
        .steps()
        .map(|s| (s.source.address.as_str(), s.destination.as_str(), s.amount, s.reason))
        .collect();
    assert_eq!(
        steps,
        vec![
            ("TC", "X", dec!(40), TransferReason::ExactMatch),
            ("TA", "Y", dec!(100), TransferReason::FullDrain),
            ("TB", "Y", dec!(25), TransferReason::Partial),
        ]
    );

    let estimate = planner.estimate_fee(&h.config.fee_schedule()).unwrap();
    assert_eq!(estimate.transfer_count, 3);
    assert_eq!(estimate.fee, dec!(33));

    let results = h.seed(&mut planner).await.unwrap();
    let seeded: Vec<_> = results
        .iter()
        .map(|r| (r.account.address.as_str(), r.amount, r.is_seeded()))
        .collect();
    // TB holds 12, over the threshold of 10.
    assert_eq!(seeded, vec![("TC", dec!(10), true), ("TA", dec!(10), true)]);
    assert_eq!(h.chain.native_of(FEE_DEPOSIT), Some(dec!(80)));

    let ledger = planner.into_ledger();
    assert_eq!(ledger.total_tokens(), dec!(60));
    assert_eq!(ledger.get(&Address::from("TD")).unwrap().token_balance, dec!(25));
}

#[tokio::test]
async fn test_whole_pool_sweep() {
    let mut h = PoolHarness::default();
    h.deposit("TA", dec!(10.5), dec!(10))
        .deposit("TB", dec!(4.25), dec!(10))
        .deposit("TC", dec!(0), dec!(0))
        .deposit_unactivated("TD", dec!(0.25));

    let planner = h.plan(&[("X", dec!(15))]).await.unwrap();
    let plan = planner.planned().unwrap();

    assert_eq!(plan.transfer_count(), 3);
    assert!(plan.steps().all(|s| s.reason == TransferReason::FullSweep));
    assert_eq!(planner.ledger().total_tokens(), Decimal::ZERO);
}

#[tokio::test]
async fn test_nothing_to_seed_without_fee_deposit() {
    let mut h = PoolHarness::default();
    h.deposit("TA", dec!(100), dec!(50));

    let mut planner = h.plan(&[("X", dec!(70))]).await.unwrap();
    // No fee deposit registered; the seeder must not need one.
    let results = h.seed(&mut planner).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn test_over_budget_batch_fails_before_any_allocation() {
    let mut h = PoolHarness::default();
    h.deposit("TA", dec!(50), dec!(0));

    assert_matches!(
        h.plan(&[("X", dec!(30)), ("Y", dec!(30))]).await,
        Err(CollectorError::InsufficientFunds { destination: None, .. })
    );
}

// ═══════════════════════════════════════════════════════════════════════════
//  2. Repeated rounds
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_second_round_after_transfers_land() {
    let mut h = PoolHarness::default();
    h.deposit("TA", dec!(100), dec!(10))
        .deposit("TB", dec!(60), dec!(10));

    let planner = h.plan(&[("X", dec!(100))]).await.unwrap();
    let plan = planner.planned().unwrap().clone();

    // The caller broadcasts the token transfers; mirror that on the chain.
    for step in plan.steps() {
        let remaining = step.source.token_balance.checked_sub(step.amount).unwrap();
        h.chain.set_tokens(step.source.address.as_str(), remaining);
    }

    let mut ledger = planner.into_ledger();
    ledger
        .refresh_from_store(&h.chain, &h.store, SYMBOL)
        .await
        .unwrap();
    assert_eq!(ledger.total_tokens(), dec!(60));
    assert_eq!(ledger.accounts()[0].address, Address::from("TB"));

    let mut planner = h.plan(&[("Y", dec!(60))]).await.unwrap();
    let plan = planner.plan().unwrap();
    assert_eq!(plan.transfer_count(), 1);
    assert_eq!(plan.groups()[0].steps[0].reason, TransferReason::ExactMatch);
}

#[tokio::test]
async fn test_metrics_follow_rounds() {
    let mut h = PoolHarness::default();
    h.deposit("TA", dec!(100), dec!(0))
        .deposit("TB", dec!(60), dec!(0))
        .fund_fee_deposit(dec!(1000));

    for _ in 0..2 {
        let mut planner = h.plan(&[("X", dec!(130))]).await.unwrap();
        h.seed(&mut planner).await.unwrap();
    }

    let snapshot = h.metrics.snapshot();
    assert_eq!(snapshot.counter("tokenpool_refreshes_total"), Some(2));
    assert_eq!(snapshot.counter("tokenpool_payouts_planned_total"), Some(2));
    assert_eq!(snapshot.counter("tokenpool_transfers_planned_total"), Some(4));
    // Second round: both sources were already topped up to the threshold.
    assert_eq!(snapshot.counter("tokenpool_seeds_confirmed_total"), Some(2));
    assert_eq!(snapshot.gauge("tokenpool_accounts_tracked"), Some(2));

    let text = prometheus::encode(&snapshot);
    assert!(text.contains("tokenpool_refresh_duration_ms_count 2"));
}
