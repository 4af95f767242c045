//! Property-based tests for payout planning.
//!
//! Properties tested:
//! 1. Every affordable batch plans, and each group sums to its request
//! 2. No step overdraws its source; snapshots track earlier debits
//! 3. Tokens are conserved between the ledger and the plan
//! 4. Over-budget batches fail before any allocation
//! 5. A balance equal to the request is used as a single exact match
//! 6. Requesting the whole pool drains every funded account once

#[cfg(test)]
mod tests {
    use {
        proptest::prelude::*,
        rust_decimal::Decimal,
        std::collections::HashMap,
        tokenpool_collector::{
            Account, AccountLedger, Address, CollectorConfig, CollectorError, PayoutPlanner,
            PayoutRequest, TransferReason,
        },
    };

    /// Balances are generated in cents to exercise fractional amounts.
    fn cents(value: u32) -> Decimal {
        Decimal::new(i64::from(value), 2)
    }

    fn ledger(balances: &[u32]) -> AccountLedger {
        AccountLedger::from_accounts(
            CollectorConfig::default(),
            balances
                .iter()
                .enumerate()
                .map(|(i, value)| Account::with_tokens(Address::new(format!("T{i:03}")), cents(*value)))
                .collect(),
        )
    }

    fn payouts(amounts: &[u32]) -> Vec<PayoutRequest> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, value)| PayoutRequest::new(format!("X{i}"), cents(*value)))
            .collect()
    }

    fn sum(values: &[u32]) -> Decimal {
        values.iter().map(|value| cents(*value)).sum()
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1-3. Affordable batches: group sums, no overdraft, conservation
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(1000))]

        #[test]
        fn affordable_batches_plan_consistently(
            balances in prop::collection::vec(0u32..10_000, 1..16),
            amounts in prop::collection::vec(1u32..4_000, 1..6),
        ) {
            let pool = sum(&balances);
            let requested = sum(&amounts);
            prop_assume!(requested <= pool);

            let ledger = ledger(&balances);
            let mut running: HashMap<Address, Decimal> = ledger
                .accounts()
                .iter()
                .map(|account| (account.address.clone(), account.token_balance))
                .collect();

            let mut planner = PayoutPlanner::new(ledger, payouts(&amounts)).unwrap();
            let plan = planner.plan().unwrap().clone();
            prop_assert_eq!(plan.groups().len(), amounts.len());

            for group in plan.groups() {
                // ── INVARIANT: a group pays exactly what was requested ──
                prop_assert_eq!(group.collected(), group.request.amount);

                for step in &group.steps {
                    let balance = running.get_mut(&step.source.address).unwrap();
                    // ── INVARIANT: the snapshot reflects every earlier debit ──
                    prop_assert_eq!(step.source.token_balance, *balance);
                    // ── INVARIANT: no step overdraws or moves nothing ──
                    prop_assert!(step.amount > Decimal::ZERO, "empty step {}", step);
                    prop_assert!(step.amount <= *balance, "overdraft in {}", step);
                    *balance -= step.amount;
                }
            }

            for account in planner.ledger().accounts() {
                prop_assert_eq!(account.token_balance, running[&account.address]);
                prop_assert!(account.token_balance >= Decimal::ZERO);
            }
            // ── INVARIANT: tokens are neither created nor lost ──
            prop_assert_eq!(planner.ledger().total_tokens(), pool - requested);
            prop_assert_eq!(plan.total_amount(), requested);

            // A second call returns the retained plan.
            prop_assert_eq!(planner.plan().unwrap(), &plan);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 4. Over-budget batches fail up front
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn over_budget_batches_fail_up_front(
            balances in prop::collection::vec(0u32..10_000, 0..16),
            extra in 1u32..1_000,
        ) {
            let pool = sum(&balances);
            let request = PayoutRequest::new("X", pool + cents(extra));

            let result = PayoutPlanner::new(ledger(&balances), vec![request]);

            let rejected = matches!(
                result,
                Err(CollectorError::InsufficientFunds { destination: None, available, .. }) if available == pool
            );
            prop_assert!(rejected, "over-budget batch accepted");
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 5. Exact match
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn single_matching_balance_is_one_transfer(
            balances in prop::collection::vec(1u32..10_000, 1..16),
            pick in any::<prop::sample::Index>(),
        ) {
            let amount = cents(balances[pick.index(balances.len())]);

            let mut planner =
                PayoutPlanner::new(ledger(&balances), vec![PayoutRequest::new("X", amount)]).unwrap();
            let plan = planner.plan().unwrap();

            prop_assert_eq!(plan.transfer_count(), 1);
            let step = &plan.groups()[0].steps[0];
            prop_assert_eq!(step.reason, TransferReason::ExactMatch);
            prop_assert_eq!(step.source.token_balance, amount);
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 6. Full sweep
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn whole_pool_request_drains_every_account(
            balances in prop::collection::vec(0u32..10_000, 2..16),
        ) {
            let funded = balances.iter().filter(|value| **value > 0).count();
            // With a single funded account the exact match tier wins.
            prop_assume!(funded >= 2);

            let mut planner =
                PayoutPlanner::new(ledger(&balances), vec![PayoutRequest::new("X", sum(&balances))]).unwrap();
            let plan = planner.plan().unwrap().clone();

            prop_assert_eq!(plan.transfer_count(), funded);
            prop_assert!(plan.steps().all(|step| step.reason == TransferReason::FullSweep));
            prop_assert!(plan.steps().all(|step| step.amount == step.source.token_balance));
            prop_assert_eq!(plan.source_accounts().len(), funded);
            prop_assert_eq!(planner.ledger().total_tokens(), Decimal::ZERO);
        }
    }
}
