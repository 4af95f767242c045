//! Property-based tests for fee estimation and seeding targets.
//!
//! Properties tested:
//! 1. fee == transfers × (per_transfer_fee + activation_fee)
//! 2. Seed targets are exactly the distinct sources below the threshold
//! 3. Each target is short by threshold − native balance, never by zero

#[cfg(test)]
mod tests {
    use {
        proptest::prelude::*,
        rust_decimal::Decimal,
        std::collections::HashSet,
        tokenpool_collector::{
            Account, AccountLedger, Address, CollectorConfig, FeeSchedule, FeeSeeder,
            PayoutPlanner, PayoutRequest,
        },
    };

    fn cents(value: u32) -> Decimal {
        Decimal::new(i64::from(value), 2)
    }

    /// `(tokens, native)` pairs in cents.
    fn ledger(config: &CollectorConfig, accounts: &[(u32, u32)]) -> AccountLedger {
        AccountLedger::from_accounts(
            config.clone(),
            accounts
                .iter()
                .enumerate()
                .map(|(i, (tokens, native))| Account {
                    address: Address::new(format!("T{i:03}")),
                    token_balance: cents(*tokens),
                    native_balance: cents(*native),
                    bandwidth_remaining: 0,
                })
                .collect(),
        )
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 1. Fee formula
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn fee_is_linear_in_transfer_count(
            balances in prop::collection::vec(0u32..10_000, 1..16),
            amounts in prop::collection::vec(1u32..4_000, 1..6),
            per_transfer in 0u32..10_000,
            activation in 0u32..1_000,
        ) {
            let config = CollectorConfig::default();
            let accounts: Vec<_> = balances.iter().map(|b| (*b, 0)).collect();
            let pool: Decimal = balances.iter().map(|b| cents(*b)).sum();
            let requested: Decimal = amounts.iter().map(|a| cents(*a)).sum();
            prop_assume!(requested <= pool);

            let payouts = amounts
                .iter()
                .enumerate()
                .map(|(i, a)| PayoutRequest::new(format!("X{i}"), cents(*a)))
                .collect();
            let mut planner = PayoutPlanner::new(ledger(&config, &accounts), payouts).unwrap();
            let schedule = FeeSchedule {
                per_transfer_fee: cents(per_transfer),
                activation_fee: cents(activation),
            };

            let estimate = planner.estimate_fee(&schedule).unwrap();

            let transfers = planner.planned().unwrap().transfer_count();
            prop_assert_eq!(estimate.transfer_count, transfers);
            prop_assert_eq!(
                estimate.fee,
                Decimal::from(transfers) * (schedule.per_transfer_fee + schedule.activation_fee)
            );
            // Every request needs at least one transfer.
            prop_assert!(transfers >= amounts.len());
        }
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 2-3. Seed targets
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(500))]

        #[test]
        fn seed_targets_are_the_underfunded_sources(
            accounts in prop::collection::vec((0u32..10_000, 0u32..6_000), 1..16),
            amounts in prop::collection::vec(1u32..6_000, 1..4),
            threshold in 0u32..5_000,
        ) {
            let config = CollectorConfig {
                fee_threshold: cents(threshold),
                ..CollectorConfig::default()
            };
            let pool: Decimal = accounts.iter().map(|(tokens, _)| cents(*tokens)).sum();
            let requested: Decimal = amounts.iter().map(|a| cents(*a)).sum();
            prop_assume!(requested <= pool);

            let payouts = amounts
                .iter()
                .enumerate()
                .map(|(i, a)| PayoutRequest::new(format!("X{i}"), cents(*a)))
                .collect();
            let mut planner = PayoutPlanner::new(ledger(&config, &accounts), payouts).unwrap();
            let plan = planner.plan().unwrap();

            let targets = FeeSeeder::new(&config).seed_targets(plan).unwrap();

            // ── INVARIANT: one target per address ──
            let unique: HashSet<_> = targets.iter().map(|t| &t.account.address).collect();
            prop_assert_eq!(unique.len(), targets.len());

            for source in plan.source_accounts() {
                let target = targets.iter().find(|t| t.account.address == source.address);
                if source.native_balance < config.fee_threshold {
                    // ── INVARIANT: shortfall tops up exactly to the threshold ──
                    let target = target.unwrap();
                    prop_assert_eq!(target.shortfall, config.fee_threshold - source.native_balance);
                    prop_assert!(target.shortfall > Decimal::ZERO);
                } else {
                    // ── INVARIANT: funded sources are never seeded ──
                    prop_assert!(target.is_none(), "{} already holds enough", source.address);
                }
            }
            prop_assert!(targets.len() <= plan.source_accounts().len());
        }
    }
}
