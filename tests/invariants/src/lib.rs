//! Token pool property-based invariant tests
//!
//! Uses proptest to verify planning invariants over random pools and
//! payout lists:
//! - Allocation correctness (group sums, no overdraft, conservation)
//! - Tier selection (exact match, full sweep)
//! - Fee estimation
//! - Fee seeding targets

pub mod fee_invariants;
pub mod planner_invariants;
