//! Token pool integration tests
//!
//! Runs whole collection rounds against an in-process chain:
//!
//! 1. **Lifecycle**: refresh, plan, estimate and seed in sequence, and
//!    repeated rounds over the same pool
//! 2. **Refresh**: retries, retry exhaustion, never-used addresses and
//!    bounded fan-out on large pools
//! 3. **Seeding**: partial transfer failures and short fee deposits

pub mod harness;

#[cfg(test)]
mod lifecycle_tests;
