//! # Token pool collector
//!
//! Plans how to pay out tokens from a pool of one-time deposit addresses.
//!
//! Deposits land on single-use addresses, so any payout has to be collected
//! from many small balances. The engine works in three phases:
//!
//! 1. [`AccountLedger::refresh`] fetches token balance, native balance and
//!    free bandwidth of every pool address over a bounded worker pool.
//! 2. [`PayoutPlanner`] turns an ordered payout list into transfer groups,
//!    preferring a single exact match, then a full sweep, then greedy
//!    accumulation. [`fee::estimate`] prices the result.
//! 3. [`FeeSeeder`] tops up every source address that can not pay for its
//!    own transfer from the fee-deposit address.
//!
//! Signing and broadcasting token transfers is left to the caller.
//!
//! ## Quick start
//!
//! ```rust
//! use {
//!     rust_decimal::Decimal,
//!     tokenpool_collector::{Account, AccountLedger, Address, CollectorConfig, PayoutPlanner, PayoutRequest},
//! };
//!
//! let config = CollectorConfig::default();
//! let ledger = AccountLedger::from_accounts(
//!     config.clone(),
//!     vec![
//!         Account::with_tokens(Address::from("TA"), Decimal::from(100)),
//!         Account::with_tokens(Address::from("TB"), Decimal::from(60)),
//!     ],
//! );
//!
//! let mut planner =
//!     PayoutPlanner::new(ledger, vec![PayoutRequest::new("TX", Decimal::from(130))]).unwrap();
//! let plan = planner.plan().unwrap();
//! assert_eq!(plan.transfer_count(), 2);
//!
//! let estimate = planner.estimate_fee(&config.fee_schedule()).unwrap();
//! assert_eq!(estimate.fee, Decimal::from(64));
//! ```

pub mod account;
pub mod config;
pub mod error;
pub mod fee;
pub mod gateway;
pub mod ledger;
pub mod planner;
pub mod seeder;
pub mod store;
#[cfg(any(test, feature = "dev-context-only-utils"))]
pub mod test_utils;


// Re-exports for convenience.
pub use {
    account::{Account, Address, PayoutRequest, Plan, TransferGroup, TransferReason, TransferStep},
    config::CollectorConfig,
    error::{CollectorError, GatewayError, SeedFailure, StoreError},
    fee::{FeeEstimate, FeeSchedule},
    gateway::{AddressStore, ChainGateway, FeeDeposit, PrivateKey, TxId},
    ledger::AccountLedger,
    planner::PayoutPlanner,
    seeder::{FeeSeeder, SeedResult, SeedTarget},
    store::MemoryAddressStore,
};
