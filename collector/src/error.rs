//! Error types for the collection engine and its collaborators.

use {crate::account::Address, rust_decimal::Decimal, thiserror::Error};

/// Errors that abort a ledger refresh, a planning session or a seeding batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollectorError {
    /// A payout request carries a zero or negative amount.
    #[error("invalid amount for payout to {destination}: {amount}")]
    InvalidAmount { destination: Address, amount: Decimal },

    /// The payout list requests nothing (empty list or zero total).
    #[error("payout amount can not be 0 (requested total {requested})")]
    EmptyPayout { requested: Decimal },

    /// Not enough tokens to satisfy the request.
    ///
    /// Raised at construction for the whole batch (`destination` is `None`)
    /// and during planning when the pool ran dry for a single request.
    #[error("not enough tokens to complete payout: need {requested}, has {available}")]
    InsufficientFunds {
        destination: Option<Address>,
        requested: Decimal,
        available: Decimal,
    },

    /// The greedy collector took more than requested. Indicates a logic bug.
    #[error(
        "collected too much for payout to {destination}: requested {requested}, \
         collected {collected} over {steps} transfers"
    )]
    AllocationOverrun {
        destination: Address,
        requested: Decimal,
        collected: Decimal,
        steps: usize,
    },

    /// An address kept failing transiently until the attempt cap was hit.
    #[error("refresh of {address} failed after {attempts} attempts: {source}")]
    RefreshExhausted {
        address: Address,
        attempts: u32,
        #[source]
        source: GatewayError,
    },

    /// A non-retryable gateway failure for a specific address.
    #[error("gateway error for {address}: {source}")]
    Gateway {
        address: Address,
        #[source]
        source: GatewayError,
    },

    /// The fee-deposit address can not cover every shortfall of the plan.
    #[error(
        "fee deposit {address} has not enough currency: has {available}, need {required}"
    )]
    InsufficientSeedFunds {
        address: Address,
        available: Decimal,
        required: Decimal,
    },

    /// The address store could not answer a lookup.
    #[error("address store error: {0}")]
    Store(#[from] StoreError),

    /// The configuration is invalid (e.g. zero workers).
    #[error("invalid collector configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Decimal arithmetic left the representable range.
    #[error("decimal overflow while {0}")]
    Overflow(&'static str),
}

/// Failures reported by a [`crate::gateway::ChainGateway`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The address has never transacted, so the chain has no record of it.
    #[error("account not found: {0}")]
    AccountNotFound(Address),

    /// Node hiccup, rate limit, dropped connection. Safe to retry.
    #[error("transient node error: {0}")]
    Transient(String),

    /// A call did not complete within the gateway's own deadline.
    #[error("call timed out after {0}ms")]
    Timeout(u64),

    /// The node refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The transaction could not be built or signed.
    #[error("signing failed: {0}")]
    Signing(String),
}

impl GatewayError {
    /// Whether the failed call may be retried as-is.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Timeout(_))
    }
}

/// Failures reported by a [`crate::gateway::AddressStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("no private key stored for {0}")]
    UnknownAddress(Address),

    #[error("no fee deposit address configured")]
    NoFeeDeposit,

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// A single address that could not be seeded. Recorded, never raised.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("seeding {amount} to {address} failed: {source}")]
pub struct SeedFailure {
    pub address: Address,
    pub amount: Decimal,
    #[source]
    pub source: GatewayError,
}

/// Convenience result type for collection operations.
pub type Result<T> = std::result::Result<T, CollectorError>;
