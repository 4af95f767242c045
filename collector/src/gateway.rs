//! Seams to the outside world: the chain node and the key store.
//!
//! Both are consumed, never implemented, by the collection engine. The node
//! is reached over the network and therefore async; the key store is a local
//! database lookup and stays synchronous.

use {
    crate::{
        account::Address,
        error::{GatewayError, StoreError},
    },
    async_trait::async_trait,
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::{collections::BTreeSet, fmt},
};

/// Identifier of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signing key material, hex encoded. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn expose_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// The address that pays for seeding, with its key.
#[derive(Debug, Clone)]
pub struct FeeDeposit {
    pub address: Address,
    pub key: PrivateKey,
}

/// Read and write access to the chain holding the pool.
///
/// Every call is a single blocking round trip from the engine's point of
/// view; call-level timeouts are reported as [`GatewayError::Timeout`].
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Token balance held by `address`, scaled by the token's decimals.
    async fn token_balance(&self, address: &Address) -> Result<Decimal, GatewayError>;

    /// Native currency balance. [`GatewayError::AccountNotFound`] when the
    /// address has never transacted.
    async fn native_balance(&self, address: &Address) -> Result<Decimal, GatewayError>;

    /// Free bandwidth consumed today. [`GatewayError::AccountNotFound`] when
    /// the address has never transacted.
    async fn bandwidth_used(&self, address: &Address) -> Result<u64, GatewayError>;

    /// Build, sign and broadcast a native transfer, then wait until the chain
    /// confirms it.
    async fn send_native_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Decimal,
        key: &PrivateKey,
    ) -> Result<TxId, GatewayError>;
}

/// Lookup of managed addresses and their keys.
pub trait AddressStore: Send + Sync {
    /// One-time pool addresses holding the token `symbol`.
    fn pool_addresses(&self, symbol: &str) -> Result<BTreeSet<Address>, StoreError>;

    fn private_key(&self, address: &Address) -> Result<PrivateKey, StoreError>;

    fn fee_deposit(&self) -> Result<FeeDeposit, StoreError>;
}
