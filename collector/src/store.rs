//! In-memory [`AddressStore`].

use {
    crate::{
        account::Address,
        error::StoreError,
        gateway::{AddressStore, FeeDeposit, PrivateKey},
    },
    parking_lot::RwLock,
    std::collections::{BTreeSet, HashMap},
};

#[derive(Debug, Default)]
struct Keys {
    pool: HashMap<String, BTreeSet<Address>>,
    private: HashMap<Address, PrivateKey>,
    fee_deposit: Option<FeeDeposit>,
}

/// Address book kept in process memory.
///
/// Suitable for embedding a pre-loaded key set and for tests. Keys can be
/// added while the store is shared.
#[derive(Debug, Default)]
pub struct MemoryAddressStore {
    keys: RwLock<Keys>,
}

impl MemoryAddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-time address for `symbol` together with its key.
    pub fn insert_pool_address(&self, symbol: &str, address: Address, key: PrivateKey) {
        let mut keys = self.keys.write();
        keys.pool
            .entry(symbol.to_string())
            .or_default()
            .insert(address.clone());
        keys.private.insert(address, key);
    }

    pub fn set_fee_deposit(&self, address: Address, key: PrivateKey) {
        let mut keys = self.keys.write();
        keys.private.insert(address.clone(), key.clone());
        keys.fee_deposit = Some(FeeDeposit { address, key });
    }
}

impl AddressStore for MemoryAddressStore {
    fn pool_addresses(&self, symbol: &str) -> Result<BTreeSet<Address>, StoreError> {
        Ok(self
            .keys
            .read()
            .pool
            .get(symbol)
            .cloned()
            .unwrap_or_default())
    }

    fn private_key(&self, address: &Address) -> Result<PrivateKey, StoreError> {
        self.keys
            .read()
            .private
            .get(address)
            .cloned()
            .ok_or_else(|| StoreError::UnknownAddress(address.clone()))
    }

    fn fee_deposit(&self) -> Result<FeeDeposit, StoreError> {
        self.keys
            .read()
            .fee_deposit
            .clone()
            .ok_or(StoreError::NoFeeDeposit)
    }
}
