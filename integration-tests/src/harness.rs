//! Token pool test harness
//!
//! Wires a [`MockChain`], a [`MemoryAddressStore`] and shared metrics into
//! one environment, so a test can describe a pool in a few lines and then
//! run refresh, planning and seeding against it exactly as a caller would.

use {
    rust_decimal::Decimal,
    std::sync::Arc,
    tokenpool_collector::{
        error::Result, test_utils::MockChain, AccountLedger, Address, CollectorConfig, FeeSeeder,
        MemoryAddressStore, PayoutPlanner, PayoutRequest, PrivateKey, SeedResult,
    },
    tokenpool_monitoring::CollectorMetrics,
};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Token symbol every harness pool is registered under.
pub const SYMBOL: &str = "USDT";

/// Address of the fee deposit.
pub const FEE_DEPOSIT: &str = "TFEEDEPOSIT";

// ─── Harness ─────────────────────────────────────────────────────────────────

pub struct PoolHarness {
    pub chain: MockChain,
    pub store: MemoryAddressStore,
    pub config: CollectorConfig,
    pub metrics: Arc<CollectorMetrics>,
    next_key: u32,
}

impl Default for PoolHarness {
    fn default() -> Self {
        Self::new(CollectorConfig::dev_default())
    }
}

impl PoolHarness {
    pub fn new(config: CollectorConfig) -> Self {
        tokenpool_logger::setup();
        Self {
            chain: MockChain::new(),
            store: MemoryAddressStore::new(),
            config,
            metrics: Arc::new(CollectorMetrics::new()),
            next_key: 0,
        }
    }

    pub fn with_chain(mut self, chain: MockChain) -> Self {
        self.chain = chain;
        self
    }

    /// Register a pool address that exists on chain.
    pub fn deposit(&mut self, address: &str, tokens: Decimal, native: Decimal) -> &mut Self {
        self.chain.add_account(address, tokens, native, 0);
        self.register(address);
        self
    }

    /// Register a pool address that received tokens but never transacted.
    pub fn deposit_unactivated(&mut self, address: &str, tokens: Decimal) -> &mut Self {
        self.chain.add_unactivated(address, tokens);
        self.register(address);
        self
    }

    pub fn fund_fee_deposit(&mut self, native: Decimal) -> &mut Self {
        self.chain.add_account(FEE_DEPOSIT, Decimal::ZERO, native, 0);
        self.store
            .set_fee_deposit(Address::from(FEE_DEPOSIT), PrivateKey::from_hex("fee0"));
        self
    }

    fn register(&mut self, address: &str) {
        let key = PrivateKey::from_hex(format!("{:064x}", self.next_key));
        self.next_key = self.next_key.wrapping_add(1);
        self.store
            .insert_pool_address(SYMBOL, Address::from(address), key);
    }

    /// A freshly refreshed ledger of the whole pool.
    pub async fn refresh(&self) -> Result<AccountLedger> {
        let mut ledger = AccountLedger::new(self.config.clone()).with_metrics(self.metrics.clone());
        ledger
            .refresh_from_store(&self.chain, &self.store, SYMBOL)
            .await?;
        Ok(ledger)
    }

    /// Refresh, then plan `payouts` over the result.
    pub async fn plan(&self, payouts: &[(&str, Decimal)]) -> Result<PayoutPlanner> {
        let ledger = self.refresh().await?;
        let payouts = payouts
            .iter()
            .map(|(destination, amount)| PayoutRequest::new(*destination, *amount))
            .collect();
        let mut planner = PayoutPlanner::new(ledger, payouts)?;
        planner.plan()?;
        Ok(planner)
    }

    pub fn seeder(&self) -> FeeSeeder {
        FeeSeeder::new(&self.config).with_metrics(self.metrics.clone())
    }

    /// Seed the sources of an already planned session.
    pub async fn seed(&self, planner: &mut PayoutPlanner) -> Result<Vec<SeedResult>> {
        let plan = planner.plan()?;
        self.seeder().seed(plan, &self.chain, &self.store).await
    }
}
