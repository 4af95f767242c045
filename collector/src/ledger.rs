//! Snapshot of every pool address and its balances.
//!
//! A refresh fans out one fetch per address over a bounded worker pool and
//! only replaces the snapshot once every address resolved. Until then the
//! previous snapshot stays in place, so a failed refresh never exposes a
//! partial ledger.

use {
    crate::{
        account::{Account, Address},
        config::CollectorConfig,
        error::{CollectorError, GatewayError, Result},
        gateway::{AddressStore, ChainGateway},
    },
    futures::{stream, StreamExt, TryStreamExt},
    log::{debug, error, info, warn},
    rust_decimal::Decimal,
    std::{
        collections::BTreeSet,
        sync::Arc,
        time::{Duration, Instant},
    },
    tokenpool_monitoring::CollectorMetrics,
};

/// Balances of all pool addresses, sorted by token balance descending.
#[derive(Debug, Clone)]
pub struct AccountLedger {
    accounts: Vec<Account>,
    config: CollectorConfig,
    last_refresh_duration: Option<Duration>,
    metrics: Option<Arc<CollectorMetrics>>,
}

impl AccountLedger {
    /// An empty ledger. Call [`Self::refresh`] to populate it.
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            accounts: Vec::new(),
            config,
            last_refresh_duration: None,
            metrics: None,
        }
    }

    /// A ledger over an already known snapshot.
    pub fn from_accounts(config: CollectorConfig, mut accounts: Vec<Account>) -> Self {
        sort_accounts(&mut accounts);
        Self {
            accounts,
            ..Self::new(config)
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<CollectorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub(crate) fn metrics(&self) -> Option<&CollectorMetrics> {
        self.metrics.as_deref()
    }

    /// Fetch balances for `addresses` and replace the snapshot.
    ///
    /// Fails as a whole if any address can not be fetched; the previous
    /// snapshot is kept in that case.
    pub async fn refresh<G>(&mut self, gateway: &G, addresses: &BTreeSet<Address>) -> Result<&[Account]>
    where
        G: ChainGateway + ?Sized,
    {
        let start = Instant::now();
        let config = &self.config;
        let metrics = self.metrics.as_deref();

        let fetched = stream::iter(addresses)
            .map(|address| fetch_account(gateway, address, config, metrics))
            .buffer_unordered(config.max_workers.max(1))
            .try_collect::<Vec<_>>()
            .await;

        let mut accounts = match fetched {
            Ok(accounts) => accounts,
            Err(err) => {
                error!("ledger refresh aborted: {err}");
                if let Some(metrics) = metrics {
                    metrics.refresh_failures.inc();
                }
                return Err(err);
            }
        };
        sort_accounts(&mut accounts);

        let elapsed = start.elapsed();
        self.accounts = accounts;
        self.last_refresh_duration = Some(elapsed);

        let funded = self.accounts_with_tokens().count();
        info!(
            "refreshed {} accounts in {:?}: {} tokens held by {} of them",
            self.accounts.len(),
            elapsed,
            self.total_tokens(),
            funded
        );
        if let Some(metrics) = self.metrics.as_deref() {
            metrics.refreshes.inc();
            metrics
                .refresh_duration_ms
                .observe(elapsed.as_secs_f64() * 1_000.0);
            metrics.accounts_tracked.set(to_gauge(self.accounts.len()));
            metrics.accounts_funded.set(to_gauge(funded));
        }
        Ok(&self.accounts)
    }

    /// Refresh the pool addresses the store holds for `symbol`.
    pub async fn refresh_from_store<G, S>(
        &mut self,
        gateway: &G,
        store: &S,
        symbol: &str,
    ) -> Result<&[Account]>
    where
        G: ChainGateway + ?Sized,
        S: AddressStore + ?Sized,
    {
        let addresses = store.pool_addresses(symbol)?;
        debug!("refreshing {} {symbol} pool addresses", addresses.len());
        self.refresh(gateway, &addresses).await
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn get(&self, address: &Address) -> Option<&Account> {
        self.accounts.iter().find(|account| &account.address == address)
    }

    /// How long the last successful refresh took.
    pub fn last_refresh_duration(&self) -> Option<Duration> {
        self.last_refresh_duration
    }

    /// Tokens held across the pool, capped at [`Decimal::MAX`]. Planning
    /// sums balances with overflow checks instead.
    pub fn total_tokens(&self) -> Decimal {
        self.accounts
            .iter()
            .fold(Decimal::ZERO, |acc, account| acc.saturating_add(account.token_balance))
    }

    pub fn accounts_with_tokens(&self) -> impl Iterator<Item = &Account> {
        self.accounts.iter().filter(|account| account.has_tokens())
    }

    pub fn accounts_without_tokens(&self) -> impl Iterator<Item = &Account> {
        self.accounts
            .iter()
            .filter(|account| account.token_balance.is_zero())
    }

    pub fn accounts_with_native(&self) -> impl Iterator<Item = &Account> {
        self.accounts
            .iter()
            .filter(|account| account.native_balance > Decimal::ZERO)
    }

    pub fn accounts_with_bandwidth(&self) -> impl Iterator<Item = &Account> {
        self.accounts
            .iter()
            .filter(|account| account.bandwidth_remaining > 0)
    }

    /// Swap in balances computed by a planning session.
    pub(crate) fn commit(&mut self, accounts: Vec<Account>) {
        debug_assert_eq!(accounts.len(), self.accounts.len());
        self.accounts = accounts;
    }
}

/// Highest token balance first; address breaks ties so the order is stable
/// across refreshes.
fn sort_accounts(accounts: &mut [Account]) {
    accounts.sort_by(|a, b| {
        b.token_balance
            .cmp(&a.token_balance)
            .then_with(|| a.address.cmp(&b.address))
    });
}

fn to_gauge(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// Fetch one address, retrying transient failures up to `max_retries`
/// attempts in total.
async fn fetch_account<G>(
    gateway: &G,
    address: &Address,
    config: &CollectorConfig,
    metrics: Option<&CollectorMetrics>,
) -> Result<Account>
where
    G: ChainGateway + ?Sized,
{
    let mut attempts = 0u32;
    loop {
        attempts = attempts.saturating_add(1);
        match fetch_once(gateway, address, config.bandwidth_limit).await {
            Ok(account) => {
                info!("{} -> {}", address, account.token_balance);
                return Ok(account);
            }
            Err(source) if source.is_transient() => {
                warn!(
                    "error during {address} refresh (attempt {attempts}/{}): {source}",
                    config.max_retries
                );
                if attempts >= config.max_retries {
                    return Err(CollectorError::RefreshExhausted {
                        address: address.clone(),
                        attempts,
                        source,
                    });
                }
                if let Some(metrics) = metrics {
                    metrics.refresh_retries.inc();
                }
                if config.retry_delay_ms > 0 {
                    tokio::time::sleep(config.retry_delay()).await;
                }
            }
            Err(source) => {
                return Err(CollectorError::Gateway {
                    address: address.clone(),
                    source,
                });
            }
        }
    }
}

async fn fetch_once<G>(
    gateway: &G,
    address: &Address,
    bandwidth_limit: u64,
) -> std::result::Result<Account, GatewayError>
where
    G: ChainGateway + ?Sized,
{
    let (token_balance, native_state) = futures::join!(
        gateway.token_balance(address),
        native_state(gateway, address, bandwidth_limit),
    );
    let token_balance = token_balance?;

    // Never-used addresses are unknown to the chain: nothing to spend yet.
    let (native_balance, bandwidth_remaining) = match native_state {
        Ok(state) => state,
        Err(GatewayError::AccountNotFound(_)) => (Decimal::ZERO, 0),
        Err(err) => return Err(err),
    };

    Ok(Account {
        address: address.clone(),
        token_balance,
        native_balance,
        bandwidth_remaining,
    })
}

async fn native_state<G>(
    gateway: &G,
    address: &Address,
    bandwidth_limit: u64,
) -> std::result::Result<(Decimal, u64), GatewayError>
where
    G: ChainGateway + ?Sized,
{
    let native_balance = gateway.native_balance(address).await?;
    let bandwidth_used = gateway.bandwidth_used(address).await?;
    Ok((native_balance, bandwidth_limit.saturating_sub(bandwidth_used)))
}
