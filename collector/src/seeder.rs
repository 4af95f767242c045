//! Tops up source accounts that can not pay for their own transfers.

use {
    crate::{
        account::{Account, Plan},
        config::CollectorConfig,
        error::{CollectorError, GatewayError, Result, SeedFailure},
        gateway::{AddressStore, ChainGateway, FeeDeposit, TxId},
    },
    futures::{stream, StreamExt},
    log::{debug, error, info},
    rust_decimal::Decimal,
    std::sync::Arc,
    tokenpool_monitoring::CollectorMetrics,
};

/// An under-funded source account and the native amount it is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTarget {
    /// Snapshot of the source as the plan first drew on it.
    pub account: Account,
    pub shortfall: Decimal,
}

/// Outcome of seeding a single account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedResult {
    pub account: Account,
    pub amount: Decimal,
    pub outcome: std::result::Result<TxId, SeedFailure>,
}

impl SeedResult {
    pub fn is_seeded(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn tx_id(&self) -> Option<&TxId> {
        self.outcome.as_ref().ok()
    }
}

#[derive(Debug)]
pub struct FeeSeeder {
    fee_threshold: Decimal,
    max_workers: usize,
    metrics: Option<Arc<CollectorMetrics>>,
}

impl FeeSeeder {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            fee_threshold: config.fee_threshold,
            max_workers: config.max_workers,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<CollectorMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Distinct sources of `plan` holding less than the fee threshold, in
    /// plan order.
    pub fn seed_targets(&self, plan: &Plan) -> Result<Vec<SeedTarget>> {
        plan.source_accounts()
            .into_iter()
            .filter(|account| account.native_balance < self.fee_threshold)
            .map(|account| {
                let shortfall = self
                    .fee_threshold
                    .checked_sub(account.native_balance)
                    .ok_or(CollectorError::Overflow("computing seed shortfall"))?;
                Ok(SeedTarget {
                    account: account.clone(),
                    shortfall,
                })
            })
            .collect()
    }

    /// Send every under-funded source its shortfall from the fee deposit.
    ///
    /// Nothing is sent unless the deposit covers all shortfalls. Failures of
    /// single transfers are reported in the returned list, in plan order.
    pub async fn seed<G, S>(&self, plan: &Plan, gateway: &G, store: &S) -> Result<Vec<SeedResult>>
    where
        G: ChainGateway + ?Sized,
        S: AddressStore + ?Sized,
    {
        let targets = self.seed_targets(plan)?;
        if targets.is_empty() {
            debug!("every source holds at least {}, nothing to seed", self.fee_threshold);
            return Ok(Vec::new());
        }
        let required = targets.iter().try_fold(Decimal::ZERO, |acc, target| {
            acc.checked_add(target.shortfall)
                .ok_or(CollectorError::Overflow("summing seed shortfalls"))
        })?;

        let deposit = store.fee_deposit()?;
        let available = match gateway.native_balance(&deposit.address).await {
            Ok(balance) => balance,
            Err(GatewayError::AccountNotFound(_)) => Decimal::ZERO,
            Err(source) => {
                return Err(CollectorError::Gateway {
                    address: deposit.address,
                    source,
                })
            }
        };
        if available < required {
            return Err(CollectorError::InsufficientSeedFunds {
                address: deposit.address,
                available,
                required,
            });
        }
        info!(
            "seeding {} accounts with {required} from {} (holds {available})",
            targets.len(),
            deposit.address
        );

        let deposit = &deposit;
        let mut results: Vec<(usize, SeedResult)> = stream::iter(targets.into_iter().enumerate())
            .map(|(index, target)| async move { (index, self.seed_one(gateway, deposit, target).await) })
            .buffer_unordered(self.max_workers.max(1))
            .collect()
            .await;
        results.sort_by_key(|(index, _)| *index);
        Ok(results.into_iter().map(|(_, result)| result).collect())
    }

    async fn seed_one<G>(&self, gateway: &G, deposit: &FeeDeposit, target: SeedTarget) -> SeedResult
    where
        G: ChainGateway + ?Sized,
    {
        let SeedTarget { account, shortfall } = target;
        let address = &account.address;
        let outcome = gateway
            .send_native_transfer(&deposit.address, address, shortfall, &deposit.key)
            .await
            .map_err(|source| SeedFailure {
                address: address.clone(),
                amount: shortfall,
                source,
            });

        match &outcome {
            Ok(tx_id) => {
                info!("Seed {shortfall} -> {address} | {tx_id}");
                if let Some(metrics) = &self.metrics {
                    metrics.seeds_confirmed.inc();
                }
            }
            Err(failure) => {
                error!("{failure}");
                if let Some(metrics) = &self.metrics {
                    metrics.seeds_failed.inc();
                }
            }
        }
        SeedResult {
            account,
            amount: shortfall,
            outcome,
        }
    }
}
