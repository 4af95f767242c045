use {
    crate::{
        error::{CollectorError, Result},
        fee::FeeSchedule,
    },
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::{fs, path::Path, time::Duration},
};

/// Tunables shared by the ledger refresh, the fee estimator and the seeder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Width of the worker pool used for balance fetches and seeding.
    pub max_workers: usize,

    /// Attempts per address before a refresh gives up on it.
    pub max_retries: u32,

    /// Pause between two attempts for the same address (ms).
    /// 0 retries immediately.
    pub retry_delay_ms: u64,

    /// Free daily bandwidth an address gets from the chain.
    pub bandwidth_limit: u64,

    /// Native currency burnt by one token transfer.
    pub per_transfer_fee: Decimal,

    /// Surcharge in case the destination does not exist on chain yet.
    pub activation_fee: Decimal,

    /// Native balance a source address must hold before it can send.
    pub fee_threshold: Decimal,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_workers: 10,
            max_retries: 5,
            retry_delay_ms: 0,
            bandwidth_limit: 1_500,
            per_transfer_fee: Decimal::from(30),
            activation_fee: Decimal::from(2),
            fee_threshold: Decimal::from(30),
        }
    }
}

impl CollectorConfig {
    /// Small pool and a short retry budget, for tests.
    #[cfg(any(test, feature = "dev-context-only-utils"))]
    pub fn dev_default() -> Self {
        Self {
            max_workers: 4,
            max_retries: 3,
            retry_delay_ms: 0,
            bandwidth_limit: 1_500,
            per_transfer_fee: Decimal::from(10),
            activation_fee: Decimal::from(1),
            fee_threshold: Decimal::from(10),
        }
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| CollectorError::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|e| CollectorError::InvalidConfig {
            reason: format!("can not read {}: {e}", path.display()),
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(CollectorError::InvalidConfig {
                reason: "max_workers must be > 0".to_string(),
            });
        }
        if self.max_retries == 0 {
            return Err(CollectorError::InvalidConfig {
                reason: "max_retries must be > 0".to_string(),
            });
        }
        for (name, value) in [
            ("per_transfer_fee", self.per_transfer_fee),
            ("activation_fee", self.activation_fee),
            ("fee_threshold", self.fee_threshold),
        ] {
            if value < Decimal::ZERO {
                return Err(CollectorError::InvalidConfig {
                    reason: format!("{name} ({value}) must not be negative"),
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn fee_schedule(&self) -> FeeSchedule {
        FeeSchedule {
            per_transfer_fee: self.per_transfer_fee,
            activation_fee: self.activation_fee,
        }
    }
}
