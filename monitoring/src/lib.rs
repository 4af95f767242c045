//! # Token pool monitoring
//!
//! Metrics for the collection engine, exported in Prometheus conventions:
//! - **Counter**: monotonically increasing value (e.g., refreshes run)
//! - **Gauge**: value that can go up or down (e.g., accounts tracked)
//! - **Histogram**: distribution of observations (e.g., refresh duration)
//!
//! ## Usage
//!
//! ```rust
//! use tokenpool_monitoring::{CollectorMetrics, prometheus};
//!
//! let metrics = CollectorMetrics::new();
//! metrics.refreshes.inc();
//! metrics.refresh_duration_ms.observe(840.0);
//! metrics.accounts_tracked.set(250);
//!
//! let text = prometheus::encode(&metrics.snapshot());
//! assert!(text.contains("tokenpool_refreshes_total 1"));
//! ```

pub mod prometheus;

use {
    parking_lot::Mutex,
    std::sync::atomic::{AtomicI64, AtomicU64, Ordering},
};

// ---------------------------------------------------------------------------
// Metric primitives
// ---------------------------------------------------------------------------

/// A monotonically increasing counter.
#[derive(Debug)]
pub struct Counter {
    value: AtomicU64,
    name: &'static str,
    help: &'static str,
}

impl Counter {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            value: AtomicU64::new(0),
            name,
            help,
        }
    }

    pub fn inc(&self) {
        self.value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add(&self, v: u64) {
        self.value.fetch_add(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }

    fn sample(&self) -> Sample {
        Sample::Counter {
            name: self.name,
            help: self.help,
            value: self.get(),
        }
    }
}

/// A gauge that can go up or down.
#[derive(Debug)]
pub struct Gauge {
    value: AtomicI64,
    name: &'static str,
    help: &'static str,
}

impl Gauge {
    pub const fn new(name: &'static str, help: &'static str) -> Self {
        Self {
            value: AtomicI64::new(0),
            name,
            help,
        }
    }

    pub fn set(&self, v: i64) {
        self.value.store(v, Ordering::Relaxed);
    }

    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    fn sample(&self) -> Sample {
        Sample::Gauge {
            name: self.name,
            help: self.help,
            value: self.get(),
        }
    }
}

/// Observations sorted into cumulative buckets.
#[derive(Debug)]
pub struct Histogram {
    bounds: Vec<f64>,
    counts: Vec<AtomicU64>,
    sum: Mutex<f64>,
    count: AtomicU64,
    name: &'static str,
    help: &'static str,
}

impl Histogram {
    /// Create a histogram with the given bucket upper bounds.
    pub fn new(name: &'static str, help: &'static str, bounds: Vec<f64>) -> Self {
        let counts = bounds.iter().map(|_| AtomicU64::new(0)).collect();
        Self {
            bounds,
            counts,
            sum: Mutex::new(0.0),
            count: AtomicU64::new(0),
            name,
            help,
        }
    }

    pub fn observe(&self, v: f64) {
        self.count.fetch_add(1, Ordering::Relaxed);
        *self.sum.lock() += v;
        for (bound, count) in self.bounds.iter().zip(&self.counts) {
            if v <= *bound {
                count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn get_count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn get_sum(&self) -> f64 {
        *self.sum.lock()
    }

    /// `(upper bound, cumulative count)` pairs.
    pub fn get_buckets(&self) -> Vec<(f64, u64)> {
        self.bounds
            .iter()
            .zip(&self.counts)
            .map(|(bound, count)| (*bound, count.load(Ordering::Relaxed)))
            .collect()
    }

    fn sample(&self) -> Sample {
        Sample::Histogram {
            name: self.name,
            help: self.help,
            buckets: self.get_buckets(),
            sum: self.get_sum(),
            count: self.get_count(),
        }
    }
}

/// Bucket bounds for network phase durations (milliseconds).
pub fn default_duration_buckets() -> Vec<f64> {
    vec![
        50.0, 100.0, 250.0, 500.0, 1_000.0, 2_500.0, 5_000.0, 10_000.0, 30_000.0, 60_000.0,
    ]
}

// ---------------------------------------------------------------------------
// Collector metrics
// ---------------------------------------------------------------------------

/// Metrics of one collection engine instance.
///
/// Shared behind an `Arc` by the ledger, the planner and the seeder.
#[derive(Debug)]
pub struct CollectorMetrics {
    // -- Ledger refresh --
    pub refreshes: Counter,
    pub refresh_failures: Counter,
    pub refresh_retries: Counter,
    pub refresh_duration_ms: Histogram,
    pub accounts_tracked: Gauge,
    pub accounts_funded: Gauge,

    // -- Planning --
    pub payouts_planned: Counter,
    pub transfers_planned: Counter,
    pub planning_failures: Counter,

    // -- Seeding --
    pub seeds_confirmed: Counter,
    pub seeds_failed: Counter,
}

impl CollectorMetrics {
    pub fn new() -> Self {
        Self {
            refreshes: Counter::new(
                "tokenpool_refreshes_total",
                "Completed ledger refreshes",
            ),
            refresh_failures: Counter::new(
                "tokenpool_refresh_failures_total",
                "Ledger refreshes aborted by a fetch failure",
            ),
            refresh_retries: Counter::new(
                "tokenpool_refresh_retries_total",
                "Balance fetches retried after a transient error",
            ),
            refresh_duration_ms: Histogram::new(
                "tokenpool_refresh_duration_ms",
                "Wall-clock duration of a ledger refresh in milliseconds",
                default_duration_buckets(),
            ),
            accounts_tracked: Gauge::new(
                "tokenpool_accounts_tracked",
                "Pool addresses in the current ledger snapshot",
            ),
            accounts_funded: Gauge::new(
                "tokenpool_accounts_funded",
                "Pool addresses holding a positive token balance",
            ),
            payouts_planned: Counter::new(
                "tokenpool_payouts_planned_total",
                "Payout requests turned into transfer groups",
            ),
            transfers_planned: Counter::new(
                "tokenpool_transfers_planned_total",
                "Token transfers emitted by the planner",
            ),
            planning_failures: Counter::new(
                "tokenpool_planning_failures_total",
                "Planning sessions aborted by an allocation error",
            ),
            seeds_confirmed: Counter::new(
                "tokenpool_seeds_confirmed_total",
                "Fee seeding transfers confirmed on chain",
            ),
            seeds_failed: Counter::new(
                "tokenpool_seeds_failed_total",
                "Fee seeding transfers that failed",
            ),
        }
    }

    /// Take a point-in-time snapshot of every metric, in export order.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            samples: vec![
                self.refreshes.sample(),
                self.refresh_failures.sample(),
                self.refresh_retries.sample(),
                self.refresh_duration_ms.sample(),
                self.accounts_tracked.sample(),
                self.accounts_funded.sample(),
                self.payouts_planned.sample(),
                self.transfers_planned.sample(),
                self.planning_failures.sample(),
                self.seeds_confirmed.sample(),
                self.seeds_failed.sample(),
            ],
        }
    }
}

impl Default for CollectorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Snapshot (point-in-time export)
// ---------------------------------------------------------------------------

/// A single exported metric value.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Counter {
        name: &'static str,
        help: &'static str,
        value: u64,
    },
    Gauge {
        name: &'static str,
        help: &'static str,
        value: i64,
    },
    Histogram {
        name: &'static str,
        help: &'static str,
        buckets: Vec<(f64, u64)>,
        sum: f64,
        count: u64,
    },
}

impl Sample {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Counter { name, .. } | Self::Gauge { name, .. } | Self::Histogram { name, .. } => {
                name
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub samples: Vec<Sample>,
}

impl MetricsSnapshot {
    pub fn counter(&self, name: &str) -> Option<u64> {
        self.samples.iter().find_map(|sample| match sample {
            Sample::Counter { name: n, value, .. } if *n == name => Some(*value),
            _ => None,
        })
    }

    pub fn gauge(&self, name: &str) -> Option<i64> {
        self.samples.iter().find_map(|sample| match sample {
            Sample::Gauge { name: n, value, .. } if *n == name => Some(*value),
            _ => None,
        })
    }
}
