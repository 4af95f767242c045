//! Native-currency cost of executing a plan.
//!
//! Every transfer is charged the per-transfer fee plus the activation
//! surcharge. Whether a destination actually exists on chain is not known at
//! planning time, so the estimate is an upper bound.

use {
    crate::account::Plan,
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// Fee parameters, in native currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub per_transfer_fee: Decimal,
    pub activation_fee: Decimal,
}

impl FeeSchedule {
    /// Worst-case cost of a single transfer.
    #[inline]
    pub fn per_transfer_ceiling(&self) -> Decimal {
        self.per_transfer_fee.saturating_add(self.activation_fee)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    pub transfer_count: usize,
    pub fee: Decimal,
}

impl fmt::Display for FeeEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} over {} transfers", self.fee, self.transfer_count)
    }
}

/// `transfer_count × (per_transfer_fee + activation_fee)` for `plan`.
pub fn estimate(plan: &Plan, schedule: &FeeSchedule) -> FeeEstimate {
    let transfer_count = plan.transfer_count();
    let fee = Decimal::from(transfer_count).saturating_mul(schedule.per_transfer_ceiling());
    FeeEstimate {
        transfer_count,
        fee,
    }
}
