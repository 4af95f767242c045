//! Pool accounts, payout requests and the transfer plan built from them.

use {
    rust_decimal::Decimal,
    serde::{Deserialize, Serialize},
    std::{collections::HashSet, fmt},
};

/// A chain address in its textual (base58 / hex) form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(address: &str) -> Self {
        Self(address.to_string())
    }
}

impl From<String> for Address {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One pool address as seen by the last ledger refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: Address,
    /// Token balance, already scaled by the token's on-chain decimals.
    pub token_balance: Decimal,
    /// Balance of the chain's gas currency.
    pub native_balance: Decimal,
    /// Free bandwidth left before the address has to burn native currency.
    pub bandwidth_remaining: u64,
}

impl Account {
    /// An account that has never transacted: nothing but an address.
    pub fn empty(address: Address) -> Self {
        Self {
            address,
            token_balance: Decimal::ZERO,
            native_balance: Decimal::ZERO,
            bandwidth_remaining: 0,
        }
    }

    pub fn with_tokens(address: Address, token_balance: Decimal) -> Self {
        Self {
            token_balance,
            ..Self::empty(address)
        }
    }

    #[inline]
    pub fn has_tokens(&self) -> bool {
        self.token_balance > Decimal::ZERO
    }
}

/// A caller-supplied request to pay `amount` tokens to `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutRequest {
    pub destination: Address,
    pub amount: Decimal,
}

impl PayoutRequest {
    pub fn new(destination: impl Into<Address>, amount: Decimal) -> Self {
        Self {
            destination: destination.into(),
            amount,
        }
    }
}

/// Which allocation tier produced a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferReason {
    /// A single account held exactly the requested amount.
    ExactMatch,
    /// The request drained every funded account in the pool.
    FullSweep,
    /// The account held more than the remaining shortfall.
    Partial,
    /// The account was emptied and collection moved on.
    FullDrain,
}

impl fmt::Display for TransferReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ExactMatch => "exact match",
            Self::FullSweep => "full sweep",
            Self::Partial => "partial",
            Self::FullDrain => "full drain",
        };
        f.write_str(label)
    }
}

/// One allocation decision: move `amount` from `source` to `destination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferStep {
    /// The source account as it was right before this allocation.
    pub source: Account,
    pub destination: Address,
    pub amount: Decimal,
    pub reason: TransferReason,
}

impl fmt::Display for TransferStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {} ({})",
            self.source.address, self.destination, self.amount, self.reason
        )
    }
}

/// The transfers allocated to a single payout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferGroup {
    pub request: PayoutRequest,
    pub steps: Vec<TransferStep>,
}

impl TransferGroup {
    /// Sum of the step amounts. Equals `request.amount` for a planned group.
    pub fn collected(&self) -> Decimal {
        self.steps
            .iter()
            .fold(Decimal::ZERO, |acc, step| acc.saturating_add(step.amount))
    }
}

/// Ordered transfer groups, one per payout request, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    groups: Vec<TransferGroup>,
}

impl Plan {
    pub(crate) fn push(&mut self, group: TransferGroup) {
        self.groups.push(group);
    }

    pub fn groups(&self) -> &[TransferGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every step of every group, in plan order.
    pub fn steps(&self) -> impl Iterator<Item = &TransferStep> {
        self.groups.iter().flat_map(|group| group.steps.iter())
    }

    /// Total number of on-chain transfers the plan needs.
    pub fn transfer_count(&self) -> usize {
        self.groups.iter().map(|group| group.steps.len()).sum()
    }

    pub fn total_amount(&self) -> Decimal {
        self.groups
            .iter()
            .fold(Decimal::ZERO, |acc, group| acc.saturating_add(group.collected()))
    }

    /// Distinct source accounts in plan order.
    ///
    /// An address used by several steps is reported once, with the snapshot
    /// taken by its first step.
    pub fn source_accounts(&self) -> Vec<&Account> {
        let mut seen = HashSet::new();
        self.steps()
            .map(|step| &step.source)
            .filter(|account| seen.insert(&account.address))
            .collect()
    }
}
