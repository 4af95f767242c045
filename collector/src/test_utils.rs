//! In-process chain double for tests and local experiments.

use {
    crate::{
        account::Address,
        error::GatewayError,
        gateway::{ChainGateway, PrivateKey, TxId},
    },
    async_trait::async_trait,
    parking_lot::Mutex,
    rust_decimal::Decimal,
    std::{
        collections::{HashMap, HashSet},
        time::Duration,
    },
};

/// A native transfer the mock confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentTransfer {
    pub from: Address,
    pub to: Address,
    pub amount: Decimal,
    pub tx_id: TxId,
}

#[derive(Debug, Clone, Copy)]
struct Activated {
    native: Decimal,
    bandwidth_used: u64,
}

#[derive(Debug, Default)]
struct ChainState {
    tokens: HashMap<Address, Decimal>,
    activated: HashMap<Address, Activated>,
    transient_failures: HashMap<Address, u32>,
    hard_failures: HashMap<Address, GatewayError>,
    rejected_destinations: HashSet<Address>,
    token_calls: HashMap<Address, u32>,
    sent: Vec<SentTransfer>,
    in_flight: usize,
    peak_in_flight: usize,
}

impl ChainState {
    fn enter(&mut self) {
        self.in_flight = self.in_flight.saturating_add(1);
        self.peak_in_flight = self.peak_in_flight.max(self.in_flight);
    }

    fn leave(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

/// Scriptable [`ChainGateway`].
///
/// Addresses added through [`MockChain::add_account`] exist on chain;
/// anything else is unknown and answers [`GatewayError::AccountNotFound`]
/// on the native side while still reporting its token balance.
#[derive(Debug, Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
    latency: Option<Duration>,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every token balance call and native transfer, so concurrent
    /// requests overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn add_account(&self, address: &str, tokens: Decimal, native: Decimal, bandwidth_used: u64) {
        let mut state = self.state.lock();
        let address = Address::from(address);
        state.tokens.insert(address.clone(), tokens);
        state.activated.insert(
            address,
            Activated {
                native,
                bandwidth_used,
            },
        );
    }

    /// An address that received tokens but never transacted.
    pub fn add_unactivated(&self, address: &str, tokens: Decimal) {
        let mut state = self.state.lock();
        let address = Address::from(address);
        state.activated.remove(&address);
        state.tokens.insert(address, tokens);
    }

    pub fn set_tokens(&self, address: &str, tokens: Decimal) {
        self.state.lock().tokens.insert(Address::from(address), tokens);
    }

    /// Fail the next `times` token balance calls for `address` transiently.
    pub fn fail_transiently(&self, address: &str, times: u32) {
        self.state
            .lock()
            .transient_failures
            .insert(Address::from(address), times);
    }

    /// Fail every token balance call for `address` with `error`.
    pub fn fail_hard(&self, address: &str, error: GatewayError) {
        self.state
            .lock()
            .hard_failures
            .insert(Address::from(address), error);
    }

    /// Refuse native transfers sent to `address`.
    pub fn reject_transfers_to(&self, address: &str) {
        self.state
            .lock()
            .rejected_destinations
            .insert(Address::from(address));
    }

    pub fn token_calls(&self, address: &str) -> u32 {
        self.state
            .lock()
            .token_calls
            .get(&Address::from(address))
            .copied()
            .unwrap_or_default()
    }

    /// Highest number of token balance calls or native transfers observed
    /// in flight at once.
    pub fn peak_in_flight(&self) -> usize {
        self.state.lock().peak_in_flight
    }

    pub fn sent_transfers(&self) -> Vec<SentTransfer> {
        self.state.lock().sent.clone()
    }

    /// Current native balance, `None` for an address unknown to the chain.
    pub fn native_of(&self, address: &str) -> Option<Decimal> {
        self.state
            .lock()
            .activated
            .get(&Address::from(address))
            .map(|account| account.native)
    }

    fn begin_token_call(&self, address: &Address) -> Result<Decimal, GatewayError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        let calls = state.token_calls.entry(address.clone()).or_default();
        *calls = calls.saturating_add(1);
        state.enter();

        if let Some(err) = state.hard_failures.get(address) {
            return Err(err.clone());
        }
        if let Some(remaining) = state.transient_failures.get_mut(address) {
            if *remaining > 0 {
                *remaining = remaining.saturating_sub(1);
                return Err(GatewayError::Transient("node busy".to_string()));
            }
        }
        // Contract reads for addresses the token never touched return zero.
        Ok(state.tokens.get(address).copied().unwrap_or_default())
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Decimal) -> Result<TxId, GatewayError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if state.rejected_destinations.contains(to) {
            return Err(GatewayError::Rejected(format!("transfer to {to} refused")));
        }
        let sender = state
            .activated
            .get_mut(from)
            .ok_or_else(|| GatewayError::AccountNotFound(from.clone()))?;
        if sender.native < amount {
            return Err(GatewayError::Rejected(format!(
                "{from} holds {} but sends {amount}",
                sender.native
            )));
        }
        sender.native = sender.native.saturating_sub(amount);

        // Receiving native currency activates an address.
        let receiver = state.activated.entry(to.clone()).or_insert(Activated {
            native: Decimal::ZERO,
            bandwidth_used: 0,
        });
        receiver.native = receiver.native.saturating_add(amount);

        let tx_id = TxId(format!("tx{:04}", state.sent.len()));
        state.sent.push(SentTransfer {
            from: from.clone(),
            to: to.clone(),
            amount,
            tx_id: tx_id.clone(),
        });
        Ok(tx_id)
    }

    fn activated(&self, address: &Address) -> Result<Activated, GatewayError> {
        self.state
            .lock()
            .activated
            .get(address)
            .copied()
            .ok_or_else(|| GatewayError::AccountNotFound(address.clone()))
    }
}

#[async_trait]
impl ChainGateway for MockChain {
    async fn token_balance(&self, address: &Address) -> Result<Decimal, GatewayError> {
        let result = self.begin_token_call(address);
        self.simulate_latency().await;
        self.state.lock().leave();
        result
    }

    async fn native_balance(&self, address: &Address) -> Result<Decimal, GatewayError> {
        self.activated(address).map(|account| account.native)
    }

    async fn bandwidth_used(&self, address: &Address) -> Result<u64, GatewayError> {
        self.activated(address).map(|account| account.bandwidth_used)
    }

    async fn send_native_transfer(
        &self,
        from: &Address,
        to: &Address,
        amount: Decimal,
        _key: &PrivateKey,
    ) -> Result<TxId, GatewayError> {
        self.state.lock().enter();
        self.simulate_latency().await;
        let result = self.transfer(from, to, amount);
        self.state.lock().leave();
        result
    }
}
