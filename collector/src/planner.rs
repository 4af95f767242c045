//! Turns an ordered payout list into transfer groups drawn from the ledger.
//!
//! Each request is served by the first tier that applies:
//!
//! 1. **Exact match**: one funded account holds exactly the amount.
//! 2. **Full sweep**: the amount equals everything the pool still holds.
//! 3. **Greedy**: accounts are drained in ledger order, the last one only
//!    partially, until the amount is collected.
//!
//! Allocations debit the ledger, so later requests see what earlier ones
//! left behind. The ledger is not re-sorted between requests.

use {
    crate::{
        account::{Account, Address, PayoutRequest, Plan, TransferGroup, TransferReason, TransferStep},
        error::{CollectorError, Result},
        fee::{self, FeeEstimate, FeeSchedule},
        ledger::AccountLedger,
    },
    log::{debug, info},
    rust_decimal::Decimal,
};

/// One planning session over an owned ledger.
///
/// Owning the ledger keeps refreshes out while a plan is being built and
/// executed; [`Self::into_ledger`] hands it back afterwards.
#[derive(Debug)]
pub struct PayoutPlanner {
    ledger: AccountLedger,
    payouts: Vec<PayoutRequest>,
    plan: Option<Plan>,
}

impl PayoutPlanner {
    /// Validate the batch against the pool as a whole.
    pub fn new(ledger: AccountLedger, payouts: Vec<PayoutRequest>) -> Result<Self> {
        let requested = requested_total(&payouts)?;
        if requested <= Decimal::ZERO {
            return Err(CollectorError::EmptyPayout { requested });
        }
        let available = funded_total(ledger.accounts())?;
        if requested > available {
            return Err(CollectorError::InsufficientFunds {
                destination: None,
                requested,
                available,
            });
        }
        Ok(Self {
            ledger,
            payouts,
            plan: None,
        })
    }

    /// Build the plan, or return the one already built.
    ///
    /// On error the ledger keeps the balances it had before the call.
    pub fn plan(&mut self) -> Result<&Plan> {
        let plan = match self.plan.take() {
            Some(plan) => plan,
            None => self.build()?,
        };
        Ok(self.plan.insert(plan))
    }

    /// The plan, if [`Self::plan`] already succeeded.
    pub fn planned(&self) -> Option<&Plan> {
        self.plan.as_ref()
    }

    /// Fee needed to execute the plan, planning first if needed.
    pub fn estimate_fee(&mut self, schedule: &FeeSchedule) -> Result<FeeEstimate> {
        let plan = self.plan()?;
        Ok(fee::estimate(plan, schedule))
    }

    pub fn payouts(&self) -> &[PayoutRequest] {
        &self.payouts
    }

    pub fn requested_total(&self) -> Result<Decimal> {
        requested_total(&self.payouts)
    }

    pub fn ledger(&self) -> &AccountLedger {
        &self.ledger
    }

    pub fn into_ledger(self) -> AccountLedger {
        self.ledger
    }

    fn build(&mut self) -> Result<Plan> {
        match allocate_all(self.ledger.accounts(), &self.payouts) {
            Ok((plan, accounts)) => {
                self.ledger.commit(accounts);
                self.report(&plan);
                Ok(plan)
            }
            Err(err) => {
                if let Some(metrics) = self.ledger.metrics() {
                    metrics.planning_failures.inc();
                }
                Err(err)
            }
        }
    }

    fn report(&self, plan: &Plan) {
        let estimate = fee::estimate(plan, &self.ledger.config().fee_schedule());
        info!("Number of transfers: {}", estimate.transfer_count);
        info!("Estimated fee: {}", estimate.fee);
        info!(
            "Requested payout amount: {}",
            requested_total(&self.payouts).unwrap_or(Decimal::MAX)
        );
        info!("Collected payout amount: {}", plan.total_amount());
        info!("Final pool token balance: {}", self.ledger.total_tokens());

        if let Some(metrics) = self.ledger.metrics() {
            metrics.payouts_planned.add(to_counter(plan.groups().len()));
            metrics.transfers_planned.add(to_counter(estimate.transfer_count));
        }
    }
}

fn to_counter(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

fn requested_total(payouts: &[PayoutRequest]) -> Result<Decimal> {
    payouts.iter().try_fold(Decimal::ZERO, |acc, request| {
        acc.checked_add(request.amount)
            .ok_or(CollectorError::Overflow("summing payout requests"))
    })
}

/// Allocate every request against a working copy of `accounts`.
///
/// Returns the plan together with the balances left afterwards.
fn allocate_all(accounts: &[Account], payouts: &[PayoutRequest]) -> Result<(Plan, Vec<Account>)> {
    let mut working = accounts.to_vec();
    let mut plan = Plan::default();
    for (i, request) in payouts.iter().enumerate() {
        debug!(
            "Step {i}: {} -> {}, pool holds {}",
            request.amount,
            request.destination,
            funded_total(&working)?
        );
        let steps = allocate(&mut working, request)?;
        for step in &steps {
            debug!("  {step}");
        }
        plan.push(TransferGroup {
            request: request.clone(),
            steps,
        });
    }
    Ok((plan, working))
}

fn allocate(accounts: &mut [Account], request: &PayoutRequest) -> Result<Vec<TransferStep>> {
    let destination = &request.destination;
    let amount = request.amount;
    if amount <= Decimal::ZERO {
        return Err(CollectorError::InvalidAmount {
            destination: destination.clone(),
            amount,
        });
    }

    if let Some(account) = accounts
        .iter_mut()
        .find(|account| account.has_tokens() && account.token_balance == amount)
    {
        return Ok(vec![take(account, destination, amount, TransferReason::ExactMatch)?]);
    }

    if amount == funded_total(accounts)? {
        return accounts
            .iter_mut()
            .filter(|account| account.has_tokens())
            .map(|account| {
                let balance = account.token_balance;
                take(account, destination, balance, TransferReason::FullSweep)
            })
            .collect();
    }

    collect_greedy(accounts, destination, amount)
}

fn collect_greedy(
    accounts: &mut [Account],
    destination: &Address,
    amount: Decimal,
) -> Result<Vec<TransferStep>> {
    let mut steps = Vec::new();
    let mut collected = Decimal::ZERO;

    for account in accounts.iter_mut().filter(|account| account.has_tokens()) {
        let shortfall = amount
            .checked_sub(collected)
            .ok_or(CollectorError::Overflow("computing shortfall"))?;
        let (taken, reason) = if account.token_balance > shortfall {
            (shortfall, TransferReason::Partial)
        } else {
            (account.token_balance, TransferReason::FullDrain)
        };
        steps.push(take(account, destination, taken, reason)?);
        collected = collected
            .checked_add(taken)
            .ok_or(CollectorError::Overflow("accumulating collected tokens"))?;
        if collected >= amount {
            break;
        }
    }

    if collected > amount {
        return Err(CollectorError::AllocationOverrun {
            destination: destination.clone(),
            requested: amount,
            collected,
            steps: steps.len(),
        });
    }
    if collected < amount {
        return Err(CollectorError::InsufficientFunds {
            destination: Some(destination.clone()),
            requested: amount,
            available: collected,
        });
    }
    Ok(steps)
}

/// Record a step from `account` and debit it.
fn take(
    account: &mut Account,
    destination: &Address,
    amount: Decimal,
    reason: TransferReason,
) -> Result<TransferStep> {
    let step = TransferStep {
        source: account.clone(),
        destination: destination.clone(),
        amount,
        reason,
    };
    account.token_balance = account
        .token_balance
        .checked_sub(amount)
        .ok_or(CollectorError::Overflow("debiting a source account"))?;
    Ok(step)
}

fn funded_total(accounts: &[Account]) -> Result<Decimal> {
    accounts
        .iter()
        .filter(|account| account.has_tokens())
        .try_fold(Decimal::ZERO, |acc, account| {
            acc.checked_add(account.token_balance)
                .ok_or(CollectorError::Overflow("summing pool balances"))
        })
}
