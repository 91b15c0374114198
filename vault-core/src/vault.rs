//! Main vault orchestration layer
//!
//! Ties the share ledger, exchange-rate arithmetic, withdrawal queue, and
//! operator gateway together into the public operation surface.
//!
//! # Execution model
//!
//! Every public mutating operation runs as a single atomic unit. A
//! per-instance mutual-exclusion flag is set atomically at entry and cleared
//! on every exit path; a collaborator that calls back into a mutating
//! operation while one is in flight gets [`Error::Reentrancy`]. Operations
//! are staged validate → external call → apply, so a failure at any point
//! leaves no partial mutation behind. Read-only queries interleave freely.

use crate::{
    collaborators::{
        AuthRegistrar, Clock, CollateralStore, OptionRegistry, PricingOracle, TradingVenue,
    },
    config::Config,
    gateway::{self, ExecutionCounters, ExecutionLog},
    ledger::ShareLedger,
    lock::EpochLock,
    metrics::Metrics,
    queue::{PendingWithdrawal, WithdrawalQueue},
    rate,
    types::{Address, Amount, EventRecord, OptionSeries, Procedure, Quote, SeriesId, VaultEvent},
    Error, Result,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// External collaborators the vault is wired to at construction
#[derive(Clone)]
pub struct Collaborators {
    /// Custody of the collateral asset
    pub collateral: Arc<dyn CollateralStore>,

    /// External trading venue
    pub venue: Arc<dyn TradingVenue>,

    /// Registry of issued option series
    pub registry: Arc<dyn OptionRegistry>,

    /// Pricing oracle
    pub oracle: Arc<dyn PricingOracle>,

    /// Upstream access-control registration (used once, at construction)
    pub registrar: Arc<dyn AuthRegistrar>,

    /// Wall-clock source
    pub clock: Arc<dyn Clock>,
}

/// State owned exclusively by the vault instance
struct Inner {
    ledger: ShareLedger,
    queue: WithdrawalQueue,
    /// Uncommitted collateral reserve: collateral committed to open trades
    /// through the gateway is subtracted here and flows back via `redeem`
    /// or premium receipts.
    reserve: Amount,
    operator: Address,
    exec_log: ExecutionLog,
    events: Vec<EventRecord>,
}

/// Pooled options vault
pub struct Vault {
    collateral: Arc<dyn CollateralStore>,
    venue: Arc<dyn TradingVenue>,
    registry: Arc<dyn OptionRegistry>,
    oracle: Arc<dyn PricingOracle>,
    clock: Arc<dyn Clock>,

    address: Address,
    expiration_horizon_days: i64,
    epoch_lock: Option<EpochLock>,

    state: RwLock<Inner>,
    in_flight: AtomicBool,
    metrics: Metrics,
}

/// RAII clear for the mutual-exclusion flag; covers error exit paths
struct EntryGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl Vault {
    /// Construct a vault and register it with the upstream access controller
    pub fn new(config: Config, collab: Collaborators) -> Result<Self> {
        config.validate()?;

        let address = Address::new(config.vault_address.clone());
        collab
            .registrar
            .register(&address)
            .map_err(Error::Registrar)?;

        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("metrics registry: {}", e)))?;

        tracing::info!(vault = %address, operator = %config.operator, "vault constructed");

        Ok(Self {
            collateral: collab.collateral,
            venue: collab.venue,
            registry: collab.registry,
            oracle: collab.oracle,
            clock: collab.clock,
            address,
            expiration_horizon_days: config.expiration_horizon_days,
            epoch_lock: config.epoch_lock.as_ref().map(EpochLock::new),
            state: RwLock::new(Inner {
                ledger: ShareLedger::new(),
                queue: WithdrawalQueue::new(),
                reserve: 0,
                operator: Address::new(config.operator),
                exec_log: ExecutionLog::new(),
                events: Vec::new(),
            }),
            in_flight: AtomicBool::new(false),
            metrics,
        })
    }

    // ---- mutating operations ----

    /// Deposit collateral, minting shares at the floor rate
    ///
    /// Returns the shares minted. Fails with [`Error::ZeroShares`] when the
    /// deposit converts to nothing.
    pub fn deposit(&self, depositor: &Address, assets: Amount, receiver: &Address) -> Result<Amount> {
        let _entry = self.enter()?;
        self.check_epoch_lock()?;

        // Validate and plan; exclusivity keeps the plan valid across the
        // external call below.
        let shares = {
            let state = self.state.read();
            let shares =
                rate::shares_for_deposit(assets, state.ledger.total_shares(), state.reserve)?;
            if shares == 0 {
                return Err(Error::ZeroShares);
            }
            if !state.ledger.can_credit(receiver, shares) {
                return Err(Error::Overflow("share balance"));
            }
            state
                .reserve
                .checked_add(assets)
                .ok_or(Error::Overflow("reserve"))?;
            shares
        };

        self.collateral
            .transfer_in(depositor, assets)
            .map_err(Error::Collateral)?;

        {
            let mut state = self.state.write();
            state.ledger.credit(receiver, shares)?;
            state.reserve += assets;
            let reserve = state.reserve;
            state.events.push(EventRecord::new(
                self.clock.now(),
                VaultEvent::Deposited {
                    depositor: depositor.clone(),
                    receiver: receiver.clone(),
                    assets,
                    shares,
                },
            ));
            self.metrics.set_reserve(reserve);
        }
        self.metrics.deposits_total.inc();

        tracing::info!(
            depositor = %depositor,
            receiver = %receiver,
            assets = %assets,
            shares = %shares,
            "deposit accepted"
        );
        Ok(shares)
    }

    /// Mint exactly `shares`, charging assets at the ceiling rate
    ///
    /// Returns the assets charged.
    pub fn mint(&self, depositor: &Address, shares: Amount, receiver: &Address) -> Result<Amount> {
        let _entry = self.enter()?;
        self.check_epoch_lock()?;

        let assets = {
            let state = self.state.read();
            let assets =
                rate::assets_for_mint(shares, state.ledger.total_shares(), state.reserve)?;
            if assets == 0 {
                return Err(Error::ZeroAssets);
            }
            if !state.ledger.can_credit(receiver, shares) {
                return Err(Error::Overflow("share balance"));
            }
            state
                .reserve
                .checked_add(assets)
                .ok_or(Error::Overflow("reserve"))?;
            assets
        };

        self.collateral
            .transfer_in(depositor, assets)
            .map_err(Error::Collateral)?;

        {
            let mut state = self.state.write();
            state.ledger.credit(receiver, shares)?;
            state.reserve += assets;
            let reserve = state.reserve;
            state.events.push(EventRecord::new(
                self.clock.now(),
                VaultEvent::Minted {
                    depositor: depositor.clone(),
                    receiver: receiver.clone(),
                    assets,
                    shares,
                },
            ));
            self.metrics.set_reserve(reserve);
        }
        self.metrics.mints_total.inc();

        tracing::info!(
            depositor = %depositor,
            receiver = %receiver,
            assets = %assets,
            shares = %shares,
            "mint accepted"
        );
        Ok(assets)
    }

    /// Record a pending withdrawal claim at the front of the queue
    ///
    /// Shares are not burned and no collateral moves; the claim is only
    /// recorded. The balance check is advisory and re-derived fresh on each
    /// call, so one account can stack claims toward distinct receivers up to
    /// its live balance.
    pub fn initiate_withdraw(
        &self,
        caller: &Address,
        share_amount: Amount,
        receiver: &Address,
    ) -> Result<()> {
        let _entry = self.enter()?;
        self.check_epoch_lock()?;

        let mut state = self.state.write();

        if share_amount == 0 {
            return Err(Error::InsufficientAmount);
        }

        let balance = state.ledger.balance_of(caller);
        if balance < share_amount {
            return Err(Error::WithdrawalAmount {
                requested: share_amount,
                balance,
            });
        }

        let pending = state.queue.pending_shares(receiver);
        let reserved = pending
            .checked_add(share_amount)
            .ok_or(Error::Overflow("pending claim"))?;
        if balance < reserved {
            return Err(Error::PendingWithdrawalAmount {
                requested: share_amount,
                pending,
                balance,
            });
        }

        state.queue.push_front(PendingWithdrawal {
            owner: caller.clone(),
            receiver: receiver.clone(),
            shares: share_amount,
        })?;

        let depth = state.queue.len();
        state.events.push(EventRecord::new(
            self.clock.now(),
            VaultEvent::WithdrawalInitiated {
                owner: caller.clone(),
                receiver: receiver.clone(),
                shares: share_amount,
            },
        ));
        drop(state);

        self.metrics.withdrawals_initiated_total.inc();
        self.metrics.set_queue_depth(depth);

        tracing::info!(
            owner = %caller,
            receiver = %receiver,
            shares = %share_amount,
            "withdrawal initiated"
        );
        Ok(())
    }

    /// Settle the front pending claim (operator-only)
    ///
    /// The payout is re-derived at the current exchange rate, not the rate
    /// at initiation: drift between the two changes what the receiver gets.
    /// Returns the receiver and the settled amount.
    pub fn complete_withdrawal(&self, caller: &Address) -> Result<(Address, Amount)> {
        let _entry = self.enter()?;
        self.require_operator(caller)?;

        let (claim, payout) = {
            let state = self.state.read();
            let claim = state
                .queue
                .peek_front()
                .ok_or(Error::NoPendingWithdrawals)?
                .clone();
            let payout =
                rate::assets_for_shares(claim.shares, state.ledger.total_shares(), state.reserve)?;

            let balance = state.ledger.balance_of(&claim.owner);
            if balance < claim.shares {
                return Err(Error::InsufficientShares {
                    owner: claim.owner.clone(),
                    balance,
                    claimed: claim.shares,
                });
            }
            if state.reserve < payout {
                return Err(Error::InsufficientReserve {
                    available: state.reserve,
                    required: payout,
                });
            }
            (claim, payout)
        };

        self.collateral
            .transfer_out(&claim.receiver, payout)
            .map_err(Error::Collateral)?;

        {
            let mut state = self.state.write();
            state.queue.pop_front();
            state.ledger.burn(&claim.owner, claim.shares)?;
            state.reserve -= payout;
            let reserve = state.reserve;
            let depth = state.queue.len();
            state.events.push(EventRecord::new(
                self.clock.now(),
                VaultEvent::WithdrawalSettled {
                    receiver: claim.receiver.clone(),
                    amount: payout,
                },
            ));
            self.metrics.set_reserve(reserve);
            self.metrics.set_queue_depth(depth);
        }
        self.metrics.settlements_total.inc();

        tracing::info!(
            receiver = %claim.receiver,
            owner = %claim.owner,
            shares = %claim.shares,
            payout = %payout,
            "withdrawal settled"
        );
        Ok((claim.receiver, payout))
    }

    /// Dispatch an operation batch to the trading venue (operator-only)
    ///
    /// Issue/BuyOption actions commit collateral: the reserve drops by their
    /// amounts once the venue accepts the batch. No profitability check is
    /// performed here; the operator path is a trust boundary.
    pub fn execute(&self, caller: &Address, batch: &[Procedure]) -> Result<ExecutionCounters> {
        let _entry = self.enter()?;
        self.require_operator(caller)?;

        let now = self.clock.now();
        gateway::validate_batch(batch, now, self.expiration_horizon_days)?;
        let commitment = gateway::committed_amount(batch)?;

        {
            let state = self.state.read();
            if state.reserve < commitment {
                return Err(Error::InsufficientReserve {
                    available: state.reserve,
                    required: commitment,
                });
            }
        }

        self.venue.operate(batch).map_err(Error::Venue)?;

        let counters = {
            let mut state = self.state.write();
            let call_seq = state.exec_log.next_call();
            state.reserve -= commitment;

            for procedure in batch {
                if let Procedure::Strategy { actions } = procedure {
                    for action in actions {
                        let action_seq = state.exec_log.record(action.kind);
                        state.events.push(EventRecord::new(
                            now,
                            VaultEvent::ActionExecuted {
                                call_seq,
                                action_seq,
                                kind: action.kind,
                                series: action.series.clone(),
                                amount: action.amount,
                            },
                        ));
                        self.metrics.actions_executed_total.inc();
                        tracing::debug!(
                            call_seq,
                            action_seq,
                            kind = %action.kind,
                            amount = %action.amount,
                            "action executed"
                        );
                    }
                }
            }

            let reserve = state.reserve;
            self.metrics.set_reserve(reserve);
            state.exec_log.counters()
        };

        tracing::info!(
            calls = counters.calls,
            committed = %commitment,
            "operation batch dispatched"
        );
        Ok(counters)
    }

    /// Redeem a settled option series, returning collateral to the reserve
    /// (operator-only)
    pub fn redeem(&self, caller: &Address, series: &SeriesId) -> Result<Amount> {
        let _entry = self.enter()?;
        self.require_operator(caller)?;

        let returned = self.registry.redeem(series).map_err(Error::Registry)?;

        {
            let mut state = self.state.write();
            let new_reserve = state
                .reserve
                .checked_add(returned)
                .ok_or(Error::Overflow("reserve"))?;
            state.reserve = new_reserve;
            state.events.push(EventRecord::new(
                self.clock.now(),
                VaultEvent::Redeemed {
                    series: series.clone(),
                    amount: returned,
                },
            ));
            self.metrics.set_reserve(new_reserve);
        }

        tracing::info!(series = %series, returned = %returned, "series redeemed");
        Ok(returned)
    }

    /// Rotate the operator identity; only the current operator may do this
    pub fn set_operator(&self, caller: &Address, new_operator: Address) -> Result<()> {
        let _entry = self.enter()?;

        let mut state = self.state.write();
        if *caller != state.operator {
            return Err(Error::NotOperator {
                caller: caller.clone(),
                operator: state.operator.clone(),
            });
        }

        let previous = std::mem::replace(&mut state.operator, new_operator.clone());
        state.events.push(EventRecord::new(
            self.clock.now(),
            VaultEvent::OperatorChanged {
                previous: previous.clone(),
                new_operator: new_operator.clone(),
            },
        ));
        drop(state);

        tracing::info!(previous = %previous, new_operator = %new_operator, "operator rotated");
        Ok(())
    }

    // ---- read-only queries ----

    /// Quote a trade through the pricing oracle (pass-through, read-only)
    pub fn quote(
        &self,
        series: &OptionSeries,
        amount: Amount,
        is_sell: bool,
        net_exposure: i128,
    ) -> Result<Quote> {
        self.oracle
            .quote_price(series, amount, is_sell, net_exposure)
            .map_err(Error::Oracle)
    }

    /// Share balance of an account
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.state.read().ledger.balance_of(account)
    }

    /// Total issued shares
    pub fn total_shares(&self) -> Amount {
        self.state.read().ledger.total_shares()
    }

    /// Current uncommitted collateral reserve
    pub fn total_reserve(&self) -> Amount {
        self.state.read().reserve
    }

    /// Shares a deposit of `assets` would mint right now
    pub fn convert_to_shares(&self, assets: Amount) -> Result<Amount> {
        let state = self.state.read();
        rate::shares_for_deposit(assets, state.ledger.total_shares(), state.reserve)
    }

    /// Assets a settlement of `shares` would release right now
    pub fn convert_to_assets(&self, shares: Amount) -> Result<Amount> {
        let state = self.state.read();
        rate::assets_for_shares(shares, state.ledger.total_shares(), state.reserve)
    }

    /// Live pending claims in settlement order (front first)
    pub fn pending_withdrawals(&self) -> Vec<PendingWithdrawal> {
        self.state.read().queue.iter().cloned().collect()
    }

    /// Pending claim shares for a receiver (zero when none)
    pub fn pending_claim(&self, receiver: &Address) -> Amount {
        self.state.read().queue.pending_shares(receiver)
    }

    /// Number of live pending claims
    pub fn queue_depth(&self) -> usize {
        self.state.read().queue.len()
    }

    /// Current operator identity
    pub fn operator(&self) -> Address {
        self.state.read().operator.clone()
    }

    /// Identity the vault registered at construction
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Execution log counters
    pub fn execution_counters(&self) -> ExecutionCounters {
        self.state.read().exec_log.counters()
    }

    /// Drain accumulated notifications for external observers
    pub fn drain_events(&self) -> Vec<EventRecord> {
        std::mem::take(&mut self.state.write().events)
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Verify the accounting invariants (share conservation, queue links)
    pub fn verify_accounting(&self) -> std::result::Result<(), String> {
        let state = self.state.read();
        if !state.ledger.check_conservation() {
            return Err("share conservation violated".to_string());
        }
        state.queue.check_links()
    }

    // ---- internals ----

    fn enter(&self) -> Result<EntryGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(Error::Reentrancy);
        }
        Ok(EntryGuard {
            flag: &self.in_flight,
        })
    }

    fn check_epoch_lock(&self) -> Result<()> {
        if let Some(lock) = &self.epoch_lock {
            let now = self.clock.now();
            if lock.is_locked(now) {
                return Err(Error::LiquidityLocked {
                    unlock_at: lock.unlock_at(now),
                });
            }
        }
        Ok(())
    }

    fn require_operator(&self, caller: &Address) -> Result<()> {
        let state = self.state.read();
        if *caller != state.operator {
            return Err(Error::NotOperator {
                caller: caller.clone(),
                operator: state.operator.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}
