//! Thetapool Vault Core
//!
//! Pooled-fund accounting engine: depositors contribute a fungible collateral
//! asset and receive proportional share claims; a single privileged operator
//! deploys pooled collateral into an external options strategy and settles
//! withdrawals asynchronously.
//!
//! # Architecture
//!
//! - **Share Ledger**: per-account share balances, total issued shares
//! - **Exchange Rate**: share/asset conversions derived from reserve and
//!   total shares, floor rounding, pool-favoring asymmetry
//! - **Withdrawal Queue**: arena-backed singly linked LIFO, one live pending
//!   claim per receiver, drained strictly from the front by the operator
//! - **Operator Gateway**: privileged batch dispatch to an external trading
//!   venue with reserve bookkeeping as a side effect
//!
//! # Invariants
//!
//! - Share conservation: Σ(account balances) == total issued shares
//! - Rounding never favors the caller: to_assets(to_shares(x)) <= x
//! - At most one pending withdrawal per receiver; queue links acyclic
//! - Every mutating operation is atomic: full rollback on any failure

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod gateway;
pub mod ledger;
pub mod lock;
pub mod metrics;
pub mod queue;
pub mod rate;
pub mod types;
pub mod vault;

// Re-exports
pub use collaborators::{
    AuthRegistrar, Clock, CollabResult, CollateralStore, OptionRegistry, PricingOracle,
    SystemClock, TradingVenue,
};
pub use config::{Config, EpochLockConfig};
pub use error::{Error, ErrorKind, Result};
pub use gateway::{ExecutionCounters, ExecutionLog};
pub use queue::PendingWithdrawal;
pub use types::{
    ActionKind, Address, Amount, AssetId, EventRecord, OptionKind, OptionSeries, Procedure,
    Quote, SeriesId, StrategyAction, VaultEvent,
};
pub use vault::{Collaborators, Vault};
