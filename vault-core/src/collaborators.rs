//! External collaborator contracts
//!
//! Capability traits for everything the vault consumes from the outside
//! world. Failures cross these seams as plain strings and are wrapped into
//! the collaborator arm of [`crate::Error`] unmodified; the engine never
//! interprets or retries them.
//!
//! Collaborator implementations may call back into the vault before
//! returning; the vault's reentrancy guard rejects any nested mutating call.

use crate::types::{Address, Amount, OptionSeries, Procedure, Quote, SeriesId};
use chrono::{DateTime, Utc};

/// Result type crossing a collaborator seam
pub type CollabResult<T> = std::result::Result<T, String>;

/// Custody of the collateral asset
pub trait CollateralStore: Send + Sync {
    /// Pull `amount` of collateral from `from` into vault custody
    fn transfer_in(&self, from: &Address, amount: Amount) -> CollabResult<()>;

    /// Release `amount` of collateral from vault custody to `to`
    fn transfer_out(&self, to: &Address, amount: Amount) -> CollabResult<()>;

    /// Collateral balance attributed to `holder`
    fn balance_of(&self, holder: &Address) -> Amount;
}

/// External trading venue accepting operation batches
pub trait TradingVenue: Send + Sync {
    /// Execute a batch of procedures; failures propagate up uninterpreted
    fn operate(&self, batch: &[Procedure]) -> CollabResult<()>;
}

/// Registry of issued option series
pub trait OptionRegistry: Send + Sync {
    /// Redeem a settled series, returning the collateral amount released
    fn redeem(&self, series: &SeriesId) -> CollabResult<Amount>;
}

/// Pricing oracle for option series
pub trait PricingOracle: Send + Sync {
    /// Quote a trade of `amount` contracts in `series`
    fn quote_price(
        &self,
        series: &OptionSeries,
        amount: Amount,
        is_sell: bool,
        net_exposure: i128,
    ) -> CollabResult<Quote>;
}

/// Upstream access-control registration, invoked once at construction
pub trait AuthRegistrar: Send + Sync {
    /// Register `actor` as an authorized participant
    fn register(&self, actor: &Address) -> CollabResult<()>;
}

/// Wall-clock seam so tests can pin time
pub trait Clock: Send + Sync {
    /// Current time
    fn now(&self) -> DateTime<Utc>;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
