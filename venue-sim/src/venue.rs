//! Trading venue, registry, oracle, registrar, and clock simulators

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use vault_core::{
    Address, Amount, AuthRegistrar, Clock, CollabResult, OptionRegistry, OptionSeries,
    PricingOracle, Procedure, Quote, SeriesId, TradingVenue,
};

/// Trading venue that records every batch it accepts
///
/// A rejection message can be armed to make the next `operate` fail, for
/// exercising the caller's rollback path.
#[derive(Default)]
pub struct SimVenue {
    accepted: RwLock<Vec<Vec<Procedure>>>,
    reject_with: RwLock<Option<String>>,
}

impl SimVenue {
    /// Create an empty venue
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a rejection for the next batch
    pub fn reject_next(&self, reason: impl Into<String>) {
        *self.reject_with.write() = Some(reason.into());
    }

    /// Batches accepted so far, in arrival order
    pub fn accepted(&self) -> Vec<Vec<Procedure>> {
        self.accepted.read().clone()
    }
}

impl TradingVenue for SimVenue {
    fn operate(&self, batch: &[Procedure]) -> CollabResult<()> {
        if let Some(reason) = self.reject_with.write().take() {
            return Err(reason);
        }
        tracing::debug!(procedures = batch.len(), "batch accepted");
        self.accepted.write().push(batch.to_vec());
        Ok(())
    }
}

/// Series registry with scripted redemption payouts
///
/// Each expected payout redeems exactly once; redeeming an unknown or
/// already-redeemed series fails.
#[derive(Default)]
pub struct SimRegistry {
    payouts: RwLock<HashMap<SeriesId, Amount>>,
}

impl SimRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the collateral a future redemption of `series` returns
    pub fn expect_payout(&self, series: SeriesId, amount: Amount) {
        self.payouts.write().insert(series, amount);
    }
}

impl OptionRegistry for SimRegistry {
    fn redeem(&self, series: &SeriesId) -> CollabResult<Amount> {
        self.payouts
            .write()
            .remove(series)
            .ok_or_else(|| format!("series {} has nothing to redeem", series))
    }
}

/// Oracle quoting a flat premium rate in basis points of trade size
#[derive(Debug, Clone, Copy)]
pub struct FlatOracle {
    /// Premium charged per trade, in basis points of the amount
    pub premium_bps: u64,

    /// Fees charged per trade, in basis points of the amount
    pub fee_bps: u64,
}

impl Default for FlatOracle {
    fn default() -> Self {
        Self {
            premium_bps: 100,
            fee_bps: 10,
        }
    }
}

impl PricingOracle for FlatOracle {
    fn quote_price(
        &self,
        _series: &OptionSeries,
        amount: Amount,
        is_sell: bool,
        _net_exposure: i128,
    ) -> CollabResult<Quote> {
        let premium = amount
            .checked_mul(self.premium_bps as Amount)
            .ok_or_else(|| "quote size overflow".to_string())?
            / 10_000;
        Ok(Quote {
            premium,
            delta_bps: if is_sell { -2500 } else { 2500 },
            fees: amount * self.fee_bps as Amount / 10_000,
        })
    }
}

/// Registrar that records every registration it sees
#[derive(Default)]
pub struct RecordingRegistrar {
    registered: RwLock<Vec<Address>>,
}

impl RecordingRegistrar {
    /// Create an empty registrar
    pub fn new() -> Self {
        Self::default()
    }

    /// Actors registered so far
    pub fn registered(&self) -> Vec<Address> {
        self.registered.read().clone()
    }
}

impl AuthRegistrar for RecordingRegistrar {
    fn register(&self, actor: &Address) -> CollabResult<()> {
        self.registered.write().push(actor.clone());
        Ok(())
    }
}

/// Clock pinned to a settable instant
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Pin the clock at `now`
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Move the clock to `now`
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.write() = now;
    }

    /// Advance the clock by `seconds`
    pub fn advance_secs(&self, seconds: i64) {
        *self.now.write() += Duration::seconds(seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use vault_core::{ActionKind, AssetId, OptionKind, StrategyAction};

    fn series() -> OptionSeries {
        OptionSeries {
            expiration: Utc.with_ymd_and_hms(2026, 9, 25, 8, 0, 0).unwrap(),
            strike: 65_000,
            kind: OptionKind::Put,
            underlying: AssetId::new("WBTC"),
            strike_asset: AssetId::new("USDC"),
            collateral_asset: AssetId::new("USDC"),
        }
    }

    #[test]
    fn test_venue_records_and_rejects() {
        let venue = SimVenue::new();
        let batch = vec![Procedure::Strategy {
            actions: vec![StrategyAction {
                kind: ActionKind::Issue,
                series: series(),
                amount: 100,
                premium_cap: 0,
            }],
        }];

        venue.operate(&batch).unwrap();
        assert_eq!(venue.accepted().len(), 1);

        venue.reject_next("maintenance window");
        assert_eq!(
            venue.operate(&batch).unwrap_err(),
            "maintenance window".to_string()
        );
        // Rejection is one-shot
        venue.operate(&batch).unwrap();
        assert_eq!(venue.accepted().len(), 2);
    }

    #[test]
    fn test_registry_redeems_once() {
        let registry = SimRegistry::new();
        let id = SeriesId::new("put-65000-sep");
        registry.expect_payout(id.clone(), 4200);

        assert_eq!(registry.redeem(&id).unwrap(), 4200);
        assert!(registry.redeem(&id).is_err());
    }

    #[test]
    fn test_flat_oracle_quote() {
        let oracle = FlatOracle::default();
        let quote = oracle.quote_price(&series(), 10_000, false, 0).unwrap();
        assert_eq!(quote.premium, 100);
        assert_eq!(quote.fees, 10);
        assert_eq!(quote.delta_bps, 2500);

        let sell = oracle.quote_price(&series(), 10_000, true, 0).unwrap();
        assert_eq!(sell.delta_bps, -2500);
    }

    #[test]
    fn test_manual_clock() {
        let t0 = Utc.with_ymd_and_hms(2026, 8, 1, 0, 0, 0).unwrap();
        let clock = ManualClock::at(t0);
        assert_eq!(clock.now(), t0);
        clock.advance_secs(90);
        assert_eq!(clock.now(), t0 + Duration::seconds(90));
    }
}
