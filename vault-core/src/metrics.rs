//! Metrics collection for observability
//!
//! Prometheus metrics over the vault's operation paths.
//!
//! # Metrics
//!
//! - `vault_deposits_total` - Deposits accepted
//! - `vault_mints_total` - Exact-share mints accepted
//! - `vault_withdrawals_initiated_total` - Pending claims recorded
//! - `vault_settlements_total` - Claims settled
//! - `vault_actions_executed_total` - Strategy actions settled
//! - `vault_reserve` - Current uncommitted reserve
//! - `vault_queue_depth` - Live pending claims

use prometheus::{IntCounter, IntGauge, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Deposits accepted
    pub deposits_total: IntCounter,

    /// Mints accepted
    pub mints_total: IntCounter,

    /// Pending claims recorded
    pub withdrawals_initiated_total: IntCounter,

    /// Claims settled
    pub settlements_total: IntCounter,

    /// Strategy actions settled
    pub actions_executed_total: IntCounter,

    /// Current uncommitted reserve (saturated at i64::MAX)
    pub reserve: IntGauge,

    /// Live pending claims
    pub queue_depth: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create a collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let deposits_total =
            IntCounter::new("vault_deposits_total", "Deposits accepted")?;
        registry.register(Box::new(deposits_total.clone()))?;

        let mints_total = IntCounter::new("vault_mints_total", "Exact-share mints accepted")?;
        registry.register(Box::new(mints_total.clone()))?;

        let withdrawals_initiated_total = IntCounter::new(
            "vault_withdrawals_initiated_total",
            "Pending claims recorded",
        )?;
        registry.register(Box::new(withdrawals_initiated_total.clone()))?;

        let settlements_total =
            IntCounter::new("vault_settlements_total", "Claims settled")?;
        registry.register(Box::new(settlements_total.clone()))?;

        let actions_executed_total = IntCounter::new(
            "vault_actions_executed_total",
            "Strategy actions settled",
        )?;
        registry.register(Box::new(actions_executed_total.clone()))?;

        let reserve = IntGauge::new("vault_reserve", "Current uncommitted reserve")?;
        registry.register(Box::new(reserve.clone()))?;

        let queue_depth = IntGauge::new("vault_queue_depth", "Live pending claims")?;
        registry.register(Box::new(queue_depth.clone()))?;

        Ok(Self {
            deposits_total,
            mints_total,
            withdrawals_initiated_total,
            settlements_total,
            actions_executed_total,
            reserve,
            queue_depth,
            registry,
        })
    }

    /// Update the reserve gauge, saturating above i64::MAX
    pub fn set_reserve(&self, reserve: u128) {
        self.reserve.set(reserve.min(i64::MAX as u128) as i64);
    }

    /// Update the queue depth gauge
    pub fn set_queue_depth(&self, depth: usize) {
        self.queue_depth.set(depth.min(i64::MAX as usize) as i64);
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}
