//! Operator gateway internals
//!
//! Batch validation, collateral-commitment accounting, and the execution
//! log backing the audit trail. The gateway performs no profitability or
//! slippage verification: the operator path is a deliberate trust boundary,
//! and depositors rely on the operator entirely for it.

use crate::types::{ActionKind, Amount, Procedure, StrategyAction};
use crate::{Error, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Monotonic counters over settled trade instructions
///
/// Auditability only; nothing branches on these.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionCounters {
    /// Gateway calls dispatched
    pub calls: u64,
    /// Issue actions settled
    pub issued: u64,
    /// BuyOption actions settled
    pub bought: u64,
    /// SellOption actions settled
    pub sold: u64,
    /// CloseOption actions settled
    pub closed: u64,
}

/// Mutable execution log held by the vault
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    counters: ExecutionCounters,
}

impl ExecutionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a gateway call, returning its sequence number
    pub fn next_call(&mut self) -> u64 {
        self.counters.calls += 1;
        self.counters.calls
    }

    /// Record one settled action, returning its per-kind sequence number
    pub fn record(&mut self, kind: ActionKind) -> u64 {
        let counter = match kind {
            ActionKind::Issue => &mut self.counters.issued,
            ActionKind::BuyOption => &mut self.counters.bought,
            ActionKind::SellOption => &mut self.counters.sold,
            ActionKind::CloseOption => &mut self.counters.closed,
        };
        *counter += 1;
        *counter
    }

    /// Snapshot of the counters
    pub fn counters(&self) -> ExecutionCounters {
        self.counters
    }
}

/// Validate a batch before any dispatch
///
/// Rejects empty batches, empty strategy procedures, zero-amount actions,
/// and any series expiring more than `horizon_days` past `now`.
pub fn validate_batch(
    batch: &[Procedure],
    now: DateTime<Utc>,
    horizon_days: i64,
) -> Result<()> {
    if batch.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let horizon = now + Duration::days(horizon_days);
    for procedure in batch {
        match procedure {
            Procedure::VenuePassthrough { .. } => {}
            Procedure::Strategy { actions } => {
                if actions.is_empty() {
                    return Err(Error::InvalidOperation(
                        "strategy procedure carries no actions".to_string(),
                    ));
                }
                for action in actions {
                    validate_action(action, horizon, horizon_days)?;
                }
            }
        }
    }
    Ok(())
}

fn validate_action(
    action: &StrategyAction,
    horizon: DateTime<Utc>,
    horizon_days: i64,
) -> Result<()> {
    if action.amount == 0 {
        return Err(Error::InvalidOperation(format!(
            "zero-amount {} action",
            action.kind
        )));
    }
    if action.series.expiration > horizon {
        return Err(Error::ExpirationBeyondHorizon {
            expiration: action.series.expiration,
            horizon_days,
        });
    }
    Ok(())
}

/// Total collateral the batch commits out of the reserve
///
/// Issue and BuyOption commit their amounts; SellOption and CloseOption do
/// not touch the reserve at this layer (premium receipts show up through
/// the normal reserve-balance flow instead).
pub fn committed_amount(batch: &[Procedure]) -> Result<Amount> {
    let mut total: Amount = 0;
    for procedure in batch {
        if let Procedure::Strategy { actions } = procedure {
            for action in actions {
                if action.kind.commits_collateral() {
                    total = total
                        .checked_add(action.amount)
                        .ok_or(Error::Overflow("batch commitment"))?;
                }
            }
        }
    }
    Ok(total)
}
