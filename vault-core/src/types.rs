//! Core types for the vault
//!
//! All public types carry serde derives so callers can persist or ship them
//! over a wire unchanged. Amounts are unsigned 128-bit integers; all rate
//! arithmetic is exact integer floor/ceiling division (see [`crate::rate`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Asset and share quantities
pub type Amount = u128;

/// Account identity (address-like key)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// Create new address
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Asset identifier (collateral, underlying, strike denomination)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(String);

impl AssetId {
    /// Create new asset id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an already-issued option series in the external registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeriesId(String);

impl SeriesId {
    /// Create new series id
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeriesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Option flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionKind {
    /// Right to buy the underlying at the strike
    Call,
    /// Right to sell the underlying at the strike
    Put,
}

/// Descriptor of a derivative instrument referenced by trade actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSeries {
    /// Expiration timestamp
    pub expiration: DateTime<Utc>,

    /// Strike price (in strike-asset units)
    pub strike: Amount,

    /// Call or put
    pub kind: OptionKind,

    /// Underlying asset
    pub underlying: AssetId,

    /// Strike denomination asset
    pub strike_asset: AssetId,

    /// Collateral asset backing the series
    pub collateral_asset: AssetId,
}

/// Native strategy action discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ActionKind {
    /// Write a new option series against pooled collateral
    Issue = 0,
    /// Buy an existing option series
    BuyOption = 1,
    /// Sell a held or written option series
    SellOption = 2,
    /// Close out a written series
    CloseOption = 3,
}

impl ActionKind {
    /// Decode a raw wire discriminant
    ///
    /// Unknown tags are a reachable error path by design; batches arriving
    /// from outside the process carry raw tags.
    pub fn from_tag(tag: u8) -> crate::Result<Self> {
        match tag {
            0 => Ok(ActionKind::Issue),
            1 => Ok(ActionKind::BuyOption),
            2 => Ok(ActionKind::SellOption),
            3 => Ok(ActionKind::CloseOption),
            other => Err(crate::Error::InvalidOperation(format!(
                "unknown action tag {}",
                other
            ))),
        }
    }

    /// Raw wire discriminant
    pub fn tag(&self) -> u8 {
        *self as u8
    }

    /// Whether this action commits collateral out of the reserve
    pub fn commits_collateral(&self) -> bool {
        matches!(self, ActionKind::Issue | ActionKind::BuyOption)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Issue => "issue",
            ActionKind::BuyOption => "buy_option",
            ActionKind::SellOption => "sell_option",
            ActionKind::CloseOption => "close_option",
        };
        write!(f, "{}", name)
    }
}

/// One native strategy action inside an operation batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyAction {
    /// Action discriminant
    pub kind: ActionKind,

    /// Option series the action trades
    pub series: OptionSeries,

    /// Collateral amount committed (Issue/Buy) or contracts moved (Sell/Close)
    pub amount: Amount,

    /// Premium bound the operator is willing to pay or accept
    pub premium_cap: Amount,
}

/// Wire form of a strategy action: raw tag, decoded before dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireAction {
    /// Raw action discriminant
    pub tag: u8,

    /// Option series
    pub series: OptionSeries,

    /// Amount (see [`StrategyAction::amount`])
    pub amount: Amount,

    /// Premium bound
    pub premium_cap: Amount,
}

impl WireAction {
    /// Decode into a typed action, rejecting unknown tags
    pub fn decode(self) -> crate::Result<StrategyAction> {
        Ok(StrategyAction {
            kind: ActionKind::from_tag(self.tag)?,
            series: self.series,
            amount: self.amount,
            premium_cap: self.premium_cap,
        })
    }
}

/// One procedure inside an operation batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Procedure {
    /// Opaque pass-through forwarded to the external venue uninterpreted
    VenuePassthrough {
        /// Raw payload the venue understands
        payload: Vec<u8>,
    },

    /// Native strategy actions interpreted by the gateway
    Strategy {
        /// Ordered actions
        actions: Vec<StrategyAction>,
    },
}

/// Quote returned by the pricing oracle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Premium for the quoted size
    pub premium: Amount,

    /// Delta in basis points (signed)
    pub delta_bps: i64,

    /// Venue fees for the trade
    pub fees: Amount,
}

/// Notification emitted by a completed state-mutating operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaultEvent {
    /// Collateral pulled in, shares minted at the floor rate
    Deposited {
        /// Account that supplied the collateral
        depositor: Address,
        /// Account credited with shares
        receiver: Address,
        /// Collateral pulled
        assets: Amount,
        /// Shares minted
        shares: Amount,
    },

    /// Exact shares minted, ceiling assets charged
    Minted {
        /// Account that supplied the collateral
        depositor: Address,
        /// Account credited with shares
        receiver: Address,
        /// Collateral charged
        assets: Amount,
        /// Shares minted
        shares: Amount,
    },

    /// Pending claim recorded at the front of the queue
    WithdrawalInitiated {
        /// Account whose shares back the claim
        owner: Address,
        /// Account the payout will go to
        receiver: Address,
        /// Shares claimed
        shares: Amount,
    },

    /// Front claim settled at the current rate
    WithdrawalSettled {
        /// Payout destination
        receiver: Address,
        /// Collateral released
        amount: Amount,
    },

    /// Native strategy action settled through the gateway
    ActionExecuted {
        /// Gateway call sequence number
        call_seq: u64,
        /// Per-action-kind sequence number
        action_seq: u64,
        /// Action discriminant
        kind: ActionKind,
        /// Series traded
        series: OptionSeries,
        /// Amount committed or moved
        amount: Amount,
    },

    /// Option series redeemed, collateral returned to reserve
    Redeemed {
        /// Redeemed series
        series: SeriesId,
        /// Collateral returned
        amount: Amount,
    },

    /// Operator identity rotated
    OperatorChanged {
        /// Previous operator
        previous: Address,
        /// New operator
        new_operator: Address,
    },
}

/// Event log entry wrapping a [`VaultEvent`] with identity and time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique event id
    pub event_id: Uuid,

    /// Emission timestamp
    pub at: DateTime<Utc>,

    /// Event payload
    pub event: VaultEvent,
}

impl EventRecord {
    /// Wrap an event with a fresh id and the given timestamp
    pub fn new(at: DateTime<Utc>, event: VaultEvent) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            at,
            event,
        }
    }
}
