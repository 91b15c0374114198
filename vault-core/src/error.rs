//! Error types for the vault engine
//!
//! Every failed operation surfaces exactly one terminal error; the engine
//! performs no internal retries. [`Error::kind`] classifies each variant into
//! the coarse taxonomy callers branch on.

use crate::types::{Address, Amount};
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for vault operations
pub type Result<T> = std::result::Result<T, Error>;

/// Vault errors
#[derive(Error, Debug)]
pub enum Error {
    // ---- Validation ----
    /// Deposit amount converts to zero shares
    #[error("deposit would mint zero shares")]
    ZeroShares,

    /// Mint request converts to zero assets
    #[error("mint would charge zero assets")]
    ZeroAssets,

    /// Withdrawal initiated with a zero share amount
    #[error("withdrawal amount must be nonzero")]
    InsufficientAmount,

    /// Malformed or unrecognized operation batch content
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Empty operation batch submitted to the gateway
    #[error("operation batch is empty")]
    EmptyBatch,

    // ---- Authorization ----
    /// Caller is not the vault operator
    #[error("caller {caller} is not the operator {operator}")]
    NotOperator {
        /// Address that attempted the call
        caller: Address,
        /// Current operator identity
        operator: Address,
    },

    // ---- State ----
    /// Requested withdrawal exceeds the caller's share balance
    #[error("withdrawal of {requested} shares exceeds balance {balance}")]
    WithdrawalAmount {
        /// Shares requested
        requested: Amount,
        /// Caller's live balance
        balance: Amount,
    },

    /// Requested withdrawal plus the receiver's pending claim exceeds balance
    #[error("withdrawal of {requested} shares plus pending {pending} exceeds balance {balance}")]
    PendingWithdrawalAmount {
        /// Shares requested
        requested: Amount,
        /// Receiver's already-pending claim
        pending: Amount,
        /// Caller's live balance
        balance: Amount,
    },

    /// Receiver already has a live pending withdrawal
    #[error("receiver {0} already has a pending withdrawal")]
    PendingWithdrawalAddress(Address),

    /// Settlement requested on an empty queue
    #[error("no pending withdrawals")]
    NoPendingWithdrawals,

    /// Claim owner no longer holds the claimed shares at settlement time
    #[error("owner {owner} holds {balance} shares, pending claim is {claimed}")]
    InsufficientShares {
        /// Account the claim burns from
        owner: Address,
        /// Owner's live balance
        balance: Amount,
        /// Shares the claim was recorded for
        claimed: Amount,
    },

    /// Reserve cannot cover the requested outflow
    #[error("insufficient reserve: {available} available, {required} required")]
    InsufficientReserve {
        /// Uncommitted reserve on hand
        available: Amount,
        /// Amount the operation needs
        required: Amount,
    },

    /// Reserve accounting is internally inconsistent (defensive)
    #[error("reserve accounting inconsistent: {0}")]
    InconsistentReserve(String),

    /// Arithmetic overflow in share or reserve bookkeeping (defensive)
    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    /// Nested mutating call while another mutation is in flight
    #[error("reentrant mutating call rejected")]
    Reentrancy,

    // ---- Temporal ----
    /// Epoch lock currently disables liquidity operations
    #[error("liquidity locked until {unlock_at}")]
    LiquidityLocked {
        /// When the current lock window ends
        unlock_at: DateTime<Utc>,
    },

    /// Option expiration lies beyond the allowed horizon
    #[error("expiration {expiration} is more than {horizon_days} days out")]
    ExpirationBeyondHorizon {
        /// Expiration carried by the offending action
        expiration: DateTime<Utc>,
        /// Configured horizon
        horizon_days: i64,
    },

    // ---- Collaborator ----
    /// Collateral store call failed
    #[error("collateral store failure: {0}")]
    Collateral(String),

    /// Trading venue call failed
    #[error("trading venue failure: {0}")]
    Venue(String),

    /// Option registry call failed
    #[error("option registry failure: {0}")]
    Registry(String),

    /// Pricing oracle call failed
    #[error("pricing oracle failure: {0}")]
    Oracle(String),

    /// Authorization registrar call failed at construction
    #[error("authorization registrar failure: {0}")]
    Registrar(String),

    // ---- Config ----
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Zero amounts, malformed batches
    Validation,
    /// Caller lacks the operator capability
    Authorization,
    /// Queue, ledger, or reserve state rejects the operation
    State,
    /// Epoch lock or expiration horizon
    Temporal,
    /// External collaborator failure, propagated unmodified
    Collaborator,
    /// Configuration or IO problem outside the operation path
    Config,
}

impl Error {
    /// Classify this error into the coarse taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ZeroShares
            | Self::ZeroAssets
            | Self::InsufficientAmount
            | Self::InvalidOperation(_)
            | Self::EmptyBatch => ErrorKind::Validation,
            Self::NotOperator { .. } => ErrorKind::Authorization,
            Self::WithdrawalAmount { .. }
            | Self::PendingWithdrawalAmount { .. }
            | Self::PendingWithdrawalAddress(_)
            | Self::NoPendingWithdrawals
            | Self::InsufficientShares { .. }
            | Self::InsufficientReserve { .. }
            | Self::InconsistentReserve(_)
            | Self::Overflow(_)
            | Self::Reentrancy => ErrorKind::State,
            Self::LiquidityLocked { .. } | Self::ExpirationBeyondHorizon { .. } => {
                ErrorKind::Temporal
            }
            Self::Collateral(_)
            | Self::Venue(_)
            | Self::Registry(_)
            | Self::Oracle(_)
            | Self::Registrar(_) => ErrorKind::Collaborator,
            Self::Config(_) | Self::Io(_) => ErrorKind::Config,
        }
    }
}
