//! Error types for pool operations and the token collaborators behind them.

use thiserror::Error;

use crate::types::{AccountId, Asset};

/// Failure reported by an asset's token implementation when moving funds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("account {account} holds {available}, needs {needed}")]
    InsufficientBalance { account: AccountId, needed: u128, available: u128 },

    #[error("account {account} approved {approved} for the pool, needs {needed}")]
    InsufficientAllowance { account: AccountId, needed: u128, approved: u128 },

    /// The pool's own holdings cannot cover an outbound transfer.
    #[error("pool custody holds {available}, needs {needed}")]
    InsufficientCustody { needed: u128, available: u128 },

    #[error("account {0} is frozen")]
    Frozen(AccountId),

    #[error("balance overflow crediting {0}")]
    Overflow(AccountId),
}

/// Errors returned by [`Pool`](crate::pool::Pool) operations.
///
/// Every variant is raised either before any state is touched or after the
/// operation has been rolled back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Zero input, or an input too small to mint shares / produce output.
    #[error("amount must be positive and large enough to move the pool")]
    InvalidAmount,

    #[error("insufficient liquidity shares: requested {requested}, available {available}")]
    InsufficientShares { requested: u128, available: u128 },

    #[error("pool reserves are zero")]
    ZeroReserve,

    #[error("transfer of asset {asset} failed: {source}")]
    TransferFailure {
        asset: Asset,
        #[source]
        source: TransferError,
    },

    #[error("swap output {amount_out} is below the requested minimum {min_amount_out}")]
    SlippageExceeded { amount_out: u128, min_amount_out: u128 },

    #[error("arithmetic overflow")]
    Overflow,

    #[error("invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("pool invariant violated: {0}")]
    InvariantViolation(String),
}

impl PoolError {
    /// Short stable name of the error kind, used for reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            PoolError::InvalidAmount => "InvalidAmount",
            PoolError::InsufficientShares { .. } => "InsufficientShares",
            PoolError::ZeroReserve => "ZeroReserve",
            PoolError::TransferFailure { .. } => "TransferFailure",
            PoolError::SlippageExceeded { .. } => "SlippageExceeded",
            PoolError::Overflow => "Overflow",
            PoolError::InvalidConfig(_) => "InvalidConfig",
            PoolError::InvariantViolation(_) => "InvariantViolation",
        }
    }
}
