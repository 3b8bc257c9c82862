//! Contract-specific error types
//!
//! Every error is terminal for the current call: the ledger discards the whole
//! set of intended mutations before returning it.

use thiserror::Error;
use types::ids::AccountId;

use crate::security::Role;

/// Price feed errors surfaced by the oracle gateway.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OracleError {
    #[error("Invalid price data from feed")]
    InvalidPriceData,

    #[error("Stale oracle data: last update {last_update}, max age {max_age}s")]
    StaleOracleData { last_update: i64, max_age: i64 },
}

/// A configuration value outside its accepted range.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} {reason}")]
pub struct InvalidConfig {
    pub field: &'static str,
    pub reason: &'static str,
}

/// Failure loading a `LedgerConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] InvalidConfig),
}

/// Ledger errors covering accounts, administration, profiles and payments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Invalid amount: must be positive and within domain")]
    InvalidAmount,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: u128, available: u128 },

    #[error("Invalid recipient: zero identity")]
    InvalidRecipient,

    #[error("Cannot transfer to self")]
    TransferToSelf,

    #[error("Unauthorized: {caller} lacks role {required_role:?}")]
    UnauthorizedAccess { caller: AccountId, required_role: Role },

    #[error("Operation paused")]
    OperationPaused,

    #[error("Ledger is not paused")]
    NotPaused,

    #[error("Reentrancy detected")]
    Reentrancy,

    #[error("Invalid reference: hash must not be empty")]
    InvalidReference,

    #[error("Max receipts exceeded: {current} of {max}")]
    MaxReceiptsExceeded { current: usize, max: usize },

    #[error("Payment transfer failed: {reason}")]
    PaymentTransferFailed { reason: String },

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Invalid config: {0}")]
    InvalidConfig(#[from] InvalidConfig),
}
