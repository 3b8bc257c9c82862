//! Outbound value movement
//!
//! An outbound payment hands control to the receiving side together with a
//! handle to the ledger, the same way a value transfer on chain runs the
//! recipient's code. Whatever the recipient does with that handle happens
//! while the caller's operation is still in flight.

use thiserror::Error;

use crate::bank::Bank;

/// Refusal reported by a payee.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("payment rejected: {0}")]
pub struct PaymentRejected(pub String);

/// Receiving side of an outbound payment.
pub trait Payee {
    /// Take delivery of `amount` base units. Returning an error fails the
    /// paying operation as a whole.
    fn accept(&mut self, ledger: &mut Bank, amount: u128) -> Result<(), PaymentRejected>;
}

/// Plain externally owned wallet: accepts everything, runs no code.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wallet {
    pub received: u128,
}

impl Wallet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Payee for Wallet {
    fn accept(&mut self, _ledger: &mut Bank, amount: u128) -> Result<(), PaymentRejected> {
        self.received = self
            .received
            .checked_add(amount)
            .ok_or_else(|| PaymentRejected("wallet balance overflow".to_string()))?;
        Ok(())
    }
}
