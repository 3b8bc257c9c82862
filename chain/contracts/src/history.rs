//! Per-account recent transaction history
//!
//! A fixed ring of `HISTORY_CAPACITY` slots per account, written at
//! `sequence % HISTORY_CAPACITY` where `sequence` is the account's transaction
//! count before the write. This is a recency window; entries older than the
//! last ten are overwritten and gone.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::AccountId;

pub const HISTORY_CAPACITY: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionKind {
    #[default]
    Deposit,
    Withdrawal,
    Transfer,
}

/// One history slot. A default (all-zero) slot means "no transaction".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub timestamp: i64,
    pub amount: u128,
    pub kind: TransactionKind,
    pub block_reference: u64,
}

impl Transaction {
    /// True for a slot that was never written.
    pub fn is_vacant(&self) -> bool {
        *self == Transaction::default()
    }
}

pub type HistoryRing = [Transaction; HISTORY_CAPACITY];

#[derive(Debug, Clone, Default)]
pub struct TransactionHistory {
    rings: HashMap<AccountId, HistoryRing>,
}

impl TransactionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `tx` into the slot for `sequence`, overwriting whatever was there.
    pub fn record(&mut self, account: AccountId, sequence: u32, tx: Transaction) {
        let ring = self
            .rings
            .entry(account)
            .or_insert([Transaction::default(); HISTORY_CAPACITY]);
        ring[sequence as usize % HISTORY_CAPACITY] = tx;
    }

    /// The full ring as stored. Unknown accounts get an all-vacant ring.
    pub fn recent(&self, account: &AccountId) -> HistoryRing {
        self.rings
            .get(account)
            .copied()
            .unwrap_or([Transaction::default(); HISTORY_CAPACITY])
    }

    /// Pre-image of an account's ring, for rollback.
    pub(crate) fn snapshot(&self, account: &AccountId) -> Option<HistoryRing> {
        self.rings.get(account).copied()
    }

    pub(crate) fn restore(&mut self, account: AccountId, ring: Option<HistoryRing>) {
        match ring {
            Some(ring) => {
                self.rings.insert(account, ring);
            }
            None => {
                self.rings.remove(&account);
            }
        }
    }
}
