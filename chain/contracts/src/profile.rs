//! Profile store: per-account off-chain reference plus a capped receipt list
//!
//! Hashes are opaque references to off-chain documents. The profile hash is
//! overwritable; receipts are append-only and bounded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use types::ids::AccountId;

use crate::errors::LedgerError;
use crate::events::{ProfileUpdated, ReceiptAdded};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub profile_hash: String,
    pub receipts: Vec<String>,
    pub last_updated: i64,
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    records: HashMap<AccountId, ProfileRecord>,
    max_receipts: usize,
}

impl ProfileStore {
    pub fn new(max_receipts: usize) -> Self {
        Self {
            records: HashMap::new(),
            max_receipts,
        }
    }

    /// Overwrite the account's profile reference.
    pub fn set_profile(
        &mut self,
        account: AccountId,
        hash: &str,
        now: i64,
    ) -> Result<ProfileUpdated, LedgerError> {
        if hash.is_empty() {
            return Err(LedgerError::InvalidReference);
        }
        let record = self.records.entry(account).or_default();
        record.profile_hash = hash.to_string();
        record.last_updated = now;
        Ok(ProfileUpdated {
            account,
            profile_hash: hash.to_string(),
            timestamp: now,
        })
    }

    /// Append a receipt reference, refusing once the cap is reached.
    pub fn add_receipt(
        &mut self,
        account: AccountId,
        hash: &str,
        now: i64,
    ) -> Result<ReceiptAdded, LedgerError> {
        if hash.is_empty() {
            return Err(LedgerError::InvalidReference);
        }
        let current = self.receipt_count_of(&account);
        if current >= self.max_receipts {
            return Err(LedgerError::MaxReceiptsExceeded {
                current,
                max: self.max_receipts,
            });
        }
        let record = self.records.entry(account).or_default();
        record.receipts.push(hash.to_string());
        record.last_updated = now;
        Ok(ReceiptAdded {
            account,
            receipt_hash: hash.to_string(),
            index: current,
            timestamp: now,
        })
    }

    /// Profile reference, empty if never set.
    pub fn profile_of(&self, account: &AccountId) -> &str {
        self.records
            .get(account)
            .map_or("", |r| r.profile_hash.as_str())
    }

    /// Receipts in insertion order.
    pub fn receipts_of(&self, account: &AccountId) -> &[String] {
        self.records
            .get(account)
            .map(|r| r.receipts.as_slice())
            .unwrap_or(&[])
    }

    pub fn receipt_count_of(&self, account: &AccountId) -> usize {
        self.receipts_of(account).len()
    }

    pub fn record_of(&self, account: &AccountId) -> Option<&ProfileRecord> {
        self.records.get(account)
    }

    pub fn max_receipts(&self) -> usize {
        self.max_receipts
    }
}
