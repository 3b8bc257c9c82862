//! Ledger notifications
//!
//! Events are immutable records emitted by ledger operations and consumed by
//! the external monitoring process. A failed operation emits nothing.

use serde::{Deserialize, Serialize};
use types::ids::AccountId;

use crate::history::TransactionKind;
use crate::security::Role;

/// First funds-affecting contact with an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub account: AccountId,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposited {
    pub tx_id: u64,
    pub account: AccountId,
    pub amount: u128,
    pub new_balance: u128,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawn {
    pub tx_id: u64,
    pub account: AccountId,
    pub amount: u128,
    pub new_balance: u128,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transferred {
    pub tx_id: u64,
    pub from: AccountId,
    pub to: AccountId,
    pub amount: u128,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyModeToggled {
    pub enabled: bool,
    pub by: AccountId,
    pub timestamp: i64,
}

/// Raised alongside the regular event when the amount meets the threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LargeTransactionAlert {
    pub account: AccountId,
    pub amount: u128,
    pub kind: TransactionKind,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdated {
    pub account: AccountId,
    pub profile_hash: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAdded {
    pub account: AccountId,
    pub receipt_hash: String,
    pub index: usize,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleChanged {
    pub role: Role,
    pub account: AccountId,
    pub by: AccountId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyDrained {
    pub to: AccountId,
    pub amount: u128,
    pub timestamp: i64,
}

/// Enum wrapper for all ledger events, enabling uniform handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    AccountCreated(AccountCreated),
    Deposited(Deposited),
    Withdrawn(Withdrawn),
    Transferred(Transferred),
    EmergencyModeToggled(EmergencyModeToggled),
    LargeTransactionAlert(LargeTransactionAlert),
    ProfileUpdated(ProfileUpdated),
    ReceiptAdded(ReceiptAdded),
    Paused { by: AccountId },
    Unpaused { by: AccountId },
    RoleGranted(RoleChanged),
    RoleRevoked(RoleChanged),
    EmergencyDrained(EmergencyDrained),
}

impl LedgerEvent {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            LedgerEvent::AccountCreated(_) => "account_created",
            LedgerEvent::Deposited(_) => "deposit",
            LedgerEvent::Withdrawn(_) => "withdrawal",
            LedgerEvent::Transferred(_) => "transfer",
            LedgerEvent::EmergencyModeToggled(_) => "emergency_mode_toggled",
            LedgerEvent::LargeTransactionAlert(_) => "large_transaction_alert",
            LedgerEvent::ProfileUpdated(_) => "profile_updated",
            LedgerEvent::ReceiptAdded(_) => "receipt_added",
            LedgerEvent::Paused { .. } => "paused",
            LedgerEvent::Unpaused { .. } => "unpaused",
            LedgerEvent::RoleGranted(_) => "role_granted",
            LedgerEvent::RoleRevoked(_) => "role_revoked",
            LedgerEvent::EmergencyDrained(_) => "emergency_drained",
        }
    }
}
