//! On-chain custodial ledger
//!
//! Holds per-account native balances in a single shared store and exposes
//! deposit, withdrawal and in-ledger transfer, plus administrative controls
//! (pause, emergency drain, role grants), price-based interest estimation and
//! bounded off-chain reference storage.
//!
//! # Modules
//! - `errors`: Ledger and oracle error types
//! - `events`: Notifications consumed by the monitoring process
//! - `security`: Reentrancy guard, capability roles, pause switch
//! - `config`: Tunable parameters and initialization inputs
//! - `history`: Per-account ten-slot transaction ring
//! - `oracle`: Price feed gateway and interest math
//! - `profile`: Profile references and capped receipt lists
//! - `payment`: Outbound payment hand-off
//! - `bank`: The ledger store and its operations

pub mod errors;
pub mod events;
pub mod security;
pub mod config;
pub mod history;
pub mod oracle;
pub mod profile;
pub mod payment;
pub mod bank;

/// Contract ABI version, frozen after release
pub const CONTRACT_ABI_VERSION: &str = "1.0.0";
