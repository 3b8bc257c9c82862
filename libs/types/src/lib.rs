//! Types library for the custodial ledger
//!
//! Shared definitions used by the on-chain contract crate and by off-chain
//! collaborators that read its state.
//!
//! # Modules
//! - `ids`: Participant identities (AccountId, zero identity)
//! - `numeric`: Bounded-width amount domains and native-unit helpers

pub mod ids;
pub mod numeric;

pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
    pub use crate::numeric::*;
}
