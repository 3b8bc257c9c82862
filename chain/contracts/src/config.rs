//! Ledger configuration and one-time initialization parameters

use serde::{Deserialize, Serialize};
use types::ids::AccountId;
use types::numeric::NATIVE_UNIT;

use crate::errors::{ConfigError, InvalidConfig};
use crate::security::Role;

/// Feed prices carry 8 decimals.
pub const PRICE_DECIMALS: u32 = 8;

/// Tunable ledger parameters. Defaults reproduce the deployed constants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Amount (base units) at or above which a large-transaction alert fires.
    pub large_transaction_threshold: u128,
    /// Maximum accepted age of a price reading, in seconds.
    pub oracle_max_age_secs: i64,
    /// Receipt hashes kept per account.
    pub max_receipts: usize,
    /// Annual interest rate, in percent.
    pub base_interest_rate_pct: u128,
    /// Added to the rate when the price exceeds `high_price_threshold`.
    pub high_price_bonus_pct: u128,
    /// Quote price (feed scale) above which the bonus applies.
    pub high_price_threshold: i128,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            large_transaction_threshold: NATIVE_UNIT,
            oracle_max_age_secs: 3600,
            max_receipts: 50,
            base_interest_rate_pct: 5,
            high_price_bonus_pct: 2,
            high_price_threshold: 2000 * 10i128.pow(PRICE_DECIMALS),
        }
    }
}

impl LedgerConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable a ledger feature outright.
    pub fn validate(&self) -> Result<(), InvalidConfig> {
        fn invalid(field: &'static str, reason: &'static str) -> Result<(), InvalidConfig> {
            Err(InvalidConfig { field, reason })
        }
        if self.large_transaction_threshold == 0 {
            return invalid("large_transaction_threshold", "must be positive");
        }
        if self.oracle_max_age_secs <= 0 {
            return invalid("oracle_max_age_secs", "must be positive");
        }
        if self.max_receipts == 0 {
            return invalid("max_receipts", "must be positive");
        }
        if self.high_price_threshold <= 0 {
            return invalid("high_price_threshold", "must be positive");
        }
        Ok(())
    }
}

/// Parameters for `Bank::initialize`.
#[derive(Debug, Clone)]
pub struct InitParams {
    pub owner: AccountId,
    /// Roles granted at deployment in addition to the owner's `Admin`.
    pub initial_roles: Vec<(Role, AccountId)>,
    pub config: LedgerConfig,
}

impl InitParams {
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            initial_roles: Vec::new(),
            config: LedgerConfig::default(),
        }
    }

    pub fn with_role(mut self, role: Role, identity: AccountId) -> Self {
        self.initial_roles.push((role, identity));
        self
    }

    pub fn with_config(mut self, config: LedgerConfig) -> Self {
        self.config = config;
        self
    }
}
