//! Price oracle gateway and interest estimation
//!
//! Wraps an external round-based price feed. Readings are rejected when the
//! price is non-positive, the round is incomplete, or the reading is older
//! than the configured staleness bound.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

use crate::config::LedgerConfig;
use crate::errors::OracleError;
use types::numeric::NATIVE_UNIT;

pub const SECONDS_PER_YEAR: i64 = 365 * 24 * 60 * 60;

/// Raw round data as reported by a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u64,
    pub answer: i128,
    pub started_at: i64,
    pub updated_at: i64,
    pub answered_in_round: u64,
}

impl RoundData {
    /// A round is complete once it has a timestamp and was answered in
    /// (or after) its own round.
    pub fn is_complete(&self) -> bool {
        self.updated_at != 0 && self.answered_in_round >= self.round_id
    }
}

/// External price source.
pub trait PriceFeed: Send + Sync {
    fn latest_round_data(&self) -> RoundData;
}

/// Validated price reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceReading {
    pub price: i128,
    pub updated_at: i64,
}

/// Gateway validating readings from the wired feed.
pub struct PriceOracle {
    feed: Box<dyn PriceFeed>,
    max_age_secs: i64,
}

impl PriceOracle {
    pub fn new(feed: Box<dyn PriceFeed>, max_age_secs: i64) -> Self {
        Self { feed, max_age_secs }
    }

    /// Latest validated price as of `now`.
    pub fn latest_price(&self, now: i64) -> Result<PriceReading, OracleError> {
        let round = self.feed.latest_round_data();

        if round.answer <= 0 || !round.is_complete() {
            warn!(
                round_id = round.round_id,
                answer = %round.answer,
                "Rejecting invalid price data"
            );
            return Err(OracleError::InvalidPriceData);
        }

        if now.saturating_sub(round.updated_at) > self.max_age_secs {
            warn!(
                updated_at = round.updated_at,
                now,
                max_age = self.max_age_secs,
                "Rejecting stale price data"
            );
            return Err(OracleError::StaleOracleData {
                last_update: round.updated_at,
                max_age: self.max_age_secs,
            });
        }

        Ok(PriceReading {
            price: round.answer,
            updated_at: round.updated_at,
        })
    }
}

impl fmt::Debug for PriceOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceOracle")
            .field("max_age_secs", &self.max_age_secs)
            .finish_non_exhaustive()
    }
}

/// `balance * price / NATIVE_UNIT`, floored. Split so the product stays in
/// range for any balance the 96-bit aggregate admits.
pub fn quote_value(balance: u128, price: i128) -> Option<u128> {
    let price = u128::try_from(price).ok()?;
    let whole = (balance / NATIVE_UNIT).checked_mul(price)?;
    let frac = (balance % NATIVE_UNIT).checked_mul(price)? / NATIVE_UNIT;
    whole.checked_add(frac)
}

/// Simple interest over `elapsed` seconds, capped at one year:
/// `balance * rate * min(elapsed, 1y) / (100 * 1y)`.
pub fn accrued_interest(
    balance: u128,
    price: i128,
    elapsed_secs: i64,
    config: &LedgerConfig,
) -> Option<u128> {
    let mut rate = config.base_interest_rate_pct;
    if price > config.high_price_threshold {
        rate = rate.checked_add(config.high_price_bonus_pct)?;
    }
    let elapsed = elapsed_secs.clamp(0, SECONDS_PER_YEAR) as u128;
    let denominator = 100 * SECONDS_PER_YEAR as u128;
    balance
        .checked_mul(rate)?
        .checked_mul(elapsed)
        .map(|n| n / denominator)
}

/// Feed with a manually set round, shareable between the ledger and whoever
/// drives it.
#[derive(Debug, Clone, Default)]
pub struct ManualFeed {
    round: Arc<Mutex<RoundData>>,
}

impl ManualFeed {
    /// Feed reporting a complete round with `price` at `updated_at`.
    pub fn new(price: i128, updated_at: i64) -> Self {
        let feed = Self::default();
        feed.set_price(price, updated_at);
        feed
    }

    /// Publish a new complete round.
    pub fn set_price(&self, price: i128, updated_at: i64) {
        let mut round = self.round.lock().unwrap_or_else(PoisonError::into_inner);
        let next_id = round.round_id + 1;
        *round = RoundData {
            round_id: next_id,
            answer: price,
            started_at: updated_at,
            updated_at,
            answered_in_round: next_id,
        };
    }

    /// Publish an arbitrary round, complete or not.
    pub fn set_round(&self, data: RoundData) {
        *self.round.lock().unwrap_or_else(PoisonError::into_inner) = data;
    }
}

impl PriceFeed for ManualFeed {
    fn latest_round_data(&self) -> RoundData {
        *self.round.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
