//! Bounded-width integer domains for ledger amounts
//!
//! Balances are native `u128` base units. The aggregate deposit total lives in
//! a narrower 96-bit domain, so it gets its own newtype that refuses to leave
//! that range instead of silently widening. Counters use `u32` and rely on the
//! standard `checked_*` methods.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Decimal places of the native currency.
pub const NATIVE_DECIMALS: u32 = 18;

/// One whole unit of native currency, in base units.
pub const NATIVE_UNIT: u128 = 1_000_000_000_000_000_000;

/// Whole native units expressed in base units.
pub const fn native(whole: u64) -> u128 {
    whole as u128 * NATIVE_UNIT
}

/// Value does not fit the target width.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("value {value} exceeds the {bits}-bit domain")]
pub struct OutOfRange {
    pub value: u128,
    pub bits: u32,
}

/// Unsigned integer restricted to 96 bits.
///
/// Invariant: the inner value is always `<= U96::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u128", into = "u128")]
pub struct U96(u128);

impl U96 {
    pub const BITS: u32 = 96;
    pub const ZERO: U96 = U96(0);
    pub const MAX: U96 = U96((1u128 << 96) - 1);

    /// Wrap a value, returning `None` if it exceeds 96 bits.
    pub fn new(value: u128) -> Option<Self> {
        if value > Self::MAX.0 {
            None
        } else {
            Some(Self(value))
        }
    }

    pub fn get(self) -> u128 {
        self.0
    }

    /// Add, failing if the result leaves the 96-bit domain.
    pub fn checked_add(self, rhs: u128) -> Option<Self> {
        self.0.checked_add(rhs).and_then(Self::new)
    }

    /// Subtract, failing on underflow.
    pub fn checked_sub(self, rhs: u128) -> Option<Self> {
        self.0.checked_sub(rhs).map(Self)
    }
}

impl TryFrom<u128> for U96 {
    type Error = OutOfRange;

    fn try_from(value: u128) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(OutOfRange {
            value,
            bits: Self::BITS,
        })
    }
}

impl From<U96> for u128 {
    fn from(value: U96) -> Self {
        value.0
    }
}

impl fmt::Display for U96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render base units as a decimal amount of native currency.
///
/// `Decimal` carries a 96-bit mantissa, so every `U96` value renders exactly;
/// wider balances return `None`.
pub fn to_native_decimal(base_units: u128) -> Option<Decimal> {
    let mantissa = i128::try_from(base_units).ok()?;
    Decimal::try_from_i128_with_scale(mantissa, NATIVE_DECIMALS).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_u96_bounds() {
        assert_eq!(U96::MAX.get(), 79_228_162_514_264_337_593_543_950_335);
        assert!(U96::new(U96::MAX.get()).is_some());
        assert!(U96::new(U96::MAX.get() + 1).is_none());
    }

    #[test]
    fn test_u96_checked_add_at_boundary() {
        let near = U96::new(U96::MAX.get() - 1).unwrap();
        assert_eq!(near.checked_add(1), Some(U96::MAX));
        assert_eq!(near.checked_add(2), None);
        assert_eq!(U96::MAX.checked_add(u128::MAX), None);
    }

    #[test]
    fn test_u96_checked_sub() {
        let v = U96::new(10).unwrap();
        assert_eq!(v.checked_sub(4), U96::new(6));
        assert_eq!(v.checked_sub(11), None);
    }

    #[test]
    fn test_u96_serde_rejects_out_of_range() {
        let json = serde_json::to_string(&U96::MAX).unwrap();
        let back: U96 = serde_json::from_str(&json).unwrap();
        assert_eq!(back, U96::MAX);

        let too_wide = (U96::MAX.get() + 1).to_string();
        assert!(serde_json::from_str::<U96>(&too_wide).is_err());
    }

    #[test]
    fn test_native_helpers() {
        assert_eq!(native(3), 3 * NATIVE_UNIT);
        assert_eq!(to_native_decimal(native(5)), Some(Decimal::from(5)));
        assert_eq!(
            to_native_decimal(NATIVE_UNIT / 2),
            Some(Decimal::new(5, 1))
        );
    }

    #[test]
    fn test_native_decimal_covers_u96() {
        assert!(to_native_decimal(U96::MAX.get()).is_some());
        assert!(to_native_decimal(U96::MAX.get() + 1).is_none());
    }

    proptest! {
        #[test]
        fn fuzz_checked_add_never_leaves_domain(a in 0u128..=U96::MAX.get(), b in any::<u128>()) {
            let base = U96::new(a).unwrap();
            match base.checked_add(b) {
                Some(sum) => {
                    prop_assert!(sum <= U96::MAX);
                    prop_assert_eq!(sum.get(), a + b);
                }
                None => prop_assert!(a.checked_add(b).map_or(true, |s| s > U96::MAX.get())),
            }
        }
    }
}
