//! # Quantity Module
//!
//! Fixed-point quantities for items sold by unit or by weight.
//!
//! A `Quantity` counts thousandths of a unit, the same way `Money` counts
//! cents: `0.350 kg` is stored as `350`, two cans as `2000`. Stock levels
//! and sale-line quantities share this type, so a conditional stock
//! decrement in SQL is plain integer arithmetic.
//!
//! ## JSON Representation
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Accepted on input           Stored          Emitted         │
//! │  ─────────────────           ──────          ───────         │
//! │  2          (number)    ──►  2000     ──►   "2.000"          │
//! │  0.35       (number)    ──►   350     ──►   "0.350"          │
//! │  "1.125"    (string)    ──►  1125     ──►   "1.125"          │
//! │  0.0001     (number)    ──►  ValidationError (too precise)   │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub};

use crate::error::ValidationError;

/// Number of fractional digits a quantity carries.
pub const QUANTITY_SCALE: u32 = 3;

const MILLI_PER_UNIT: i64 = 1000;

/// A signed quantity in thousandths of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(i64);

impl Quantity {
    /// Zero quantity.
    pub const ZERO: Quantity = Quantity(0);

    /// Creates a quantity from thousandths of a unit.
    #[inline]
    pub const fn from_milli(milli: i64) -> Self {
        Quantity(milli)
    }

    /// Creates a quantity from whole units.
    ///
    /// ## Example
    /// ```rust
    /// use caja_core::Quantity;
    ///
    /// assert_eq!(Quantity::from_units(3).milli(), 3000);
    /// ```
    #[inline]
    pub const fn from_units(units: i64) -> Self {
        Quantity(units * MILLI_PER_UNIT)
    }

    /// Returns the raw value in thousandths.
    #[inline]
    pub const fn milli(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Returns the quantity as a decimal with three fractional digits.
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, QUANTITY_SCALE)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = ValidationError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let out_of_range = || ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: i64::MIN / MILLI_PER_UNIT,
            max: i64::MAX / MILLI_PER_UNIT,
        };

        let scaled = value
            .checked_mul(Decimal::from(MILLI_PER_UNIT))
            .ok_or_else(out_of_range)?;

        if !scaled.fract().is_zero() {
            return Err(ValidationError::InvalidFormat {
                field: "quantity".to_string(),
                reason: format!("at most {} decimal places are supported", QUANTITY_SCALE),
            });
        }

        scaled.to_i64().map(Quantity).ok_or_else(out_of_range)
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Self {
        quantity.to_decimal()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl Add for Quantity {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Quantity(self.0 + other.0)
    }
}

impl AddAssign for Quantity {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Quantity {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Quantity(self.0 - other.0)
    }
}

impl Neg for Quantity {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Quantity(-self.0)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_keeps_three_decimals() {
        assert_eq!(Quantity::from_milli(350).to_string(), "0.350");
        assert_eq!(Quantity::from_units(2).to_string(), "2.000");
        assert_eq!(Quantity::from_milli(-1500).to_string(), "-1.500");
    }

    #[test]
    fn test_from_decimal() {
        let q = Quantity::try_from(Decimal::from_str("0.35").unwrap()).unwrap();
        assert_eq!(q.milli(), 350);

        let q = Quantity::try_from(Decimal::from(4)).unwrap();
        assert_eq!(q, Quantity::from_units(4));

        let err = Quantity::try_from(Decimal::from_str("0.0005").unwrap()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let from_number: Quantity = serde_json::from_str("0.35").unwrap();
        let from_string: Quantity = serde_json::from_str("\"0.350\"").unwrap();
        let from_int: Quantity = serde_json::from_str("3").unwrap();

        assert_eq!(from_number.milli(), 350);
        assert_eq!(from_string.milli(), 350);
        assert_eq!(from_int.milli(), 3000);

        assert!(serde_json::from_str::<Quantity>("1.23456").is_err());
    }

    #[test]
    fn test_serializes_as_decimal_string() {
        let json = serde_json::to_string(&Quantity::from_milli(1125)).unwrap();
        assert_eq!(json, "\"1.125\"");
    }

    #[test]
    fn test_huge_values_are_rejected() {
        let max = Decimal::MAX.to_string();
        assert_eq!(max.len(), 29);

        let err = Quantity::try_from(Decimal::MAX).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        assert!(serde_json::from_str::<Quantity>(&format!("\"{}\"", max)).is_err());
        assert!(serde_json::from_str::<Quantity>("\"9300000000000000\"").is_err());
    }

    #[test]
    fn test_arithmetic_and_ordering() {
        let a = Quantity::from_units(2);
        let b = Quantity::from_milli(500);

        assert_eq!((a + b).milli(), 2500);
        assert_eq!((b - a).milli(), -1500);
        assert_eq!((-b).milli(), -500);
        assert!(a > b);
        assert!(Quantity::ZERO.is_zero());
        assert!(!(-b).is_positive());
    }
}
