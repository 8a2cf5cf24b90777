//! # Sale Pricing
//!
//! Turns captured sale lines plus a payment-method percentage into the
//! post-surcharge total.
//!
//! ## Exact Accumulation
//! ```text
//! line        = unit_price (cents) × quantity (milli)     → cent-millis, exact
//! subtotal    = Σ line                                    → cent-millis, exact
//! total       = subtotal × (10000 + bps) / (1000 × 10000) → cents, rounded ONCE
//! ```
//! Rounding happens a single time at the very end, half away from zero,
//! so splitting a weight-sold line across two lines can never drift the
//! total by a cent.

use crate::error::ValidationError;
use crate::money::Money;
use crate::quantity::Quantity;
use crate::types::{Percentage, SaleLine};
use crate::validation::{validate_amount_magnitude, ValidationResult};
use crate::MAX_AMOUNT_CENTS;

const MILLI_PER_UNIT: i128 = 1000;
const BPS_SCALE: i128 = 10_000;

/// Divides rounding halves away from zero. `divisor` must be positive.
fn div_round_half_away(numerator: i128, divisor: i128) -> i128 {
    let quotient = numerator / divisor;
    let remainder = numerator % divisor;
    if remainder.abs() * 2 >= divisor {
        quotient + numerator.signum()
    } else {
        quotient
    }
}

/// Exact subtotal of a line in cent-millis (cents × 1/1000).
#[inline]
fn line_amount(unit_price: Money, quantity: Quantity) -> i128 {
    unit_price.cents() as i128 * quantity.milli() as i128
}

/// Computes the post-surcharge total of a sale.
///
/// ## Errors
/// `OutOfRange` on `total` when the result does not fit the amounts the
/// register accepts.
///
/// ## Example
/// ```rust
/// use caja_core::pricing::compute_sale_total;
/// use caja_core::{Money, Percentage, Quantity, SaleLine};
///
/// let lines = vec![SaleLine {
///     product_id: "p-1".to_string(),
///     quantity: Quantity::from_units(2),
///     unit_price: Money::from_cents(1_000),
/// }];
///
/// // $20.00 with a 10% card surcharge
/// let total = compute_sale_total(&lines, Percentage::from_bps(1000)).unwrap();
/// assert_eq!(total.cents(), 2_200);
/// ```
pub fn compute_sale_total(lines: &[SaleLine], percentage: Percentage) -> ValidationResult<Money> {
    let subtotal = lines
        .iter()
        .try_fold(0i128, |acc, line| {
            acc.checked_add(line_amount(line.unit_price, line.quantity))
        });

    let rounded = subtotal
        .and_then(|exact| exact.checked_mul(BPS_SCALE + percentage.bps() as i128))
        .map(|scaled| div_round_half_away(scaled, MILLI_PER_UNIT * BPS_SCALE));

    let total = rounded
        .and_then(|cents| i64::try_from(cents).ok())
        .map(Money::from_cents)
        .ok_or_else(|| ValidationError::OutOfRange {
            field: "total".to_string(),
            min: -MAX_AMOUNT_CENTS,
            max: MAX_AMOUNT_CENTS,
        })?;

    validate_amount_magnitude("total", total)?;
    Ok(total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn total(lines: &[SaleLine], bps: i64) -> i64 {
        compute_sale_total(lines, Percentage::from_bps(bps)).unwrap().cents()
    }

    fn line(cents: i64, milli: i64) -> SaleLine {
        SaleLine {
            product_id: "p".to_string(),
            quantity: Quantity::from_milli(milli),
            unit_price: Money::from_cents(cents),
        }
    }

    #[test]
    fn test_no_percentage() {
        let lines = vec![line(1500, 2000), line(250, 1000)];
        assert_eq!(total(&lines, 0), 3250);
    }

    #[test]
    fn test_surcharge_and_discount() {
        let lines = vec![line(10_000, 1000)];
        assert_eq!(total(&lines, 1000), 11_000);
        assert_eq!(total(&lines, -500), 9_500);
        assert_eq!(total(&lines, -10_000), 0);
    }

    #[test]
    fn test_weight_sold_line() {
        // 0.350 kg at $12.99/kg = 454.65 cents
        let lines = vec![line(1299, 350)];
        assert_eq!(total(&lines, 0), 455);
    }

    #[test]
    fn test_rounds_once_at_the_end() {
        // Each line alone is 0.5 cents; rounding per line would give 2.
        let lines = vec![line(1, 500), line(1, 500)];
        assert_eq!(total(&lines, 0), 1);
    }

    #[test]
    fn test_half_away_from_zero() {
        assert_eq!(div_round_half_away(15, 10), 2);
        assert_eq!(div_round_half_away(14, 10), 1);
        assert_eq!(div_round_half_away(-15, 10), -2);
        assert_eq!(div_round_half_away(-14, 10), -1);
        assert_eq!(div_round_half_away(i128::MAX, 10), i128::MAX / 10 + 1);
    }

    #[test]
    fn test_negative_net_line() {
        let lines = vec![line(1000, 3000), line(1000, -1000)];
        assert_eq!(total(&lines, 0), 2000);
    }

    #[test]
    fn test_empty_lines() {
        assert_eq!(total(&[], 1000), 0);
    }

    #[test]
    fn test_total_too_large_is_rejected() {
        // 1e8 cents × 1e17 units is 1e22 cents, past any i64.
        let lines = vec![line(100_000_000, 100_000_000_000_000_000)];
        let err = compute_sale_total(&lines, Percentage::zero()).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        let lines = vec![line(i64::MAX, i64::MAX), line(i64::MAX, i64::MAX)];
        assert!(compute_sale_total(&lines, Percentage::from_bps(100_000)).is_err());
    }

    #[test]
    fn test_total_at_the_cap() {
        let lines = vec![line(MAX_AMOUNT_CENTS, 1000)];
        assert_eq!(total(&lines, 0), MAX_AMOUNT_CENTS);
        assert!(compute_sale_total(&lines, Percentage::from_bps(1)).is_err());
    }
}
