//! # Validation Module
//!
//! Input validation for register, sale and payment commands.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: HTTP handler (caja-server)                                    │
//! │  ├── Deserialization (types, quantity precision)                        │
//! │  └── Presence of required fields → MISSING_REQUIRED_FIELD               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE: ranges and business-shaped checks                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                        │
//! │  ├── CHECK constraints (sale outcome, amounts)                          │
//! │  ├── UNIQUE (method names, payment codes, single open register)         │
//! │  └── Foreign keys                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewPaymentMethod, NewProduct, NewSale, NewSupplierPayment};
use crate::{
    DEFAULT_HISTORY_LIMIT, MAX_AMOUNT_CENTS, MAX_HISTORY_LIMIT, MAX_LINE_QUANTITY_MILLI,
    MAX_NAME_LENGTH, MAX_PERCENTAGE_BPS, MAX_SALE_LINES, MIN_PERCENTAGE_BPS,
};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Presence
// =============================================================================

/// Unwraps an optional field, failing with `Required` when absent.
pub fn require<T>(field: &str, value: Option<T>) -> ValidationResult<T> {
    value.ok_or_else(|| ValidationError::required(field))
}

/// Unwraps an optional text field and trims it; blank counts as missing.
///
/// ## Example
/// ```rust
/// use caja_core::validation::require_text;
///
/// assert_eq!(require_text("user_id", Some(" ana ".to_string())).unwrap(), "ana");
/// assert!(require_text("user_id", Some("   ".to_string())).is_err());
/// assert!(require_text("user_id", None).is_err());
/// ```
pub fn require_text(field: &str, value: Option<String>) -> ValidationResult<String> {
    let value = require(field, value)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(trimmed.to_string())
}

// =============================================================================
// Strings
// =============================================================================

/// Validates a display name (product, supplier, payment method).
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required(field));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LENGTH,
        });
    }

    Ok(())
}

// =============================================================================
// Amounts
// =============================================================================

/// Checks that an amount stays within `MAX_AMOUNT_CENTS` either way.
pub fn validate_amount_magnitude(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.cents().checked_abs().map_or(true, |c| c > MAX_AMOUNT_CENTS) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: -MAX_AMOUNT_CENTS,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Validates an opening or counted closing amount. Zero is a valid float.
pub fn validate_register_amount(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    validate_amount_magnitude(field, amount)
}

/// Validates the amount of an outgoing supplier payment.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }
    validate_amount_magnitude("amount", amount)
}

/// Validates a catalog price in cents. Zero is allowed (free items).
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a payment-method surcharge/discount.
///
/// ## Rules
/// - Discounts cannot exceed 100% (`-10000` bps)
/// - Surcharges are capped at 1000% (`100000` bps)
pub fn validate_percentage_bps(bps: i64) -> ValidationResult<()> {
    if !(MIN_PERCENTAGE_BPS..=MAX_PERCENTAGE_BPS).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "percentage_bps".to_string(),
            min: MIN_PERCENTAGE_BPS,
            max: MAX_PERCENTAGE_BPS,
        });
    }
    Ok(())
}

// =============================================================================
// Commands
// =============================================================================

/// Validates a sale command before any database access.
///
/// ## Rules
/// - `user_id` must not be blank
/// - At least one item, at most `MAX_SALE_LINES`
/// - Every item names a product
///
/// Quantities may be negative (the cart nets additions and removals before
/// commit), but never beyond `MAX_LINE_QUANTITY_MILLI` either way. Stock
/// availability is checked against the store.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    if sale.user_id.trim().is_empty() {
        return Err(ValidationError::required("user_id"));
    }

    if sale.items.is_empty() {
        return Err(ValidationError::required("items"));
    }

    if sale.items.len() > MAX_SALE_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_LINES as i64,
        });
    }

    if sale.items.iter().any(|item| item.product_id.trim().is_empty()) {
        return Err(ValidationError::required("items.product_id"));
    }

    let too_large =
        |milli: i64| milli.checked_abs().map_or(true, |m| m > MAX_LINE_QUANTITY_MILLI);
    if sale.items.iter().any(|item| too_large(item.quantity.milli())) {
        return Err(ValidationError::OutOfRange {
            field: "items.quantity".to_string(),
            min: -MAX_LINE_QUANTITY_MILLI,
            max: MAX_LINE_QUANTITY_MILLI,
        });
    }

    Ok(())
}

/// Validates a product before it enters the inventory store.
pub fn validate_new_product(product: &NewProduct) -> ValidationResult<()> {
    validate_name("name", &product.name)?;
    validate_price_cents("price_cents", product.price_cents)?;
    if let Some(cost) = product.cost_cents {
        validate_price_cents("cost_cents", cost)?;
    }
    if product.stock.milli() < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "stock".to_string(),
        });
    }
    Ok(())
}

pub fn validate_new_payment_method(method: &NewPaymentMethod) -> ValidationResult<()> {
    validate_name("name", &method.name)?;
    validate_percentage_bps(method.percentage_bps)
}

/// Validates a supplier payment command.
pub fn validate_new_supplier_payment(payment: &NewSupplierPayment) -> ValidationResult<()> {
    for (field, value) in [
        ("supplier_id", &payment.supplier_id),
        ("payment_method_id", &payment.payment_method_id),
        ("user_id", &payment.user_id),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::required(field));
        }
    }

    validate_payment_amount(payment.amount)
}

/// Resolves the page size of the closed-register history.
///
/// ## Example
/// ```rust
/// use caja_core::validation::history_limit;
///
/// assert_eq!(history_limit(None), 10);
/// assert_eq!(history_limit(Some(0)), 1);
/// assert_eq!(history_limit(Some(5000)), 100);
/// ```
pub fn history_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Quantity;
    use crate::types::{SaleItemRequest, SaleKind};

    fn sale_with(items: Vec<SaleItemRequest>) -> NewSale {
        NewSale {
            user_id: "cashier-1".to_string(),
            kind: SaleKind::Venta,
            items,
            payment_method_id: None,
            audit_log: None,
        }
    }

    fn item(product_id: &str) -> SaleItemRequest {
        SaleItemRequest {
            product_id: product_id.to_string(),
            quantity: Quantity::from_units(1),
        }
    }

    fn payment() -> NewSupplierPayment {
        NewSupplierPayment {
            supplier_id: "sup-1".to_string(),
            amount: Money::from_cents(10_000),
            payment_method_id: "pm-1".to_string(),
            user_id: "admin".to_string(),
            description: None,
            paid_from_cash: true,
            cash_register_short_code: None,
        }
    }

    #[test]
    fn test_require() {
        assert_eq!(require("amount", Some(5)).unwrap(), 5);
        let err = require::<i64>("amount", None).unwrap_err();
        assert_eq!(err.to_string(), "amount is required");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Efectivo").is_ok());
        assert!(validate_name("name", "  ").is_err());
        assert!(validate_name("name", &"x".repeat(MAX_NAME_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_register_amounts() {
        assert!(validate_register_amount("opening_amount", Money::zero()).is_ok());
        assert!(validate_register_amount("opening_amount", Money::from_cents(1)).is_ok());
        assert!(validate_register_amount("opening_amount", Money::from_cents(-1)).is_err());
        assert!(validate_register_amount("closing_amount", Money::from_cents(MAX_AMOUNT_CENTS)).is_ok());

        let err = validate_register_amount("closing_amount", Money::from_cents(i64::MAX)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
        assert!(validate_payment_amount(Money::from_cents(MAX_AMOUNT_CENTS + 1)).is_err());
    }

    #[test]
    fn test_line_quantity_cap() {
        let mut sale = sale_with(vec![item("p-1")]);
        sale.items[0].quantity = Quantity::from_milli(MAX_LINE_QUANTITY_MILLI);
        assert!(validate_new_sale(&sale).is_ok());

        sale.items[0].quantity = Quantity::from_milli(-MAX_LINE_QUANTITY_MILLI - 1);
        let err = validate_new_sale(&sale).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        sale.items[0].quantity = Quantity::from_milli(i64::MIN);
        assert!(validate_new_sale(&sale).is_err());
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(validate_percentage_bps(0).is_ok());
        assert!(validate_percentage_bps(1000).is_ok());
        assert!(validate_percentage_bps(-10_000).is_ok());
        assert!(validate_percentage_bps(-10_001).is_err());
        assert!(validate_percentage_bps(100_001).is_err());
    }

    #[test]
    fn test_validate_new_product() {
        let mut product = NewProduct {
            name: "Queso cremoso".to_string(),
            category: Some("Fiambrería".to_string()),
            price_cents: 1299,
            cost_cents: Some(800),
            stock: Quantity::from_milli(5_250),
        };
        assert!(validate_new_product(&product).is_ok());

        product.cost_cents = Some(-1);
        assert!(validate_new_product(&product).is_err());

        product.cost_cents = None;
        product.stock = Quantity::from_units(-1);
        assert!(validate_new_product(&product).is_err());
    }

    #[test]
    fn test_validate_new_payment_method() {
        let method = NewPaymentMethod {
            name: "Tarjeta de crédito".to_string(),
            percentage_bps: 1000,
            is_arqueable: false,
        };
        assert!(validate_new_payment_method(&method).is_ok());

        let blank = NewPaymentMethod {
            name: " ".to_string(),
            ..method
        };
        assert!(matches!(
            validate_new_payment_method(&blank),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_validate_new_sale() {
        assert!(validate_new_sale(&sale_with(vec![item("p-1")])).is_ok());

        let err = validate_new_sale(&sale_with(vec![])).unwrap_err();
        assert!(matches!(err, ValidationError::Required { ref field } if field == "items"));

        assert!(validate_new_sale(&sale_with(vec![item(" ")])).is_err());

        let mut blank_user = sale_with(vec![item("p-1")]);
        blank_user.user_id = String::new();
        assert!(validate_new_sale(&blank_user).is_err());

        let too_many = (0..=MAX_SALE_LINES).map(|i| item(&format!("p-{}", i))).collect();
        assert!(validate_new_sale(&sale_with(too_many)).is_err());
    }

    #[test]
    fn test_validate_new_supplier_payment() {
        assert!(validate_new_supplier_payment(&payment()).is_ok());

        let mut missing_supplier = payment();
        missing_supplier.supplier_id = String::new();
        let err = validate_new_supplier_payment(&missing_supplier).unwrap_err();
        assert_eq!(err.to_string(), "supplier_id is required");

        let mut zero = payment();
        zero.amount = Money::zero();
        assert!(matches!(
            validate_new_supplier_payment(&zero),
            Err(ValidationError::MustBePositive { .. })
        ));
    }
}
