//! # Error Types
//!
//! Domain-specific error types for caja-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  caja-core errors (this file)                                           │
//! │  ├── CoreError        - State conflicts and business rules              │
//! │  └── ValidationError  - Input validation failures                       │
//! │                                                                         │
//! │  caja-db errors                                                         │
//! │  └── DbError          - Storage failures, carries CoreError raised      │
//! │                         inside a transaction                            │
//! │                                                                         │
//! │  caja-server errors                                                     │
//! │  └── ApiError         - What the HTTP client sees (code + message)      │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Categories
//! - **State conflict**: `RegisterAlreadyOpen`, `NoOpenRegister`,
//!   `RegisterClosed`. Expected and recoverable; the client redirects the
//!   cashier to the right screen.
//! - **Validation**: `Validation(..)`, `ProductNotFound`,
//!   `PaymentMethodNotFound`, `SupplierNotFound`. Rejected before any write.
//! - **Business rule**: `InsufficientStock`. Rejects one sale, state
//!   untouched.

use thiserror::Error;

use crate::quantity::Quantity;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations and state conflicts.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Opening a register while another one is open.
    #[error("A cash register is already open")]
    RegisterAlreadyOpen,

    /// Closing when nothing is open.
    #[error("There is no open cash register")]
    NoOpenRegister,

    /// Recording a real sale while no register is open.
    ///
    /// ## User Workflow
    /// ```text
    /// Cashier presses "Cobrar"
    ///      │
    ///      ▼
    /// No register open → RegisterClosed
    ///      │
    ///      ▼
    /// UI redirects: "Open the register first"
    /// ```
    #[error("The cash register is closed; open it before selling")]
    RegisterClosed,

    /// Referenced product id is not in the inventory store.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Requested quantity exceeds the current stock.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: Quantity,
        requested: Quantity,
    },

    #[error("Payment method not found: {0}")]
    PaymentMethodNotFound(String),

    #[error("Supplier not found: {0}")]
    SupplierNotFound(String),

    /// No register matches the given id or short code.
    #[error("Cash register not found: {0}")]
    RegisterNotFound(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Shorthand for a missing required field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product: "Queso cremoso".to_string(),
            available: Quantity::from_milli(350),
            requested: Quantity::from_units(1),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Queso cremoso: available 0.350, requested 1.000"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("supplier_id").to_string(),
            "supplier_id is required"
        );
        let err = ValidationError::MustNotBeNegative {
            field: "opening_amount".to_string(),
        };
        assert_eq!(err.to_string(), "opening_amount must not be negative");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("items").into();
        assert!(matches!(
            core_err,
            CoreError::Validation(ValidationError::Required { .. })
        ));
    }
}
