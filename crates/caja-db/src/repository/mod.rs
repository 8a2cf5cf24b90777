//! # Repository Module
//!
//! Database repository implementations for Caja.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler                                                           │
//! │       │  db.registers().close(counted, "ana")                           │
//! │       ▼                                                                 │
//! │  RegisterRepository                                                     │
//! │  ├── open / close / status / history / detail                           │
//! │       │                                                                 │
//! │       │  one sqlx::Transaction per operation                            │
//! │       ▼                                                                 │
//! │  Shared helpers taking `&mut SqliteConnection`                          │
//! │  (products, sales, payments), so a transaction can be threaded          │
//! │  through several repositories without acquiring a second connection     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`RegisterRepository`](register::RegisterRepository) - Register session manager
//! - [`SaleRepository`](sale::SaleRepository) - Sale processor
//! - [`SupplierPaymentRepository`](supplier_payment::SupplierPaymentRepository) - Supplier payment recorder
//! - [`ProductRepository`](product::ProductRepository) - Inventory store
//! - [`PaymentMethodRepository`](payment_method::PaymentMethodRepository) - Payment method registry
//! - [`SupplierRepository`](supplier::SupplierRepository) - Supplier lookup

pub mod payment_method;
pub mod product;
pub mod register;
pub mod sale;
pub mod supplier;
pub mod supplier_payment;

use caja_core::short_code::{encode_base36, SHORT_CODE_LEN};
use rand::Rng;
use uuid::Uuid;

/// Generates a new primary key.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// Draws a random 5-character base-36 code.
pub fn generate_short_code() -> String {
    let space = 36u64.pow(SHORT_CODE_LEN as u32);
    encode_base36(rand::thread_rng().gen_range(0..space), SHORT_CODE_LEN)
}

/// Draws a random `PAY-XXXXX` supplier payment code.
pub fn generate_payment_code() -> String {
    let space = 36u64.pow(SHORT_CODE_LEN as u32);
    caja_core::short_code::payment_code(rand::thread_rng().gen_range(0..space))
}

#[cfg(test)]
mod tests {
    use super::*;
    use caja_core::short_code::{is_register_code, PAYMENT_CODE_PREFIX};

    #[test]
    fn test_generated_codes_have_expected_shape() {
        for _ in 0..50 {
            assert!(is_register_code(&generate_short_code()));

            let code = generate_payment_code();
            assert!(code.starts_with(PAYMENT_CODE_PREFIX));
            assert!(is_register_code(&code[PAYMENT_CODE_PREFIX.len()..]));
        }
    }

    #[test]
    fn test_generated_ids_are_unique() {
        assert_ne!(generate_id(), generate_id());
    }
}
