//! # caja-core: Pure Business Logic for Caja
//!
//! The arithmetic and rules of the cash register: money, quantities, sale
//! pricing, reconciliation (arqueo) and validation. Everything here is a
//! pure function over plain values; persistence and transactions live in
//! caja-db.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Caja Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                    caja-server (axum)                           │    │
//! │  │   /registers/open ─ /registers/close ─ /sales ─ /payments       │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │                    caja-db (SQLite)                             │    │
//! │  │   one transaction per operation, short codes, repositories      │    │
//! │  └─────────────────────────────┬───────────────────────────────────┘    │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐    │
//! │  │               ★ caja-core (THIS CRATE) ★                        │    │
//! │  │                                                                 │    │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────────┐ ┌──────────┐      │    │
//! │  │   │  money   │ │ pricing  │ │reconciliation │ │ closing  │      │    │
//! │  │   │ quantity │ │  totals  │ │  breakdown    │ │  arqueo  │      │    │
//! │  │   └──────────┘ └──────────┘ └───────────────┘ └──────────┘      │    │
//! │  │                                                                 │    │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RegisterSession, Sale, SupplierPayment, ...)
//! - [`money`] - Money in integer cents
//! - [`quantity`] - Fixed-point quantities for weight-sold goods
//! - [`pricing`] - Sale totals with payment-method surcharge
//! - [`reconciliation`] - Per-method breakdown and arqueable total
//! - [`closing`] - Expected amount, difference, deposit
//! - [`audit`] - Cart mutation log, parsed leniently
//! - [`short_code`] - Human-readable register and payment codes
//! - [`validation`] - Input checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use caja_core::closing::compute_closing;
//! use caja_core::reconciliation::{compute_breakdown, SaleTender};
//! use caja_core::{Money, SaleStatus};
//!
//! let sales = vec![SaleTender {
//!     total: Money::from_units(300),
//!     status: SaleStatus::Completed,
//!     method: None,
//! }];
//! let arqueo = compute_breakdown(&sales, &[]);
//!
//! let figures = compute_closing(Money::from_units(500), Money::from_units(800), arqueo.arqueable_total);
//! assert!(figures.difference.is_zero());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod audit;
pub mod closing;
pub mod error;
pub mod money;
pub mod pricing;
pub mod quantity;
pub mod reconciliation;
pub mod short_code;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use audit::{AuditAction, AuditEvent};
pub use closing::{ClosedRegisterSummary, ClosingFigures, RegisterDetail, RegisterStatusView};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use quantity::Quantity;
pub use reconciliation::{CashOutflow, Reconciliation, SaleTender, TenderMethod};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Breakdown key for sales and payments with no payment method attached.
///
/// Unattributed money is assumed to be cash and counted in the drawer.
pub const DEFAULT_PAYMENT_METHOD_NAME: &str = "Efectivo";

/// Maximum lines in a single sale.
pub const MAX_SALE_LINES: usize = 200;

/// Maximum length of product, supplier and payment-method names.
pub const MAX_NAME_LENGTH: usize = 120;

/// Largest amount, in cents, the register accepts or a sale may total.
///
/// Keeps every sum over a session far inside `i64`.
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000_000;

/// Largest quantity, in thousandths, a single sale line may carry.
pub const MAX_LINE_QUANTITY_MILLI: i64 = 1_000_000_000;

/// Page size of the closed-register history when none is requested.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Upper bound on the closed-register history page size.
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// Largest discount a payment method may carry (-100%).
pub const MIN_PERCENTAGE_BPS: i64 = -10_000;

/// Largest surcharge a payment method may carry (+1000%).
pub const MAX_PERCENTAGE_BPS: i64 = 100_000;
