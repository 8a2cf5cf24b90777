//! # Domain Types
//!
//! Core domain types used throughout Caja.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌──────────────────┐   ┌──────────────────┐     │
//! │  │ RegisterSession  │◄──│      Sale        │──►│  PaymentMethod   │     │
//! │  │ ──────────────── │   │ ──────────────── │   │ ──────────────── │     │
//! │  │ short_code       │   │ outcome          │   │ name (unique)    │     │
//! │  │ opening_amount   │   │  Completed{reg}  │   │ percentage_bps   │     │
//! │  │ status           │   │  Voided          │   │ is_arqueable     │     │
//! │  │ closure?         │   │ lines[]          │   └──────────────────┘     │
//! │  └──────────────────┘   └──────────────────┘            ▲               │
//! │           ▲                                             │               │
//! │           │             ┌──────────────────┐            │               │
//! │           └─────────────│ SupplierPayment  │────────────┘               │
//! │                         │ paid_from_cash   │──► Supplier                │
//! │                         └──────────────────┘                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Registers and supplier payments have:
//! - `id`: UUID v4, immutable, used for database relations
//! - `short_code`: human-readable (`AB12C`, `PAY-7QX0Z`) for receipts and
//!   vault bookkeeping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::audit::AuditEvent;
use crate::money::Money;
use crate::quantity::Quantity;

// =============================================================================
// Percentage
// =============================================================================

/// A signed percentage in basis points (1 bp = 0.01%).
///
/// Payment methods carry one: positive is a surcharge (`1000` = +10% for
/// credit card), negative a discount (`-500` = 5% off for transfers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Percentage(i64);

impl Percentage {
    #[inline]
    pub const fn from_bps(bps: i64) -> Self {
        Percentage(bps)
    }

    #[inline]
    pub const fn bps(&self) -> i64 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Percentage(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{}{}.{:02}%", sign, abs / 100, abs % 100)
    }
}

// =============================================================================
// Collaborator Records
// =============================================================================

/// A product held by the inventory store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category: Option<String>,
    /// Current selling price in cents.
    pub price_cents: i64,
    /// Purchase cost in cents (for margin reports).
    pub cost_cents: Option<i64>,
    /// Units on hand (fractional for weight-sold goods).
    pub stock: Quantity,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Checks whether `quantity` can be taken from current stock.
    ///
    /// Non-positive quantities never need stock.
    pub fn can_sell(&self, quantity: Quantity) -> bool {
        !quantity.is_positive() || quantity <= self.stock
    }
}

/// A named way of settling a sale or a supplier payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentMethod {
    pub id: String,
    /// Unique display name ("Efectivo", "Tarjeta de crédito", ...).
    pub name: String,
    /// Surcharge (positive) or discount (negative) in basis points.
    pub percentage_bps: i64,
    /// Whether proceeds are physically counted in the drawer.
    pub is_arqueable: bool,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    #[inline]
    pub fn percentage(&self) -> Percentage {
        Percentage::from_bps(self.percentage_bps)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Register Session
// =============================================================================

/// Lifecycle status of a register session. One-way: Open → Closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterStatus {
    Open,
    Closed,
}

/// Figures frozen onto a session when it is closed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterClosure {
    /// Cash physically counted at close.
    pub closing_amount: Money,
    /// opening_amount + arqueable total.
    pub expected_amount: Money,
    /// closing_amount - expected_amount (negative = shortfall).
    pub difference: Money,
    /// Amount taken out for deposit, leaving the opening float behind.
    pub deposit_amount: Money,
    pub closed_by: String,
    pub closed_at: DateTime<Utc>,
}

/// One till period, from open to close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSession {
    pub id: String,
    /// 5-character base-36 code, uppercase.
    pub short_code: String,
    pub opening_amount: Money,
    pub opened_by: String,
    pub opened_at: DateTime<Utc>,
    pub status: RegisterStatus,
    /// Present once `status` is `Closed`.
    pub closure: Option<RegisterClosure>,
}

impl RegisterSession {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == RegisterStatus::Open
    }
}

// =============================================================================
// Sale
// =============================================================================

/// What the cashier asked for at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleKind {
    /// A real sale: charges the customer, moves stock, lands in the register.
    Venta,
    /// A cart that was abandoned at the till, kept for review only.
    VentaNoRealizada,
}

impl SaleKind {
    #[inline]
    pub fn is_real(&self) -> bool {
        matches!(self, SaleKind::Venta)
    }
}

/// Persisted status column of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    Completed,
    Cancelled,
}

/// Kind, status and register attribution of a sale, as one value.
///
/// A voided sale can never carry a register, and a completed sale always
/// does; modelling the pair as a variant makes the invalid combinations
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleOutcome {
    Completed { register_session_id: String },
    #[serde(rename = "CANCELLED")]
    Voided,
}

impl SaleOutcome {
    pub fn kind(&self) -> SaleKind {
        match self {
            SaleOutcome::Completed { .. } => SaleKind::Venta,
            SaleOutcome::Voided => SaleKind::VentaNoRealizada,
        }
    }

    pub fn status(&self) -> SaleStatus {
        match self {
            SaleOutcome::Completed { .. } => SaleStatus::Completed,
            SaleOutcome::Voided => SaleStatus::Cancelled,
        }
    }

    pub fn register_session_id(&self) -> Option<&str> {
        match self {
            SaleOutcome::Completed {
                register_session_id,
            } => Some(register_session_id),
            SaleOutcome::Voided => None,
        }
    }
}

/// A line of a sale, with the price captured at sale time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_id: String,
    pub quantity: Quantity,
    pub unit_price: Money,
}

/// An append-only sale record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Post-surcharge total.
    pub total: Money,
    #[serde(flatten)]
    pub outcome: SaleOutcome,
    /// Cashier.
    pub user_id: String,
    pub payment_method_id: Option<String>,
    pub lines: Vec<SaleLine>,
    /// Cart mutations recorded while the sale was being built.
    pub audit_log: Vec<AuditEvent>,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn kind(&self) -> SaleKind {
        self.outcome.kind()
    }

    #[inline]
    pub fn status(&self) -> SaleStatus {
        self.outcome.status()
    }
}

// =============================================================================
// Supplier Payment
// =============================================================================

/// An outgoing payment to a supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierPayment {
    pub id: String,
    /// `PAY-` followed by 5 base-36 characters.
    pub short_code: String,
    pub amount: Money,
    pub description: Option<String>,
    pub supplier_id: String,
    pub payment_method_id: String,
    pub user_id: String,
    /// Taken out of the currently open drawer.
    pub paid_from_cash: bool,
    /// Register the payment is booked against, if any.
    pub register_session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Commands (validated inputs)
// =============================================================================

/// One requested line of a sale: net quantity per product at commit time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: String,
    pub quantity: Quantity,
}

/// Input of the Sale Processor.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub user_id: String,
    pub kind: SaleKind,
    pub items: Vec<SaleItemRequest>,
    pub payment_method_id: Option<String>,
    /// Stored verbatim; readers parse it leniently.
    pub audit_log: Option<serde_json::Value>,
}

/// Input of the Supplier Payment Recorder.
#[derive(Debug, Clone)]
pub struct NewSupplierPayment {
    pub supplier_id: String,
    pub amount: Money,
    pub payment_method_id: String,
    pub user_id: String,
    pub description: Option<String>,
    pub paid_from_cash: bool,
    /// Short code of a historical register ("vault" bookkeeping).
    pub cash_register_short_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_cents: Option<i64>,
    #[serde(default)]
    pub stock: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPaymentMethod {
    pub name: String,
    #[serde(default)]
    pub percentage_bps: i64,
    #[serde(default)]
    pub is_arqueable: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock_milli: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            name: "Queso".to_string(),
            category: None,
            price_cents: 1200,
            cost_cents: None,
            stock: Quantity::from_milli(stock_milli),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_percentage_display() {
        assert_eq!(Percentage::from_bps(1000).to_string(), "10.00%");
        assert_eq!(Percentage::from_bps(-525).to_string(), "-5.25%");
        assert!(Percentage::zero().is_zero());
    }

    #[test]
    fn test_can_sell() {
        let p = product(350);
        assert!(p.can_sell(Quantity::from_milli(350)));
        assert!(!p.can_sell(Quantity::from_milli(351)));
        assert!(product(0).can_sell(Quantity::from_units(-1)));
        assert!(product(0).can_sell(Quantity::ZERO));
    }

    #[test]
    fn test_sale_outcome_accessors() {
        let done = SaleOutcome::Completed {
            register_session_id: "r-1".to_string(),
        };
        assert_eq!(done.kind(), SaleKind::Venta);
        assert_eq!(done.status(), SaleStatus::Completed);
        assert_eq!(done.register_session_id(), Some("r-1"));

        assert_eq!(SaleOutcome::Voided.kind(), SaleKind::VentaNoRealizada);
        assert_eq!(SaleOutcome::Voided.status(), SaleStatus::Cancelled);
        assert_eq!(SaleOutcome::Voided.register_session_id(), None);
    }

    #[test]
    fn test_sale_kind_wire_names() {
        assert_eq!(serde_json::to_string(&SaleKind::Venta).unwrap(), "\"VENTA\"");
        let kind: SaleKind = serde_json::from_str("\"VENTA_NO_REALIZADA\"").unwrap();
        assert_eq!(kind, SaleKind::VentaNoRealizada);
        assert!(!kind.is_real());
    }

    #[test]
    fn test_sale_outcome_serializes_status_tag() {
        let json = serde_json::to_value(SaleOutcome::Voided).unwrap();
        assert_eq!(json["status"], "CANCELLED");

        let json = serde_json::to_value(SaleOutcome::Completed {
            register_session_id: "r-9".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["register_session_id"], "r-9");
    }
}
