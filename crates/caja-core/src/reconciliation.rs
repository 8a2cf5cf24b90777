//! # Reconciliation Engine
//!
//! Derives the per-payment-method breakdown of a register session and the
//! amount that should physically be in the drawer.
//!
//! ## Inclusion Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Input                        breakdown[method]     arqueable_total     │
//! │  ─────                        ─────────────────     ───────────────     │
//! │  COMPLETED sale               + total               + total if arq.     │
//! │  CANCELLED sale               (ignored)             (ignored)           │
//! │  payment, paid_from_cash      - amount              - amount if arq.    │
//! │  payment, not from cash       (ignored)             (ignored)           │
//! │                                                                         │
//! │  No method attached  →  "Efectivo", arqueable                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same function serves the close flow, the live status view and the
//! history view, so a historical breakdown is always recomputed from the
//! persisted sales and payments. Only the closing figures are frozen.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;
use crate::types::{PaymentMethod, SaleStatus};
use crate::DEFAULT_PAYMENT_METHOD_NAME;

// =============================================================================
// Inputs
// =============================================================================

/// The payment-method facts reconciliation needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderMethod {
    pub name: String,
    pub is_arqueable: bool,
}

impl From<&PaymentMethod> for TenderMethod {
    fn from(method: &PaymentMethod) -> Self {
        TenderMethod {
            name: method.name.clone(),
            is_arqueable: method.is_arqueable,
        }
    }
}

/// A sale as seen by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleTender {
    pub total: Money,
    pub status: SaleStatus,
    pub method: Option<TenderMethod>,
}

/// A supplier payment as seen by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashOutflow {
    pub amount: Money,
    pub paid_from_cash: bool,
    pub method: Option<TenderMethod>,
}

// =============================================================================
// Output
// =============================================================================

/// Breakdown of a register session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Net proceeds per payment-method name, sorted by name.
    pub breakdown: BTreeMap<String, Money>,
    /// Net amount counted into the drawer.
    pub arqueable_total: Money,
    /// Sum of the supplier payments taken from the drawer.
    pub payments_total: Money,
}

/// Resolves the method name and arqueable flag; unattributed means cash.
fn resolve(method: Option<&TenderMethod>) -> (&str, bool) {
    match method {
        Some(m) => (m.name.as_str(), m.is_arqueable),
        None => (DEFAULT_PAYMENT_METHOD_NAME, true),
    }
}

/// Computes the breakdown of a session from its sales and supplier payments.
///
/// Pure: the result depends only on the inputs, not on their order.
///
/// ## Example
/// ```rust
/// use caja_core::reconciliation::{compute_breakdown, CashOutflow, SaleTender};
/// use caja_core::{Money, SaleStatus};
///
/// let sales = vec![SaleTender {
///     total: Money::from_units(1000),
///     status: SaleStatus::Completed,
///     method: None,
/// }];
/// let payments = vec![CashOutflow {
///     amount: Money::from_units(200),
///     paid_from_cash: true,
///     method: None,
/// }];
///
/// let result = compute_breakdown(&sales, &payments);
/// assert_eq!(result.arqueable_total, Money::from_units(800));
/// assert_eq!(result.breakdown["Efectivo"], Money::from_units(800));
/// ```
pub fn compute_breakdown(sales: &[SaleTender], payments: &[CashOutflow]) -> Reconciliation {
    let mut result = Reconciliation::default();

    for sale in sales.iter().filter(|s| s.status == SaleStatus::Completed) {
        let (name, is_arqueable) = resolve(sale.method.as_ref());
        *result.breakdown.entry(name.to_string()).or_default() += sale.total;
        if is_arqueable {
            result.arqueable_total += sale.total;
        }
    }

    for payment in payments.iter().filter(|p| p.paid_from_cash) {
        let (name, is_arqueable) = resolve(payment.method.as_ref());
        *result.breakdown.entry(name.to_string()).or_default() -= payment.amount;
        if is_arqueable {
            result.arqueable_total -= payment.amount;
        }
        result.payments_total += payment.amount;
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str, is_arqueable: bool) -> Option<TenderMethod> {
        Some(TenderMethod {
            name: name.to_string(),
            is_arqueable,
        })
    }

    fn sale(units: i64, status: SaleStatus, method: Option<TenderMethod>) -> SaleTender {
        SaleTender {
            total: Money::from_units(units),
            status,
            method,
        }
    }

    fn outflow(units: i64, paid_from_cash: bool, method: Option<TenderMethod>) -> CashOutflow {
        CashOutflow {
            amount: Money::from_units(units),
            paid_from_cash,
            method,
        }
    }

    #[test]
    fn test_cash_sale_minus_cash_payment() {
        let sales = vec![sale(1000, SaleStatus::Completed, method("Efectivo", true))];
        let payments = vec![outflow(200, true, method("Efectivo", true))];

        let result = compute_breakdown(&sales, &payments);

        assert_eq!(result.arqueable_total, Money::from_units(800));
        assert_eq!(result.breakdown["Efectivo"], Money::from_units(800));
        assert_eq!(result.payments_total, Money::from_units(200));
    }

    #[test]
    fn test_non_arqueable_methods_stay_out_of_drawer() {
        let sales = vec![
            sale(300, SaleStatus::Completed, None),
            sale(450, SaleStatus::Completed, method("Tarjeta", false)),
        ];
        let payments = vec![outflow(50, true, method("Transferencia", false))];

        let result = compute_breakdown(&sales, &payments);

        assert_eq!(result.arqueable_total, Money::from_units(300));
        assert_eq!(result.breakdown["Efectivo"], Money::from_units(300));
        assert_eq!(result.breakdown["Tarjeta"], Money::from_units(450));
        assert_eq!(result.breakdown["Transferencia"], Money::from_units(-50));
        assert_eq!(result.payments_total, Money::from_units(50));
    }

    #[test]
    fn test_ignores_cancelled_sales_and_non_cash_payments() {
        let sales = vec![
            sale(100, SaleStatus::Cancelled, None),
            sale(70, SaleStatus::Completed, None),
        ];
        let payments = vec![outflow(500, false, None)];

        let result = compute_breakdown(&sales, &payments);

        assert_eq!(result.arqueable_total, Money::from_units(70));
        assert_eq!(result.payments_total, Money::zero());
        assert_eq!(result.breakdown.len(), 1);
    }

    #[test]
    fn test_empty_session() {
        let result = compute_breakdown(&[], &[]);
        assert!(result.breakdown.is_empty());
        assert!(result.arqueable_total.is_zero());
    }

    #[test]
    fn test_reproducible_and_order_independent() {
        let mut sales = vec![
            sale(10, SaleStatus::Completed, method("Tarjeta", false)),
            sale(20, SaleStatus::Completed, None),
            sale(30, SaleStatus::Completed, method("Efectivo", true)),
        ];
        let payments = vec![
            outflow(5, true, None),
            outflow(7, true, method("Tarjeta", false)),
        ];

        let first = serde_json::to_string(&compute_breakdown(&sales, &payments)).unwrap();
        let second = serde_json::to_string(&compute_breakdown(&sales, &payments)).unwrap();
        assert_eq!(first, second);

        sales.reverse();
        let reversed = serde_json::to_string(&compute_breakdown(&sales, &payments)).unwrap();
        assert_eq!(first, reversed);
    }
}
