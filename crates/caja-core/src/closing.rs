//! # Register Closing (Arqueo)
//!
//! Close-time arithmetic and the views built around a register session.
//!
//! ```text
//! expected_amount = opening_amount + arqueable_total
//! difference      = closing_amount - expected_amount     (negative = short)
//! deposit_amount  = max(0, closing_amount - opening_amount)
//! ```
//!
//! The deposit always leaves the opening float in the drawer; if the count
//! comes in below the float, nothing is deposited.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::reconciliation::Reconciliation;
use crate::types::{RegisterSession, Sale, SupplierPayment};

/// Figures stamped on a session when it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosingFigures {
    pub expected_amount: Money,
    pub difference: Money,
    pub deposit_amount: Money,
}

/// Computes the closing figures of a session.
///
/// ## Example
/// ```rust
/// use caja_core::closing::compute_closing;
/// use caja_core::Money;
///
/// let figures = compute_closing(
///     Money::from_units(100), // opening
///     Money::from_units(50),  // counted
///     Money::zero(),          // arqueable total
/// );
/// assert_eq!(figures.deposit_amount, Money::zero());
/// assert_eq!(figures.difference, Money::from_units(-50));
/// ```
pub fn compute_closing(opening: Money, closing: Money, arqueable_total: Money) -> ClosingFigures {
    let expected_amount = opening + arqueable_total;
    ClosingFigures {
        expected_amount,
        difference: closing - expected_amount,
        deposit_amount: (closing - opening).floor_zero(),
    }
}

// =============================================================================
// Views
// =============================================================================

/// A closed session together with its breakdown.
///
/// Returned by the close operation and by every history entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedRegisterSummary {
    pub session: RegisterSession,
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
}

/// Current state of the till.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegisterStatusView {
    /// A session is open; its completed sales and live breakdown.
    Open {
        session: RegisterSession,
        sales: Vec<Sale>,
        reconciliation: Reconciliation,
    },
    /// Nothing is open. The last float is offered for the next opening.
    Closed { suggested_opening_amount: Money },
}

/// Full view of one session, looked up by short code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterDetail {
    pub session: RegisterSession,
    pub sales: Vec<Sale>,
    pub supplier_payments: Vec<SupplierPayment>,
    #[serde(flatten)]
    pub reconciliation: Reconciliation,
}

// =============================================================================
// Unit Tests
// =============================================================================
