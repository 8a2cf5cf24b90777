//! # Supplier Payment Repository
//!
//! Records outgoing payments to suppliers and attributes them to a register
//! session.
//!
//! ## Register Attribution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  paid_from_cash = true                                                  │
//! │      → the currently open session (drawer cash leaves the till)         │
//! │      → none open: recorded unattributed, with a warning                 │
//! │                                                                         │
//! │  paid_from_cash = false, cash_register_short_code = "AB12C"             │
//! │      → that session, open or closed ("vault" bookkeeping)               │
//! │      → unknown code: recorded unattributed, with a warning              │
//! │                                                                         │
//! │  otherwise → unattributed                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Only payments taken from the drawer reduce a session's arqueo. Vault
//! payments are listed in the register detail but never counted.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::{generate_id, generate_payment_code, payment_method, register, supplier};
use crate::error::{DbError, DbResult};
use caja_core::short_code::normalize_short_code;
use caja_core::validation::validate_new_supplier_payment;
use caja_core::{CashOutflow, CoreError, Money, NewSupplierPayment, SupplierPayment, TenderMethod};

/// Attempts at drawing a free `PAY-XXXXX` code before giving up.
const MAX_CODE_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, sqlx::FromRow)]
struct SupplierPaymentRow {
    id: String,
    short_code: String,
    amount_cents: i64,
    description: Option<String>,
    supplier_id: String,
    payment_method_id: String,
    user_id: String,
    paid_from_cash: bool,
    register_session_id: Option<String>,
    created_at: DateTime<Utc>,
    method_name: Option<String>,
    method_is_arqueable: Option<bool>,
}

/// A persisted payment together with its method facts.
#[derive(Debug, Clone)]
pub(crate) struct LoadedPayment {
    pub payment: SupplierPayment,
    pub method: Option<TenderMethod>,
}

impl LoadedPayment {
    pub fn outflow(&self) -> CashOutflow {
        CashOutflow {
            amount: self.payment.amount,
            paid_from_cash: self.payment.paid_from_cash,
            method: self.method.clone(),
        }
    }
}

impl From<SupplierPaymentRow> for LoadedPayment {
    fn from(row: SupplierPaymentRow) -> Self {
        let method = match (row.method_name, row.method_is_arqueable) {
            (Some(name), Some(is_arqueable)) => Some(TenderMethod { name, is_arqueable }),
            _ => None,
        };

        LoadedPayment {
            payment: SupplierPayment {
                id: row.id,
                short_code: row.short_code,
                amount: Money::from_cents(row.amount_cents),
                description: row.description,
                supplier_id: row.supplier_id,
                payment_method_id: row.payment_method_id,
                user_id: row.user_id,
                paid_from_cash: row.paid_from_cash,
                register_session_id: row.register_session_id,
                created_at: row.created_at,
            },
            method,
        }
    }
}

const PAYMENT_SELECT: &str = r#"
    SELECT sp.id, sp.short_code, sp.amount_cents, sp.description, sp.supplier_id,
           sp.payment_method_id, sp.user_id, sp.paid_from_cash, sp.register_session_id,
           sp.created_at,
           pm.name AS method_name, pm.is_arqueable AS method_is_arqueable
    FROM supplier_payments sp
    LEFT JOIN payment_methods pm ON pm.id = sp.payment_method_id
"#;

/// Repository for supplier payments.
#[derive(Debug, Clone)]
pub struct SupplierPaymentRepository {
    pool: SqlitePool,
}

impl SupplierPaymentRepository {
    /// Creates a new SupplierPaymentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierPaymentRepository { pool }
    }

    /// Records a supplier payment.
    ///
    /// A missing register is never an error: the payment is kept and the
    /// gap is logged, so the supplier side of the books stays complete.
    ///
    /// ## Errors
    /// - `CoreError::Validation` for a non-positive amount or blank ids
    /// - `CoreError::SupplierNotFound` / `CoreError::PaymentMethodNotFound`
    pub async fn record(&self, cmd: &NewSupplierPayment) -> DbResult<SupplierPayment> {
        validate_new_supplier_payment(cmd).map_err(CoreError::from)?;

        debug!(
            supplier = %cmd.supplier_id,
            amount = %cmd.amount,
            paid_from_cash = cmd.paid_from_cash,
            "Recording supplier payment"
        );

        let mut tx = self.pool.begin().await?;

        // Write lock first; also pins the open session until commit.
        let open = register::lock_open_session(&mut *tx).await?;

        if supplier::find(&mut *tx, &cmd.supplier_id).await?.is_none() {
            return Err(CoreError::SupplierNotFound(cmd.supplier_id.clone()).into());
        }
        if payment_method::find(&mut *tx, &cmd.payment_method_id)
            .await?
            .is_none()
        {
            return Err(CoreError::PaymentMethodNotFound(cmd.payment_method_id.clone()).into());
        }

        let register_session_id = if cmd.paid_from_cash {
            match open {
                Some(session) => Some(session.id),
                None => {
                    warn!(
                        supplier = %cmd.supplier_id,
                        amount = %cmd.amount,
                        "Cash supplier payment recorded with no open register"
                    );
                    None
                }
            }
        } else {
            match cmd.cash_register_short_code.as_deref().map(normalize_short_code) {
                Some(code) if !code.is_empty() => {
                    match register::find_by_short_code(&mut *tx, &code).await? {
                        Some(session) => Some(session.id),
                        None => {
                            warn!(short_code = %code, "Supplier payment references unknown register");
                            None
                        }
                    }
                }
                _ => None,
            }
        };

        let mut payment = SupplierPayment {
            id: generate_id(),
            short_code: String::new(),
            amount: cmd.amount,
            description: cmd
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            supplier_id: cmd.supplier_id.clone(),
            payment_method_id: cmd.payment_method_id.clone(),
            user_id: cmd.user_id.trim().to_string(),
            paid_from_cash: cmd.paid_from_cash,
            register_session_id,
            created_at: Utc::now(),
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            payment.short_code = generate_payment_code();

            match insert(&mut *tx, &payment).await {
                Ok(()) => break,
                Err(e)
                    if e.is_unique_violation_on("supplier_payments.short_code")
                        && attempt < MAX_CODE_ATTEMPTS =>
                {
                    warn!(short_code = %payment.short_code, attempt, "Payment code collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        tx.commit().await?;

        info!(
            id = %payment.id,
            short_code = %payment.short_code,
            amount = %payment.amount,
            paid_from_cash = payment.paid_from_cash,
            register = ?payment.register_session_id,
            "Supplier payment recorded"
        );

        Ok(payment)
    }

    /// Gets a payment by its `PAY-XXXXX` code (case-insensitive).
    pub async fn get_by_short_code(&self, code: &str) -> DbResult<Option<SupplierPayment>> {
        let row = sqlx::query_as::<_, SupplierPaymentRow>(&format!(
            "{} WHERE sp.short_code = ?1",
            PAYMENT_SELECT
        ))
        .bind(normalize_short_code(code))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| LoadedPayment::from(r).payment))
    }
}

async fn insert(conn: &mut SqliteConnection, payment: &SupplierPayment) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO supplier_payments (
            id, short_code, amount_cents, description, supplier_id,
            payment_method_id, user_id, paid_from_cash, register_session_id, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.short_code)
    .bind(payment.amount.cents())
    .bind(&payment.description)
    .bind(&payment.supplier_id)
    .bind(&payment.payment_method_id)
    .bind(&payment.user_id)
    .bind(payment.paid_from_cash)
    .bind(&payment.register_session_id)
    .bind(payment.created_at)
    .execute(&mut *conn)
    .await
    .map_err(DbError::from)?;

    Ok(())
}

/// Loads every payment attributed to a session, oldest first.
///
/// Includes vault payments; reconciliation filters on `paid_from_cash`.
pub(crate) async fn load_for_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Vec<LoadedPayment>> {
    let rows = sqlx::query_as::<_, SupplierPaymentRow>(&format!(
        r#"
        {}
        WHERE sp.register_session_id = ?1
        ORDER BY sp.created_at, sp.rowid
        "#,
        PAYMENT_SELECT
    ))
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(LoadedPayment::from).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================
