//! # Register Repository
//!
//! The register session manager: owns the life of the till, from open to
//! close, and the arqueo performed at close time.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open(amount, user)                      close(counted, user)          │
//! │        │                                        │                       │
//! │        ▼                                        ▼                       │
//! │   ┌─────────┐   sales, cash payments   ┌──────────────┐                 │
//! │   │  OPEN   │ ───────────────────────► │    CLOSED    │  (no reopen)    │
//! │   └─────────┘                          └──────────────┘                 │
//! │        ▲                                        │                       │
//! │        │       suggested_opening_amount         │                       │
//! │        └────────────────────────────────────────┘                       │
//! │                                                                         │
//! │   At most ONE row has status 'open': partial UNIQUE index               │
//! │   idx_register_sessions_single_open enforces it in the store itself.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Close Transaction
//! ```text
//! BEGIN
//!   UPDATE ... SET status='closed' WHERE status='open' RETURNING ...   ← claims the
//!   load COMPLETED sales + supplier payments of the session              writer lock
//!   compute_breakdown → compute_closing
//!   UPDATE ... SET closing/expected/difference/deposit
//! COMMIT
//! ```
//! Nothing can be attributed to the session between the claim and the
//! commit, so the stamped figures always match the persisted inputs.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{generate_id, generate_short_code, sale, supplier_payment};
use crate::error::{DbError, DbResult};
use caja_core::closing::compute_closing;
use caja_core::reconciliation::compute_breakdown;
use caja_core::short_code::normalize_short_code;
use caja_core::validation::{history_limit, require_text, validate_register_amount};
use caja_core::{
    ClosedRegisterSummary, CoreError, Money, Reconciliation, RegisterClosure, RegisterDetail,
    RegisterSession, RegisterStatus, RegisterStatusView,
};

const SESSION_COLUMNS: &str = r#"
    id, short_code, opening_amount_cents, opened_by, opened_at, status,
    closing_amount_cents, expected_amount_cents, difference_cents, deposit_amount_cents,
    closed_by, closed_at
"#;

/// Row shape of the `register_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct RegisterRow {
    id: String,
    short_code: String,
    opening_amount_cents: i64,
    opened_by: String,
    opened_at: DateTime<Utc>,
    status: RegisterStatus,
    closing_amount_cents: Option<i64>,
    expected_amount_cents: Option<i64>,
    difference_cents: Option<i64>,
    deposit_amount_cents: Option<i64>,
    closed_by: Option<String>,
    closed_at: Option<DateTime<Utc>>,
}

impl From<RegisterRow> for RegisterSession {
    fn from(row: RegisterRow) -> Self {
        let closure = match (
            row.status,
            row.closing_amount_cents,
            row.expected_amount_cents,
            row.difference_cents,
            row.deposit_amount_cents,
            row.closed_by,
            row.closed_at,
        ) {
            (
                RegisterStatus::Closed,
                Some(closing),
                Some(expected),
                Some(difference),
                Some(deposit),
                Some(closed_by),
                Some(closed_at),
            ) => Some(RegisterClosure {
                closing_amount: Money::from_cents(closing),
                expected_amount: Money::from_cents(expected),
                difference: Money::from_cents(difference),
                deposit_amount: Money::from_cents(deposit),
                closed_by,
                closed_at,
            }),
            _ => None,
        };

        RegisterSession {
            id: row.id,
            short_code: row.short_code,
            opening_amount: Money::from_cents(row.opening_amount_cents),
            opened_by: row.opened_by,
            opened_at: row.opened_at,
            status: row.status,
            closure,
        }
    }
}

/// Repository for register session operations.
#[derive(Debug, Clone)]
pub struct RegisterRepository {
    pool: SqlitePool,
}

impl RegisterRepository {
    /// Creates a new RegisterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        RegisterRepository { pool }
    }

    /// Opens a new register session.
    ///
    /// ## Errors
    /// - `CoreError::RegisterAlreadyOpen` if a session is already open.
    ///   The single INSERT is checked by the partial unique index, so two
    ///   concurrent opens can never both succeed.
    /// - `CoreError::Validation` for a negative amount or a blank user.
    pub async fn open(&self, opening_amount: Money, opened_by: &str) -> DbResult<RegisterSession> {
        validate_register_amount("opening_amount", opening_amount).map_err(CoreError::from)?;
        let opened_by =
            require_text("opened_by", Some(opened_by.to_string())).map_err(CoreError::from)?;

        let session = RegisterSession {
            id: generate_id(),
            short_code: generate_short_code(),
            opening_amount,
            opened_by,
            opened_at: Utc::now(),
            status: RegisterStatus::Open,
            closure: None,
        };

        debug!(id = %session.id, short_code = %session.short_code, "Opening register");

        let result = sqlx::query(
            r#"
            INSERT INTO register_sessions (
                id, short_code, opening_amount_cents, opened_by, opened_at, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&session.id)
        .bind(&session.short_code)
        .bind(session.opening_amount.cents())
        .bind(&session.opened_by)
        .bind(session.opened_at)
        .bind(session.status)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            let err = DbError::from(e);
            if err.is_unique_violation_on("register_sessions.status") {
                return Err(CoreError::RegisterAlreadyOpen.into());
            }
            return Err(err);
        }

        info!(
            id = %session.id,
            short_code = %session.short_code,
            opening_amount = %session.opening_amount,
            opened_by = %session.opened_by,
            "Register opened"
        );

        Ok(session)
    }

    /// Closes the open session and performs the arqueo.
    ///
    /// ## Figures
    /// ```text
    /// expected   = opening + arqueable_total
    /// difference = counted - expected
    /// deposit    = max(0, counted - opening)
    /// ```
    ///
    /// ## Errors
    /// - `CoreError::NoOpenRegister` if nothing is open.
    pub async fn close(
        &self,
        closing_amount: Money,
        closed_by: &str,
    ) -> DbResult<ClosedRegisterSummary> {
        validate_register_amount("closing_amount", closing_amount).map_err(CoreError::from)?;
        let closed_by =
            require_text("closed_by", Some(closed_by.to_string())).map_err(CoreError::from)?;

        let closed_at = Utc::now();
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query_as::<_, RegisterRow>(&format!(
            r#"
            UPDATE register_sessions
            SET status = 'closed', closed_by = ?1, closed_at = ?2
            WHERE status = 'open'
            RETURNING {}
            "#,
            SESSION_COLUMNS
        ))
        .bind(&closed_by)
        .bind(closed_at)
        .fetch_optional(&mut *tx)
        .await?;

        let row = claimed.ok_or(CoreError::NoOpenRegister)?;
        let mut session = RegisterSession::from(row);

        let reconciliation = reconcile(&mut *tx, &session.id).await?;
        let figures = compute_closing(
            session.opening_amount,
            closing_amount,
            reconciliation.arqueable_total,
        );

        sqlx::query(
            r#"
            UPDATE register_sessions
            SET closing_amount_cents = ?2,
                expected_amount_cents = ?3,
                difference_cents = ?4,
                deposit_amount_cents = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&session.id)
        .bind(closing_amount.cents())
        .bind(figures.expected_amount.cents())
        .bind(figures.difference.cents())
        .bind(figures.deposit_amount.cents())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        session.status = RegisterStatus::Closed;
        session.closure = Some(RegisterClosure {
            closing_amount,
            expected_amount: figures.expected_amount,
            difference: figures.difference,
            deposit_amount: figures.deposit_amount,
            closed_by,
            closed_at,
        });

        info!(
            id = %session.id,
            short_code = %session.short_code,
            expected = %figures.expected_amount,
            counted = %closing_amount,
            difference = %figures.difference,
            deposit = %figures.deposit_amount,
            "Register closed"
        );

        Ok(ClosedRegisterSummary {
            session,
            reconciliation,
        })
    }

    /// Returns the open session with its live breakdown, or the float
    /// suggested for the next opening.
    pub async fn status(&self) -> DbResult<RegisterStatusView> {
        // One read transaction so sales and payments come from one snapshot.
        let mut tx = self.pool.begin().await?;

        let view = match find_open(&mut *tx).await? {
            Some(session) => {
                let sales = sale::load_for_session(&mut *tx, &session.id).await?;
                let payments = supplier_payment::load_for_session(&mut *tx, &session.id).await?;
                let reconciliation = compute_breakdown(
                    &sales.iter().map(sale::LoadedSale::tender).collect::<Vec<_>>(),
                    &payments
                        .iter()
                        .map(supplier_payment::LoadedPayment::outflow)
                        .collect::<Vec<_>>(),
                );

                RegisterStatusView::Open {
                    session,
                    sales: sales.into_iter().map(|s| s.sale).collect(),
                    reconciliation,
                }
            }
            None => {
                let last: Option<i64> = sqlx::query_scalar(
                    r#"
                    SELECT opening_amount_cents
                    FROM register_sessions
                    WHERE status = 'closed'
                    ORDER BY closed_at DESC, rowid DESC
                    LIMIT 1
                    "#,
                )
                .fetch_optional(&mut *tx)
                .await?;

                RegisterStatusView::Closed {
                    suggested_opening_amount: Money::from_cents(last.unwrap_or(0)),
                }
            }
        };

        tx.commit().await?;
        Ok(view)
    }

    /// Lists closed sessions, newest first, each with a breakdown
    /// recomputed from its persisted sales and payments.
    ///
    /// `limit` is clamped to `1..=100`; `None` means 10.
    pub async fn history(&self, limit: Option<u32>) -> DbResult<Vec<ClosedRegisterSummary>> {
        let limit = history_limit(limit);
        debug!(limit, "Listing closed registers");

        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query_as::<_, RegisterRow>(&format!(
            r#"
            SELECT {}
            FROM register_sessions
            WHERE status = 'closed'
            ORDER BY closed_at DESC, rowid DESC
            LIMIT ?1
            "#,
            SESSION_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let session = RegisterSession::from(row);
            let reconciliation = reconcile(&mut *tx, &session.id).await?;
            summaries.push(ClosedRegisterSummary {
                session,
                reconciliation,
            });
        }

        tx.commit().await?;
        Ok(summaries)
    }

    /// Full view of one session by short code (case-insensitive).
    ///
    /// Lists every supplier payment attributed to the session, including
    /// vault payments booked by short code, while the breakdown only
    /// counts the ones taken from the drawer.
    pub async fn detail(&self, short_code: &str) -> DbResult<RegisterDetail> {
        let code = normalize_short_code(short_code);
        debug!(short_code = %code, "Loading register detail");

        let mut tx = self.pool.begin().await?;

        let session = find_by_short_code(&mut *tx, &code)
            .await?
            .ok_or_else(|| CoreError::RegisterNotFound(code.clone()))?;

        let sales = sale::load_for_session(&mut *tx, &session.id).await?;
        let payments = supplier_payment::load_for_session(&mut *tx, &session.id).await?;
        tx.commit().await?;

        let reconciliation = compute_breakdown(
            &sales.iter().map(sale::LoadedSale::tender).collect::<Vec<_>>(),
            &payments
                .iter()
                .map(supplier_payment::LoadedPayment::outflow)
                .collect::<Vec<_>>(),
        );

        Ok(RegisterDetail {
            session,
            sales: sales.into_iter().map(|s| s.sale).collect(),
            supplier_payments: payments.into_iter().map(|p| p.payment).collect(),
            reconciliation,
        })
    }

    /// Returns the open session, if any.
    pub async fn find_open(&self) -> DbResult<Option<RegisterSession>> {
        let mut conn = self.pool.acquire().await?;
        find_open(&mut conn).await
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Recomputes the breakdown of a session from what is persisted.
async fn reconcile(conn: &mut SqliteConnection, session_id: &str) -> DbResult<Reconciliation> {
    let sales = sale::load_for_session(&mut *conn, session_id).await?;
    let payments = supplier_payment::load_for_session(&mut *conn, session_id).await?;

    Ok(compute_breakdown(
        &sales.iter().map(sale::LoadedSale::tender).collect::<Vec<_>>(),
        &payments
            .iter()
            .map(supplier_payment::LoadedPayment::outflow)
            .collect::<Vec<_>>(),
    ))
}

pub(crate) async fn find_open(conn: &mut SqliteConnection) -> DbResult<Option<RegisterSession>> {
    let row = sqlx::query_as::<_, RegisterRow>(&format!(
        "SELECT {} FROM register_sessions WHERE status = 'open'",
        SESSION_COLUMNS
    ))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(RegisterSession::from))
}

/// Returns the open session while taking SQLite's writer lock.
///
/// SQLite has no `SELECT ... FOR UPDATE`. A deferred transaction that reads
/// first and writes later fails with SQLITE_BUSY if another writer commits
/// in between; starting with this no-op UPDATE makes the transaction queue
/// on `busy_timeout` instead, and keeps the session open until commit.
pub(crate) async fn lock_open_session(
    conn: &mut SqliteConnection,
) -> DbResult<Option<RegisterSession>> {
    let row = sqlx::query_as::<_, RegisterRow>(&format!(
        r#"
        UPDATE register_sessions
        SET status = status
        WHERE status = 'open'
        RETURNING {}
        "#,
        SESSION_COLUMNS
    ))
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(RegisterSession::from))
}

/// Looks up a session by (normalized) short code.
///
/// Codes are random and not guaranteed unique; the most recent wins.
pub(crate) async fn find_by_short_code(
    conn: &mut SqliteConnection,
    code: &str,
) -> DbResult<Option<RegisterSession>> {
    let row = sqlx::query_as::<_, RegisterRow>(&format!(
        r#"
        SELECT {}
        FROM register_sessions
        WHERE short_code = ?1
        ORDER BY opened_at DESC, rowid DESC
        LIMIT 1
        "#,
        SESSION_COLUMNS
    ))
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(RegisterSession::from))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use caja_core::ValidationError;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn open_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM register_sessions WHERE status = 'open'")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_session() {
        let db = db().await;
        let session = db.registers().open(Money::from_units(500), "ana").await.unwrap();

        assert!(session.is_open());
        assert_eq!(session.short_code.len(), 5);
        assert_eq!(session.opening_amount, Money::from_units(500));

        let found = db.registers().find_open().await.unwrap().unwrap();
        assert_eq!(found.id, session.id);
        assert!(found.closure.is_none());
    }

    #[tokio::test]
    async fn test_second_open_is_rejected_without_row() {
        let db = db().await;
        db.registers().open(Money::from_units(500), "ana").await.unwrap();

        let err = db.registers().open(Money::from_units(100), "luis").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::RegisterAlreadyOpen)));

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM register_sessions")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(open_count(&db).await, 1);
    }

    #[tokio::test]
    async fn test_open_rejects_negative_amount_and_blank_user() {
        let db = db().await;

        let err = db.registers().open(Money::from_cents(-1), "ana").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        let err = db.registers().open(Money::zero(), "  ").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));

        assert_eq!(open_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_amounts_beyond_cap_are_rejected() {
        let db = db().await;

        let err = db.registers().open(Money::from_cents(i64::MAX), "ana").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert_eq!(open_count(&db).await, 0);

        db.registers().open(Money::from_units(500), "ana").await.unwrap();
        let err = db.registers().close(Money::from_cents(i64::MAX), "ana").await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(db.registers().find_open().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_close_without_open_register() {
        let db = db().await;
        let err = db.registers().close(Money::zero(), "ana").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::NoOpenRegister)));
    }

    #[tokio::test]
    async fn test_close_empty_session_and_deposit_floor() {
        let db = db().await;
        db.registers().open(Money::from_units(100), "ana").await.unwrap();

        let summary = db.registers().close(Money::from_units(50), "ana").await.unwrap();
        let closure = summary.session.closure.clone().unwrap();

        assert_eq!(summary.session.status, RegisterStatus::Closed);
        assert_eq!(closure.expected_amount, Money::from_units(100));
        assert_eq!(closure.difference, Money::from_units(-50));
        assert_eq!(closure.deposit_amount, Money::zero());
        assert!(summary.reconciliation.breakdown.is_empty());
        assert_eq!(open_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let db = db().await;
        db.registers().open(Money::from_units(100), "ana").await.unwrap();
        db.registers().close(Money::from_units(100), "ana").await.unwrap();

        let second = db.registers().open(Money::from_units(200), "luis").await.unwrap();
        assert!(second.is_open());
    }

    #[tokio::test]
    async fn test_status_suggests_last_opening_amount() {
        let db = db().await;

        match db.registers().status().await.unwrap() {
            RegisterStatusView::Closed {
                suggested_opening_amount,
            } => assert!(suggested_opening_amount.is_zero()),
            other => panic!("expected closed status, got {:?}", other),
        }

        db.registers().open(Money::from_units(300), "ana").await.unwrap();
        assert!(matches!(
            db.registers().status().await.unwrap(),
            RegisterStatusView::Open { .. }
        ));
        db.registers().close(Money::from_units(300), "ana").await.unwrap();

        match db.registers().status().await.unwrap() {
            RegisterStatusView::Closed {
                suggested_opening_amount,
            } => assert_eq!(suggested_opening_amount, Money::from_units(300)),
            other => panic!("expected closed status, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_newest_first_and_clamped() {
        let db = db().await;
        for units in [100, 200, 300] {
            db.registers().open(Money::from_units(units), "ana").await.unwrap();
            db.registers().close(Money::from_units(units), "ana").await.unwrap();
        }
        db.registers().open(Money::from_units(400), "ana").await.unwrap();

        let history = db.registers().history(None).await.unwrap();
        let openings: Vec<i64> = history
            .iter()
            .map(|s| s.session.opening_amount.units())
            .collect();
        assert_eq!(openings, vec![300, 200, 100]);

        assert_eq!(db.registers().history(Some(1)).await.unwrap().len(), 1);
        assert_eq!(db.registers().history(Some(0)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_detail_by_short_code_case_insensitive() {
        let db = db().await;
        let session = db.registers().open(Money::from_units(100), "ana").await.unwrap();

        let detail = db
            .registers()
            .detail(&session.short_code.to_lowercase())
            .await
            .unwrap();
        assert_eq!(detail.session.id, session.id);
        assert!(detail.sales.is_empty());

        let err = db.registers().detail("zzzzz-none").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::RegisterNotFound(_))));
    }
}
