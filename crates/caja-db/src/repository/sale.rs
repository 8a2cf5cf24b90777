//! # Sale Repository
//!
//! The sale processor: turns a cart into an append-only sale record.
//!
//! ## Processing Steps (one transaction)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate command                                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  lock open register ──── VENTA and none open ──► RegisterClosed         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  bulk-load products ──── unknown id ──► ProductNotFound                 │
//! │  resolve payment method ── unknown id ──► PaymentMethodNotFound         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  stock guard (VENTA only) ──► InsufficientStock                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  total = Σ price × qty, adjusted by the method percentage (VENTA only)  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT sale + lines, decrement stock (VENTA only)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  COMMIT  (any error above rolls everything back)                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A `VENTA_NO_REALIZADA` (abandoned cart) is recorded as CANCELLED with no
//! register attached. It never touches stock and works with the register
//! closed or with products that are out of stock.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info};

use super::{generate_id, payment_method, product, register};
use crate::error::DbResult;
use caja_core::audit::parse_audit_log;
use caja_core::pricing::compute_sale_total;
use caja_core::validation::validate_new_sale;
use caja_core::{
    CoreError, Money, NewSale, Percentage, Quantity, Sale, SaleKind, SaleLine, SaleOutcome,
    SaleStatus, SaleTender, TenderMethod,
};

const SALE_SELECT: &str = r#"
    SELECT s.id, s.total_cents, s.kind, s.status, s.user_id, s.payment_method_id,
           s.register_session_id, s.audit_log, s.created_at,
           pm.name AS method_name, pm.is_arqueable AS method_is_arqueable
    FROM sales s
    LEFT JOIN payment_methods pm ON pm.id = s.payment_method_id
"#;

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleRow {
    id: String,
    total_cents: i64,
    kind: SaleKind,
    status: SaleStatus,
    user_id: String,
    payment_method_id: Option<String>,
    register_session_id: Option<String>,
    audit_log: Option<String>,
    created_at: DateTime<Utc>,
    method_name: Option<String>,
    method_is_arqueable: Option<bool>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct SaleLineRow {
    sale_id: String,
    product_id: String,
    quantity_milli: i64,
    unit_price_cents: i64,
}

/// A persisted sale together with the method facts reconciliation needs.
#[derive(Debug, Clone)]
pub(crate) struct LoadedSale {
    pub sale: Sale,
    pub method: Option<TenderMethod>,
}

impl LoadedSale {
    pub fn tender(&self) -> SaleTender {
        SaleTender {
            total: self.sale.total,
            status: self.sale.status(),
            method: self.method.clone(),
        }
    }
}

impl SaleRow {
    fn into_loaded(self, lines: Vec<SaleLine>) -> LoadedSale {
        let outcome = match (self.status, self.register_session_id) {
            (SaleStatus::Completed, Some(register_session_id)) => SaleOutcome::Completed {
                register_session_id,
            },
            _ => SaleOutcome::Voided,
        };
        debug_assert_eq!(outcome.kind(), self.kind);

        let method = match (self.method_name, self.method_is_arqueable) {
            (Some(name), Some(is_arqueable)) => Some(TenderMethod { name, is_arqueable }),
            _ => None,
        };

        LoadedSale {
            sale: Sale {
                id: self.id,
                total: Money::from_cents(self.total_cents),
                outcome,
                user_id: self.user_id,
                payment_method_id: self.payment_method_id,
                lines,
                audit_log: parse_audit_log(self.audit_log.as_deref()),
                created_at: self.created_at,
            },
            method,
        }
    }
}

/// Repository for the sale processor.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Records a sale.
    ///
    /// Either every effect lands (sale row, lines, stock decrements) or
    /// none does.
    ///
    /// ## Errors
    /// - `CoreError::Validation` for a blank user, an empty or oversized cart,
    ///   or a total beyond what the register accepts
    /// - `CoreError::RegisterClosed` for a `VENTA` with no open register
    /// - `CoreError::ProductNotFound` / `CoreError::PaymentMethodNotFound`
    /// - `CoreError::InsufficientStock` when a `VENTA` line exceeds stock
    pub async fn record(&self, cmd: &NewSale) -> DbResult<Sale> {
        validate_new_sale(cmd).map_err(CoreError::from)?;
        let is_real = cmd.kind.is_real();

        debug!(kind = ?cmd.kind, items = cmd.items.len(), user = %cmd.user_id, "Recording sale");

        let mut tx = self.pool.begin().await?;

        // Taken for every kind: the first statement must be a write.
        let open = register::lock_open_session(&mut *tx).await?;
        let outcome = match (is_real, open) {
            (true, Some(session)) => SaleOutcome::Completed {
                register_session_id: session.id,
            },
            (true, None) => return Err(CoreError::RegisterClosed.into()),
            (false, _) => SaleOutcome::Voided,
        };

        let ids: Vec<&str> = cmd.items.iter().map(|i| i.product_id.as_str()).collect();
        let products = product::load_many(&mut *tx, &ids).await?;

        let percentage = match cmd.payment_method_id.as_deref() {
            Some(id) => {
                let method = payment_method::find(&mut *tx, id)
                    .await?
                    .ok_or_else(|| CoreError::PaymentMethodNotFound(id.to_string()))?;
                if is_real {
                    method.percentage()
                } else {
                    Percentage::zero()
                }
            }
            None => Percentage::zero(),
        };

        let mut lines = Vec::with_capacity(cmd.items.len());
        for item in &cmd.items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| CoreError::ProductNotFound(item.product_id.clone()))?;

            if is_real && !product.can_sell(item.quantity) {
                return Err(CoreError::InsufficientStock {
                    product: product.name.clone(),
                    available: product.stock,
                    requested: item.quantity,
                }
                .into());
            }

            lines.push(SaleLine {
                product_id: product.id.clone(),
                quantity: item.quantity,
                unit_price: product.price(),
            });
        }

        let total = compute_sale_total(&lines, percentage).map_err(CoreError::from)?;
        let audit_raw = cmd.audit_log.as_ref().map(|v| v.to_string());

        let sale = Sale {
            id: generate_id(),
            total,
            outcome,
            user_id: cmd.user_id.trim().to_string(),
            payment_method_id: cmd.payment_method_id.clone(),
            lines,
            audit_log: parse_audit_log(audit_raw.as_deref()),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                id, total_cents, kind, status, user_id, payment_method_id,
                register_session_id, audit_log, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(sale.total.cents())
        .bind(sale.kind())
        .bind(sale.status())
        .bind(&sale.user_id)
        .bind(&sale.payment_method_id)
        .bind(sale.outcome.register_session_id())
        .bind(&audit_raw)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        for (line_no, line) in sale.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO sale_lines (sale_id, line_no, product_id, quantity_milli, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&sale.id)
            .bind(line_no as i64)
            .bind(&line.product_id)
            .bind(line.quantity.milli())
            .bind(line.unit_price.cents())
            .execute(&mut *tx)
            .await?;
        }

        if is_real {
            for line in &sale.lines {
                // The pre-check above saw one snapshot; repeated product lines
                // in one cart are caught here.
                if !product::decrement_stock(&mut *tx, &line.product_id, line.quantity).await? {
                    let available = product::current_stock(&mut *tx, &line.product_id)
                        .await?
                        .unwrap_or(Quantity::ZERO);
                    let name = products
                        .get(&line.product_id)
                        .map(|p| p.name.clone())
                        .unwrap_or_else(|| line.product_id.clone());

                    return Err(CoreError::InsufficientStock {
                        product: name,
                        available,
                        requested: line.quantity,
                    }
                    .into());
                }
            }
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            kind = ?sale.kind(),
            total = %sale.total,
            lines = sale.lines.len(),
            register = ?sale.outcome.register_session_id(),
            "Sale recorded"
        );

        Ok(sale)
    }

    /// Gets a sale by ID, lines included.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let mut conn = self.pool.acquire().await?;

        let row = sqlx::query_as::<_, SaleRow>(&format!("{} WHERE s.id = ?1", SALE_SELECT))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut lines = load_lines(&mut *conn, &[row.id.as_str()]).await?;
        let sale_lines = lines.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_loaded(sale_lines).sale))
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Loads the COMPLETED sales attributed to a register session, oldest first.
pub(crate) async fn load_for_session(
    conn: &mut SqliteConnection,
    session_id: &str,
) -> DbResult<Vec<LoadedSale>> {
    let rows = sqlx::query_as::<_, SaleRow>(&format!(
        r#"
        {}
        WHERE s.register_session_id = ?1 AND s.status = 'completed'
        ORDER BY s.created_at, s.rowid
        "#,
        SALE_SELECT
    ))
    .bind(session_id)
    .fetch_all(&mut *conn)
    .await?;

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    let mut lines = load_lines(&mut *conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let sale_lines = lines.remove(&row.id).unwrap_or_default();
            row.into_loaded(sale_lines)
        })
        .collect())
}

async fn load_lines(
    conn: &mut SqliteConnection,
    sale_ids: &[&str],
) -> DbResult<HashMap<String, Vec<SaleLine>>> {
    if sale_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT sale_id, product_id, quantity_milli, unit_price_cents FROM sale_lines WHERE sale_id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in sale_ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY sale_id, line_no");

    let rows: Vec<SaleLineRow> = builder.build_query_as().fetch_all(&mut *conn).await?;

    let mut grouped: HashMap<String, Vec<SaleLine>> = HashMap::new();
    for row in rows {
        grouped.entry(row.sale_id).or_default().push(SaleLine {
            product_id: row.product_id,
            quantity: Quantity::from_milli(row.quantity_milli),
            unit_price: Money::from_cents(row.unit_price_cents),
        });
    }

    Ok(grouped)
}

// =============================================================================
// Unit Tests
// =============================================================================
