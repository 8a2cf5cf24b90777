//! # Payment Method Repository
//!
//! Named ways of settling money, each with a surcharge/discount and an
//! arqueable flag. Methods are referenced by sales and supplier payments
//! and never deleted.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::generate_id;
use crate::error::{DbError, DbResult};
use caja_core::validation::validate_new_payment_method;
use caja_core::{CoreError, NewPaymentMethod, PaymentMethod};

#[derive(Debug, Clone, sqlx::FromRow)]
struct PaymentMethodRow {
    id: String,
    name: String,
    percentage_bps: i64,
    is_arqueable: bool,
    created_at: DateTime<Utc>,
}

impl From<PaymentMethodRow> for PaymentMethod {
    fn from(row: PaymentMethodRow) -> Self {
        PaymentMethod {
            id: row.id,
            name: row.name,
            percentage_bps: row.percentage_bps,
            is_arqueable: row.is_arqueable,
            created_at: row.created_at,
        }
    }
}

/// Repository for payment method database operations.
#[derive(Debug, Clone)]
pub struct PaymentMethodRepository {
    pool: SqlitePool,
}

impl PaymentMethodRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentMethodRepository { pool }
    }

    /// Registers a payment method. Names are unique.
    pub async fn create(&self, new: &NewPaymentMethod) -> DbResult<PaymentMethod> {
        validate_new_payment_method(new).map_err(CoreError::from)?;

        let method = PaymentMethod {
            id: generate_id(),
            name: new.name.trim().to_string(),
            percentage_bps: new.percentage_bps,
            is_arqueable: new.is_arqueable,
            created_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO payment_methods (id, name, percentage_bps, is_arqueable, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&method.id)
        .bind(&method.name)
        .bind(method.percentage_bps)
        .bind(method.is_arqueable)
        .bind(method.created_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            let err = DbError::from(e);
            if err.is_unique_violation_on("payment_methods.name") {
                return Err(DbError::duplicate("name", &method.name));
            }
            return Err(err);
        }

        info!(
            id = %method.id,
            name = %method.name,
            percentage = %method.percentage(),
            is_arqueable = method.is_arqueable,
            "Payment method created"
        );

        Ok(method)
    }

    /// Gets a payment method by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PaymentMethod>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut *conn, id).await
    }

    /// Lists every payment method by name.
    pub async fn list(&self) -> DbResult<Vec<PaymentMethod>> {
        debug!("Listing payment methods");

        let rows = sqlx::query_as::<_, PaymentMethodRow>(
            r#"
            SELECT id, name, percentage_bps, is_arqueable, created_at
            FROM payment_methods
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PaymentMethod::from).collect())
    }
}

/// Looks up a payment method on an existing connection or transaction.
pub(crate) async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<PaymentMethod>> {
    let row = sqlx::query_as::<_, PaymentMethodRow>(
        r#"
        SELECT id, name, percentage_bps, is_arqueable, created_at
        FROM payment_methods
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(PaymentMethod::from))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn card() -> NewPaymentMethod {
        NewPaymentMethod {
            name: "Tarjeta de crédito".to_string(),
            percentage_bps: 1000,
            is_arqueable: false,
        }
    }

    #[tokio::test]
    async fn test_create_get_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.payment_methods();

        let cash = repo
            .create(&NewPaymentMethod {
                name: "Efectivo".to_string(),
                percentage_bps: 0,
                is_arqueable: true,
            })
            .await
            .unwrap();
        let tarjeta = repo.create(&card()).await.unwrap();

        let fetched = repo.get_by_id(&tarjeta.id).await.unwrap().unwrap();
        assert_eq!(fetched.percentage_bps, 1000);
        assert!(!fetched.is_arqueable);

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec![cash.name, tarjeta.name]);
    }

    #[tokio::test]
    async fn test_duplicate_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.payment_methods();

        repo.create(&card()).await.unwrap();
        let err = repo.create(&card()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn test_rejects_out_of_range_percentage() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut method = card();
        method.percentage_bps = -20_000;

        let err = db.payment_methods().create(&method).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }
}
