//! # Supplier Repository

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::generate_id;
use crate::error::DbResult;
use caja_core::validation::validate_name;
use caja_core::{CoreError, Supplier};

#[derive(Debug, Clone, sqlx::FromRow)]
struct SupplierRow {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn create(&self, name: &str) -> DbResult<Supplier> {
        validate_name("name", name).map_err(CoreError::from)?;

        let supplier = Supplier {
            id: generate_id(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %supplier.id, name = %supplier.name, "Creating supplier");

        sqlx::query("INSERT INTO suppliers (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&supplier.id)
            .bind(&supplier.name)
            .bind(supplier.created_at)
            .execute(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let mut conn = self.pool.acquire().await?;
        find(&mut *conn, id).await
    }

    /// Lists suppliers by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let rows = sqlx::query_as::<_, SupplierRow>(
            "SELECT id, name, created_at FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Supplier::from).collect())
    }
}

pub(crate) async fn find(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Supplier>> {
    let row = sqlx::query_as::<_, SupplierRow>(
        "SELECT id, name, created_at FROM suppliers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Supplier::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};

    #[tokio::test]
    async fn test_create_and_list() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.suppliers();

        let lacteos = repo.create("Lácteos del Sur").await.unwrap();
        repo.create("Almacén Central").await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Almacén Central", "Lácteos del Sur"]);

        let fetched = repo.get_by_id(&lacteos.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Lácteos del Sur");
    }

    #[tokio::test]
    async fn test_blank_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.suppliers().create("   ").await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }
}
