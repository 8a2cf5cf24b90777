//! # Product Repository
//!
//! The inventory store the sale processor calls into: price lookup and
//! stock decrement by id set.
//!
//! ## Stock Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products SET stock_milli = stock_milli - :qty                   │
//! │  WHERE id = :id AND (:qty <= 0 OR stock_milli >= :qty)                  │
//! │                                                                         │
//! │  rows_affected = 1  → decremented                                       │
//! │  rows_affected = 0  → stock would go negative, sale is rejected         │
//! │                                                                         │
//! │  The check and the write are one statement, so two tills selling the    │
//! │  last unit can never both succeed.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use super::generate_id;
use crate::error::DbResult;
use caja_core::validation::validate_new_product;
use caja_core::{NewProduct, Product, Quantity};

const PRODUCT_COLUMNS: &str =
    "id, name, category, price_cents, cost_cents, stock_milli, is_active, created_at, updated_at";

/// Row shape of the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    category: Option<String>,
    price_cents: i64,
    cost_cents: Option<i64>,
    stock_milli: i64,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            name: row.name,
            category: row.category,
            price_cents: row.price_cents,
            cost_cents: row.cost_cents,
            stock: Quantity::from_milli(row.stock_milli),
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Adds a product to the inventory store.
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        validate_new_product(new).map_err(caja_core::CoreError::from)?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            name: new.name.trim().to_string(),
            category: new
                .category
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            price_cents: new.price_cents,
            cost_cents: new.cost_cents,
            stock: new.stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Creating product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, category, price_cents, cost_cents,
                stock_milli, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.stock.milli())
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        debug!(id = %id, "Getting product");

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE id = ?1",
            PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Product::from))
    }

    /// Lists active products by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM products WHERE is_active = 1 ORDER BY name LIMIT ?1",
            PRODUCT_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Counts active products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Bulk-loads products by id into a lookup keyed by id.
///
/// Unknown ids are simply absent from the map.
pub(crate) async fn load_many(
    conn: &mut SqliteConnection,
    ids: &[&str],
) -> DbResult<HashMap<String, Product>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM products WHERE id IN (", PRODUCT_COLUMNS));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<ProductRow> = builder.build_query_as().fetch_all(&mut *conn).await?;

    debug!(requested = ids.len(), found = rows.len(), "Loaded products");

    Ok(rows
        .into_iter()
        .map(|row| (row.id.clone(), Product::from(row)))
        .collect())
}

/// Takes `quantity` out of stock unless that would drive it negative.
///
/// Returns `false` when the guard rejected the write. Non-positive
/// quantities always apply (they put stock back).
pub(crate) async fn decrement_stock(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: Quantity,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE products
        SET stock_milli = stock_milli - ?2,
            updated_at = ?3
        WHERE id = ?1
          AND (?2 <= 0 OR stock_milli >= ?2)
        "#,
    )
    .bind(id)
    .bind(quantity.milli())
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Reads the current stock of a product.
pub(crate) async fn current_stock(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Quantity>> {
    let stock: Option<i64> = sqlx::query_scalar("SELECT stock_milli FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(stock.map(Quantity::from_milli))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use caja_core::CoreError;

    fn queso() -> NewProduct {
        NewProduct {
            name: "  Queso cremoso ".to_string(),
            category: Some("Fiambrería".to_string()),
            price_cents: 1299,
            cost_cents: Some(800),
            stock: Quantity::from_milli(2_500),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.products();

        let created = repo.create(&queso()).await.unwrap();
        assert_eq!(created.name, "Queso cremoso");

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.stock, Quantity::from_milli(2_500));
        assert_eq!(fetched.price_cents, 1299);
        assert_eq!(fetched.category.as_deref(), Some("Fiambrería"));

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_create_rejects_negative_price() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut product = queso();
        product.price_cents = -1;

        let err = db.products().create(&product).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_load_many_skips_unknown_ids() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let a = db.products().create(&queso()).await.unwrap();

        let mut conn = db.pool().acquire().await.unwrap();
        let found = load_many(&mut *conn, &[a.id.as_str(), "ghost"]).await.unwrap();

        assert_eq!(found.len(), 1);
        assert!(found.contains_key(&a.id));
        assert!(load_many(&mut *conn, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_decrement_guard() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = db.products().create(&queso()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        assert!(decrement_stock(&mut *conn, &p.id, Quantity::from_milli(2_000)).await.unwrap());
        assert!(!decrement_stock(&mut *conn, &p.id, Quantity::from_milli(501)).await.unwrap());
        assert!(decrement_stock(&mut *conn, &p.id, Quantity::from_milli(500)).await.unwrap());
        assert_eq!(current_stock(&mut *conn, &p.id).await.unwrap(), Some(Quantity::ZERO));

        // Negative quantities put stock back even at zero.
        assert!(decrement_stock(&mut *conn, &p.id, Quantity::from_units(-1)).await.unwrap());
        assert_eq!(
            current_stock(&mut *conn, &p.id).await.unwrap(),
            Some(Quantity::from_units(1))
        );
    }
}
