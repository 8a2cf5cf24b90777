//! Concurrent tills against a file-backed database (WAL, several connections).

use caja_core::{CoreError, Money, NewProduct, NewSale, Quantity, SaleItemRequest, SaleKind};
use caja_db::{Database, DbConfig, DbError};
use tempfile::TempDir;

async fn file_db(dir: &TempDir) -> Database {
    let config = DbConfig::new(dir.path().join("caja.db")).max_connections(8);
    Database::new(config).await.unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_only_one_concurrent_open_wins() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    let mut tasks = vec![];
    for i in 0..8 {
        let registers = db.registers();
        tasks.push(tokio::spawn(async move {
            registers
                .open(Money::from_units(100 + i), &format!("cajero-{}", i))
                .await
        }));
    }

    let mut opened = 0;
    let mut rejected = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => opened += 1,
            Err(DbError::Core(CoreError::RegisterAlreadyOpen)) => rejected += 1,
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(opened, 1);
    assert_eq!(rejected, 7);

    let open_rows: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM register_sessions WHERE status = 'open'")
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(open_rows, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_unit_sells_once() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    db.registers().open(Money::zero(), "ana").await.unwrap();
    let product = db
        .products()
        .create(&NewProduct {
            name: "Torta del día".to_string(),
            category: None,
            price_cents: 5_000,
            cost_cents: None,
            stock: Quantity::from_units(3),
        })
        .await
        .unwrap();

    let mut tasks = vec![];
    for _ in 0..10 {
        let sales = db.sales();
        let id = product.id.clone();
        tasks.push(tokio::spawn(async move {
            sales
                .record(&NewSale {
                    user_id: "ana".to_string(),
                    kind: SaleKind::Venta,
                    items: vec![SaleItemRequest {
                        product_id: id,
                        quantity: Quantity::from_units(1),
                    }],
                    payment_method_id: None,
                    audit_log: None,
                })
                .await
        }));
    }

    let mut sold = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => sold += 1,
            Err(DbError::Core(CoreError::InsufficientStock { .. })) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(sold, 3);
    let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
    assert_eq!(stock, Quantity::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_close_and_sale_race_stays_consistent() {
    let dir = TempDir::new().unwrap();
    let db = file_db(&dir).await;

    db.registers().open(Money::zero(), "ana").await.unwrap();
    let product = db
        .products()
        .create(&NewProduct {
            name: "Café".to_string(),
            category: None,
            price_cents: 1_000,
            cost_cents: None,
            stock: Quantity::from_units(100),
        })
        .await
        .unwrap();

    let mut tasks = vec![];
    for _ in 0..10 {
        let sales = db.sales();
        let id = product.id.clone();
        tasks.push(tokio::spawn(async move {
            sales
                .record(&NewSale {
                    user_id: "ana".to_string(),
                    kind: SaleKind::Venta,
                    items: vec![SaleItemRequest {
                        product_id: id,
                        quantity: Quantity::from_units(1),
                    }],
                    payment_method_id: None,
                    audit_log: None,
                })
                .await
                .is_ok()
        }));
    }
    let registers = db.registers();
    let close = tokio::spawn(async move { registers.close(Money::zero(), "ana").await });

    let mut sold = 0i64;
    for task in tasks {
        if task.await.unwrap() {
            sold += 1;
        }
    }
    let summary = close.await.unwrap().unwrap();

    // Every sale that succeeded is either in the frozen breakdown or failed
    // against the closed register; none is lost in between.
    let counted = summary.reconciliation.arqueable_total.cents() / 1_000;
    assert_eq!(counted, sold);

    let history = db.registers().history(Some(1)).await.unwrap();
    assert_eq!(history[0].reconciliation, summary.reconciliation);
}
