//! # Seed Data Generator
//!
//! Populates a database with the payment methods, suppliers and products a
//! store needs before the first register is opened.
//!
//! ## Usage
//! ```bash
//! # Seed ./caja_dev.db
//! cargo run -p caja-db --bin seed
//!
//! # Specify database path
//! cargo run -p caja-db --bin seed -- --db ./data/caja.db
//! ```
//!
//! ## Generated Data
//! - Payment methods: Efectivo (counted in the drawer), credit card with a
//!   10% surcharge, debit card, bank transfer with a 5% discount
//! - A handful of suppliers
//! - Products, some sold by weight (fractional stock)

use caja_core::{NewPaymentMethod, NewProduct, Quantity, DEFAULT_PAYMENT_METHOD_NAME};
use caja_db::{Database, DbConfig};
use std::env;

/// (name, percentage in basis points, counted in the drawer)
const PAYMENT_METHODS: &[(&str, i64, bool)] = &[
    (DEFAULT_PAYMENT_METHOD_NAME, 0, true),
    ("Tarjeta de crédito", 1_000, false),
    ("Tarjeta de débito", 0, false),
    ("Transferencia", -500, false),
];

const SUPPLIERS: &[&str] = &[
    "Lácteos del Sur",
    "Distribuidora Norte",
    "Panificadora San Martín",
    "Bebidas del Litoral",
];

/// (name, category, price in cents, stock in thousandths)
const PRODUCTS: &[(&str, &str, i64, i64)] = &[
    ("Leche entera 1L", "Lácteos", 1_150, 48_000),
    ("Yogur natural", "Lácteos", 890, 24_000),
    ("Queso cremoso (kg)", "Fiambrería", 8_900, 6_500),
    ("Jamón cocido (kg)", "Fiambrería", 11_200, 3_250),
    ("Pan francés (kg)", "Panadería", 2_400, 15_000),
    ("Medialunas x6", "Panadería", 3_300, 12_000),
    ("Agua mineral 2L", "Bebidas", 990, 60_000),
    ("Gaseosa cola 1.5L", "Bebidas", 2_150, 36_000),
    ("Yerba mate 1kg", "Almacén", 4_800, 20_000),
    ("Arroz 1kg", "Almacén", 1_700, 30_000),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./caja_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Caja Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./caja_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Caja Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Payment methods:");
    for (name, percentage_bps, is_arqueable) in PAYMENT_METHODS {
        let method = db
            .payment_methods()
            .create(&NewPaymentMethod {
                name: name.to_string(),
                percentage_bps: *percentage_bps,
                is_arqueable: *is_arqueable,
            })
            .await?;
        println!(
            "  {} ({}{})",
            method.name,
            method.percentage(),
            if method.is_arqueable { ", arqueable" } else { "" }
        );
    }

    println!();
    println!("Suppliers:");
    for name in SUPPLIERS {
        let supplier = db.suppliers().create(name).await?;
        println!("  {} [{}]", supplier.name, supplier.id);
    }

    println!();
    println!("Products:");
    for (name, category, price_cents, stock_milli) in PRODUCTS {
        let product = db
            .products()
            .create(&NewProduct {
                name: name.to_string(),
                category: Some(category.to_string()),
                price_cents: *price_cents,
                cost_cents: Some(price_cents * 65 / 100),
                stock: Quantity::from_milli(*stock_milli),
            })
            .await?;
        println!("  {} @ {} (stock {})", product.name, product.price(), product.stock);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
