//! # caja-db: Database Layer for Caja
//!
//! Persistence and transaction boundaries for the register subsystem.
//! SQLite through sqlx; business math lives in `caja-core`.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Caja Data Flow                                 │
//! │                                                                         │
//! │  HTTP handler (POST /api/registers/close)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                     caja-db (THIS CRATE)                        │    │
//! │  │                                                                 │    │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐   │    │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │   │    │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │   │    │
//! │  │   │               │    │ RegisterRepo    │   │              │   │    │
//! │  │   │ SqlitePool    │◄───│ SaleRepo        │   │ 001_init.sql │   │    │
//! │  │   │ WAL, FKs,     │    │ SupplierPayRepo │   │              │   │    │
//! │  │   │ busy_timeout  │    │ catalog repos   │   │              │   │    │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘   │    │
//! │  │                              │                                  │    │
//! │  │                              ▼                                  │    │
//! │  │                   caja-core (pricing, reconciliation, closing)  │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (caja.db)                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use caja_db::{Database, DbConfig};
//! use caja_core::Money;
//!
//! let db = Database::new(DbConfig::new("caja.db")).await?;
//!
//! db.registers().open(Money::from_units(500), "ana").await?;
//! let summary = db.registers().close(Money::from_units(650), "ana").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::payment_method::PaymentMethodRepository;
pub use repository::product::ProductRepository;
pub use repository::register::RegisterRepository;
pub use repository::sale::SaleRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::supplier_payment::SupplierPaymentRepository;
