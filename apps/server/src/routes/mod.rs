//! # HTTP Routes
//!
//! JSON handlers, one module per area. Handlers only unpack the request,
//! check field presence and call a repository; every rule lives below them.
//!
//! ## Route Map
//! ```text
//! GET  /health
//! POST /api/registers/open            → RegisterSession            (201)
//! POST /api/registers/close           → ClosedRegisterSummary
//! GET  /api/registers/status          → RegisterStatusView
//! GET  /api/registers/history?limit=N → [ClosedRegisterSummary]
//! GET  /api/registers/:short_code     → RegisterDetail
//! POST /api/sales                     → Sale                       (201)
//! POST /api/supplier-payments         → SupplierPayment            (201)
//! GET  /api/payment-methods           POST /api/payment-methods
//! GET  /api/products                  POST /api/products
//! GET  /api/products/:id
//! GET  /api/suppliers                 POST /api/suppliers
//! ```
//!
//! Amounts travel as integer cents; quantities as decimals (`"0.350"`).

pub mod catalog;
pub mod register;
pub mod sale;
pub mod supplier_payment;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Routes under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/registers/open", post(register::open_register))
        .route("/registers/close", post(register::close_register))
        .route("/registers/status", get(register::register_status))
        .route("/registers/history", get(register::register_history))
        .route("/registers/:short_code", get(register::register_detail))
        .route("/sales", post(sale::record_sale))
        .route(
            "/supplier-payments",
            post(supplier_payment::record_supplier_payment),
        )
        .route(
            "/payment-methods",
            get(catalog::list_payment_methods).post(catalog::create_payment_method),
        )
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route("/products/:id", get(catalog::get_product))
        .route(
            "/suppliers",
            get(catalog::list_suppliers).post(catalog::create_supplier),
        )
}
