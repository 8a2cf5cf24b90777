//! Collaborator stores: payment methods, products and suppliers.
//!
//! Thin create/get/list endpoints so a till can be set up over HTTP.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use caja_core::validation::{require, require_text};
use caja_core::{NewPaymentMethod, NewProduct, PaymentMethod, Product, Quantity, Supplier};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Default and maximum page size of the product listing.
const DEFAULT_PRODUCT_PAGE: u32 = 50;
const MAX_PRODUCT_PAGE: u32 = 500;

// =============================================================================
// Payment Methods
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreatePaymentMethodRequest {
    pub name: Option<String>,
    #[serde(default)]
    pub percentage_bps: i64,
    #[serde(default)]
    pub is_arqueable: bool,
}

pub async fn list_payment_methods(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<PaymentMethod>>> {
    Ok(Json(state.db.payment_methods().list().await?))
}

pub async fn create_payment_method(
    State(state): State<AppState>,
    body: Result<Json<CreatePaymentMethodRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PaymentMethod>)> {
    let Json(req) = body?;

    let method = state
        .db
        .payment_methods()
        .create(&NewPaymentMethod {
            name: require_text("name", req.name)?,
            percentage_bps: req.percentage_bps,
            is_arqueable: req.is_arqueable,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(method)))
}

// =============================================================================
// Products
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
    #[serde(default)]
    pub stock: Quantity,
}

#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub limit: Option<u32>,
}

pub async fn create_product(
    State(state): State<AppState>,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(req) = body?;

    let product = state
        .db
        .products()
        .create(&NewProduct {
            name: require_text("name", req.name)?,
            category: req.category,
            price_cents: require("price_cents", req.price_cents)?,
            cost_cents: req.cost_cents,
            stock: req.stock,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &id))
}

pub async fn list_products(
    State(state): State<AppState>,
    query: Result<Query<ProductListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Product>>> {
    let Query(query) = query?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PRODUCT_PAGE)
        .clamp(1, MAX_PRODUCT_PAGE);

    Ok(Json(state.db.products().list_active(limit).await?))
}

// =============================================================================
// Suppliers
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateSupplierRequest {
    pub name: Option<String>,
}

pub async fn list_suppliers(State(state): State<AppState>) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.db.suppliers().list().await?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    body: Result<Json<CreateSupplierRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    let Json(req) = body?;
    let name = require_text("name", req.name)?;

    let supplier = state.db.suppliers().create(&name).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

// =============================================================================
// Health
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let (code, status) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (code, Json(HealthResponse { status, database }))
}
