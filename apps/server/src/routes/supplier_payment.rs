//! Supplier payment endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use caja_core::validation::{require, require_text};
use caja_core::{Money, NewSupplierPayment, SupplierPayment};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecordSupplierPaymentRequest {
    pub supplier_id: Option<String>,
    /// In cents.
    pub amount: Option<i64>,
    pub payment_method_id: Option<String>,
    pub user_id: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub paid_from_cash: bool,
    #[serde(alias = "cash_register_short_id")]
    pub cash_register_short_code: Option<String>,
}

pub async fn record_supplier_payment(
    State(state): State<AppState>,
    body: Result<Json<RecordSupplierPaymentRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SupplierPayment>)> {
    let Json(req) = body?;

    let cmd = NewSupplierPayment {
        supplier_id: require_text("supplier_id", req.supplier_id)?,
        amount: Money::from_cents(require("amount", req.amount)?),
        payment_method_id: require_text("payment_method_id", req.payment_method_id)?,
        user_id: require_text("user_id", req.user_id)?,
        description: req.description,
        paid_from_cash: req.paid_from_cash,
        cash_register_short_code: req.cash_register_short_code,
    };

    let payment = state.db.supplier_payments().record(&cmd).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}
