//! Sale endpoint.
//!
//! ```json
//! POST /api/sales
//! {
//!   "user_id": "ana",
//!   "type": "VENTA",
//!   "items": [{ "product_id": "…", "quantity": "0.350" }],
//!   "payment_method_id": "…",
//!   "audit_log": [{ "productId": "…", "action": "ADD", … }]
//! }
//! ```

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use caja_core::validation::require;
use caja_core::{NewSale, Quantity, Sale, SaleItemRequest, SaleKind};
use serde::Deserialize;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaleItemBody {
    pub product_id: Option<String>,
    pub quantity: Option<Quantity>,
}

#[derive(Debug, Deserialize)]
pub struct RecordSaleRequest {
    pub user_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<SaleKind>,
    #[serde(default)]
    pub items: Vec<SaleItemBody>,
    pub payment_method_id: Option<String>,
    /// Passed through untouched; parsed leniently when read back.
    pub audit_log: Option<serde_json::Value>,
}

impl RecordSaleRequest {
    fn into_command(self) -> ApiResult<NewSale> {
        let items = self
            .items
            .into_iter()
            .map(|item| -> ApiResult<SaleItemRequest> {
                Ok(SaleItemRequest {
                    product_id: require("items.product_id", item.product_id)?,
                    quantity: require("items.quantity", item.quantity)?,
                })
            })
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(NewSale {
            user_id: require("user_id", self.user_id)?,
            kind: require("type", self.kind)?,
            items,
            payment_method_id: self.payment_method_id.filter(|id| !id.trim().is_empty()),
            audit_log: self.audit_log,
        })
    }
}

pub async fn record_sale(
    State(state): State<AppState>,
    body: Result<Json<RecordSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    let Json(req) = body?;
    let cmd = req.into_command()?;

    let sale = state.db.sales().record(&cmd).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}
