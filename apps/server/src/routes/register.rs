//! Register session endpoints.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use caja_core::validation::{require, require_text};
use caja_core::{
    ClosedRegisterSummary, Money, RegisterDetail, RegisterSession, RegisterStatusView,
};
use serde::Deserialize;
use tracing::debug;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OpenRegisterRequest {
    /// Float placed in the drawer, in cents.
    pub opening_amount: Option<i64>,
    pub opened_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CloseRegisterRequest {
    /// Cash physically counted, in cents.
    pub closing_amount: Option<i64>,
    pub closed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<u32>,
}

pub async fn open_register(
    State(state): State<AppState>,
    body: Result<Json<OpenRegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<RegisterSession>)> {
    let Json(req) = body?;
    let amount = require("opening_amount", req.opening_amount)?;
    let opened_by = require_text("opened_by", req.opened_by)?;

    let session = state
        .db
        .registers()
        .open(Money::from_cents(amount), &opened_by)
        .await?;

    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn close_register(
    State(state): State<AppState>,
    body: Result<Json<CloseRegisterRequest>, JsonRejection>,
) -> ApiResult<Json<ClosedRegisterSummary>> {
    let Json(req) = body?;
    let amount = require("closing_amount", req.closing_amount)?;
    let closed_by = require_text("closed_by", req.closed_by)?;

    let summary = state
        .db
        .registers()
        .close(Money::from_cents(amount), &closed_by)
        .await?;

    Ok(Json(summary))
}

pub async fn register_status(State(state): State<AppState>) -> ApiResult<Json<RegisterStatusView>> {
    Ok(Json(state.db.registers().status().await?))
}

pub async fn register_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<ClosedRegisterSummary>>> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(state.config.history_limit);
    debug!(limit, "Register history requested");

    Ok(Json(state.db.registers().history(Some(limit)).await?))
}

pub async fn register_detail(
    State(state): State<AppState>,
    Path(short_code): Path<String>,
) -> ApiResult<Json<RegisterDetail>> {
    Ok(Json(state.db.registers().detail(&short_code).await?))
}
