//! # caja-server: HTTP API for Caja
//!
//! Exposes the register session manager, the sale processor and the
//! supplier payment recorder as a JSON API.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Caja Server                                      │
//! │                                                                         │
//! │  Client ───► axum Router ───► routes::* ───► caja-db ───► SQLite        │
//! │                  │                              │                       │
//! │             TraceLayer                     caja-core                    │
//! │         (one span per request)      (pricing, arqueo, validation)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The router is built here, not in `main.rs`, so integration tests can
//! drive it in-process with `tower::ServiceExt::oneshot`.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::catalog::health))
        .nest("/api", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
