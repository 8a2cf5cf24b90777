//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Caja                                   │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                     │
//! │         │                                                               │
//! │         ├── CoreError::RegisterClosed ──────────► 409 REGISTER_CLOSED    │
//! │         ├── CoreError::InsufficientStock ───────► 422 INSUFFICIENT_STOCK │
//! │         ├── ValidationError::Required ──────────► 400 MISSING_REQUIRED_  │
//! │         │                                             FIELD             │
//! │         ├── DbError::QueryFailed(..) ───────────► 500 DATABASE_ERROR     │
//! │         │        (details logged, never returned)                       │
//! │         ▼                                                               │
//! │  { "code": "REGISTER_CLOSED", "message": "..." }                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! State conflicts get their own codes so a client can send the cashier to
//! the right screen ("open a register first") instead of a generic failure.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use caja_core::{CoreError, ValidationError};
use caja_db::DbError;
use serde::Serialize;

/// API error returned from handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NO_OPEN_REGISTER",
///   "message": "There is no open cash register"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// A register is already open (409)
    RegisterAlreadyOpen,

    /// Close requested with nothing open (409)
    NoOpenRegister,

    /// Real sale attempted with the register closed (409)
    RegisterClosed,

    /// Sale references an unknown product (404)
    ProductNotFound,

    /// Sale references an unknown payment method (404)
    PaymentMethodNotFound,

    /// Payment references an unknown supplier (404)
    SupplierNotFound,

    /// A line exceeds current stock (422)
    InsufficientStock,

    /// A required field is absent or blank (400)
    MissingRequiredField,

    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Unique value already taken (409)
    Duplicate,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(&self) -> StatusCode {
        match self {
            ErrorCode::RegisterAlreadyOpen
            | ErrorCode::NoOpenRegister
            | ErrorCode::RegisterClosed
            | ErrorCode::Duplicate => StatusCode::CONFLICT,
            ErrorCode::ProductNotFound
            | ErrorCode::PaymentMethodNotFound
            | ErrorCode::SupplierNotFound
            | ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::InsufficientStock => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::MissingRequiredField | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => ApiError::from(core),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Duplicate,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        if let CoreError::Validation(v) = err {
            return ApiError::from(v);
        }

        let code = match &err {
            CoreError::RegisterAlreadyOpen => ErrorCode::RegisterAlreadyOpen,
            CoreError::NoOpenRegister => ErrorCode::NoOpenRegister,
            CoreError::RegisterClosed => ErrorCode::RegisterClosed,
            CoreError::ProductNotFound(_) => ErrorCode::ProductNotFound,
            CoreError::PaymentMethodNotFound(_) => ErrorCode::PaymentMethodNotFound,
            CoreError::SupplierNotFound(_) => ErrorCode::SupplierNotFound,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::RegisterNotFound(_) => ErrorCode::NotFound,
            CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let code = match err {
            ValidationError::Required { .. } => ErrorCode::MissingRequiredField,
            _ => ErrorCode::ValidationError,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use caja_core::Quantity;

    #[test]
    fn test_state_conflicts_are_distinct() {
        for (err, code) in [
            (CoreError::RegisterAlreadyOpen, ErrorCode::RegisterAlreadyOpen),
            (CoreError::NoOpenRegister, ErrorCode::NoOpenRegister),
            (CoreError::RegisterClosed, ErrorCode::RegisterClosed),
        ] {
            let api = ApiError::from(DbError::from(err));
            assert_eq!(api.code, code);
            assert_eq!(api.code.status(), StatusCode::CONFLICT);
        }
    }

    #[test]
    fn test_insufficient_stock_is_unprocessable() {
        let api = ApiError::from(CoreError::InsufficientStock {
            product: "Queso".to_string(),
            available: Quantity::from_milli(500),
            requested: Quantity::from_units(1),
        });
        assert_eq!(api.code, ErrorCode::InsufficientStock);
        assert_eq!(api.code.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(api.message.contains("Queso"));
    }

    #[test]
    fn test_required_field_maps_to_missing() {
        let api = ApiError::from(CoreError::from(ValidationError::required("supplier_id")));
        assert_eq!(api.code, ErrorCode::MissingRequiredField);
        assert_eq!(api.code.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_storage_failure_hides_details() {
        let api = ApiError::from(DbError::QueryFailed("no such table: sales".to_string()));
        assert_eq!(api.code, ErrorCode::DatabaseError);
        assert!(!api.message.contains("sales"));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::from(CoreError::RegisterClosed)).unwrap();
        assert_eq!(json["code"], "REGISTER_CLOSED");
        assert!(json["message"].is_string());
    }
}
