//! # Service Errors
//!
//! The one error type every service operation returns, and its HTTP form.
//!
//! ```text
//! CoreError      ──► kind() ─────────────────────────┐
//! DbError        ──► UNIQUE payments.order_id ► Conflict
//!                    anything else ► Internal (logged) ├──► ServiceError ──► {"code", "message"}
//! ProcessorError ──► Upstream (message passed through) ┘
//! JsonRejection  ──► InvalidArgument
//! ```

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use nexcart_core::{CoreError, ErrorKind, ValidationError};
use nexcart_db::{DbError, PAYMENT_ORDER_UNIQUE};

use crate::processor::ProcessorError;

/// Error returned by every service operation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub message: String,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ServiceError {
            kind,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidState => StatusCode::BAD_REQUEST,
            ErrorKind::PermissionDenied => StatusCode::FORBIDDEN,
            // The processor's message is shown to the buyer as a bad request
            ErrorKind::Upstream => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<CoreError> for ServiceError {
    fn from(err: CoreError) -> Self {
        ServiceError::new(err.kind(), err.to_string())
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation_on(PAYMENT_ORDER_UNIQUE) {
            return ServiceError::new(ErrorKind::Conflict, "Payment already exists for this order");
        }

        match err {
            DbError::UniqueViolation { field } => {
                tracing::error!("Unexpected unique violation: {}", field);
                ServiceError::new(ErrorKind::Conflict, "Record already exists")
            }
            DbError::NotFound { entity, id } => {
                ServiceError::new(ErrorKind::NotFound, format!("{} not found: {}", entity, id))
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ServiceError::new(ErrorKind::InvalidArgument, "Invalid reference")
            }
            DbError::PoolExhausted => {
                tracing::error!("Database pool exhausted");
                ServiceError::internal("Database is busy, try again")
            }
            other => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", other);
                ServiceError::internal("Database operation failed")
            }
        }
    }
}

/// Transaction `commit()`/`rollback()` surface raw sqlx errors.
impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

/// A body that is not JSON or does not fit the request type.
impl From<JsonRejection> for ServiceError {
    fn from(rejection: JsonRejection) -> Self {
        ServiceError::new(ErrorKind::InvalidArgument, rejection.body_text())
    }
}

impl From<ProcessorError> for ServiceError {
    fn from(err: ProcessorError) -> Self {
        match err {
            ProcessorError::Rejected(message) => ServiceError::new(ErrorKind::Upstream, message),
            other => {
                tracing::error!("Payment processor call failed: {}", other);
                ServiceError::new(ErrorKind::Upstream, other.to_string())
            }
        }
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// Wire form of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            code: self.kind.as_str(),
            message: self.message,
        };
        (status, Json(body)).into_response()
    }
}
