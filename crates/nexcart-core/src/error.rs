//! # Error Types
//!
//! Domain-specific error types for nexcart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  nexcart-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  ├── ValidationError  - Malformed input                                │
//! │  └── ErrorKind        - The taxonomy every error collapses onto        │
//! │                                                                         │
//! │  nexcart-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  shop-api errors (in app)                                              │
//! │  ├── ProcessorError   - Payment processor failures                     │
//! │  └── ServiceError     - What the client sees {code, message}           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError ─┐                                  │
//! │        DbError ─────────────────────┼──► ServiceError → HTTP           │
//! │        ProcessorError ──────────────┘                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Not found" and "not yours" are the same variant. A caller probing
//! another user's cart line, order or payment cannot tell it exists.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

// =============================================================================
// Error Kind
// =============================================================================

/// Failure taxonomy shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Referenced entity absent, or not owned by the caller.
    NotFound,
    /// Malformed input: missing field, bad quantity, empty cart.
    InvalidArgument,
    /// Uniqueness violation, e.g. a second payment for one order.
    Conflict,
    /// Operation not valid at the current state machine position.
    InvalidState,
    /// Ownership or role check failed.
    PermissionDenied,
    /// The external payment processor rejected the call.
    Upstream,
    /// Anything else. Details are logged, never shown.
    Internal,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::InvalidArgument => "INVALID_ARGUMENT",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::InvalidState => "INVALID_STATE",
            ErrorKind::PermissionDenied => "PERMISSION_DENIED",
            ErrorKind::Upstream => "UPSTREAM_ERROR",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the cart, checkout and payment flows.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The user has never had a cart.
    #[error("Cart not found for user {0}")]
    CartNotFound(String),

    /// Line absent, or it belongs to another cart.
    #[error("Cart item not found: {0}")]
    CartLineNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Address absent, or owned by someone else.
    #[error("Address not found: {0}")]
    AddressNotFound(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Checkout attempted with zero lines.
    ///
    /// ## When This Occurs
    /// ```text
    /// Checkout A ──► claims cart ──► 2 lines ──► order created, cart emptied
    /// Checkout B ──► waits on A ───► 0 lines ──► EmptyCart
    /// ```
    #[error("Cannot create an order from an empty cart")]
    EmptyCart,

    /// The order already has its one payment.
    #[error("Payment already exists for order {0}")]
    PaymentAlreadyExists(String),

    #[error("Order {order_id} is {current_status}, cannot perform operation")]
    InvalidOrderStatus {
        order_id: String,
        current_status: String,
    },

    #[error("Payment {payment_id} is {current_status}, cannot perform operation")]
    InvalidPaymentStatus {
        payment_id: String,
        current_status: String,
    },

    /// The order exists but belongs to another user.
    #[error("You do not have permission to modify order {0}")]
    NotOrderOwner(String),

    #[error("Administrator privileges required")]
    AdminRequired,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Where this error sits in the taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::CartNotFound(_)
            | CoreError::CartLineNotFound(_)
            | CoreError::ProductNotFound(_)
            | CoreError::AddressNotFound(_)
            | CoreError::OrderNotFound(_)
            | CoreError::PaymentNotFound(_) => ErrorKind::NotFound,
            CoreError::EmptyCart | CoreError::Validation(_) => ErrorKind::InvalidArgument,
            CoreError::PaymentAlreadyExists(_) => ErrorKind::Conflict,
            CoreError::InvalidOrderStatus { .. } | CoreError::InvalidPaymentStatus { .. } => {
                ErrorKind::InvalidState
            }
            CoreError::NotOrderOwner(_) | CoreError::AdminRequired => ErrorKind::PermissionDenied,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before any storage is touched.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InvalidOrderStatus {
            order_id: "o-1".to_string(),
            current_status: "delivered".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Order o-1 is delivered, cannot perform operation"
        );
        assert_eq!(
            CoreError::EmptyCart.to_string(),
            "Cannot create an order from an empty cart"
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(CoreError::CartLineNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(CoreError::EmptyCart.kind(), ErrorKind::InvalidArgument);
        assert_eq!(
            CoreError::PaymentAlreadyExists("o".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            CoreError::InvalidPaymentStatus {
                payment_id: "p".into(),
                current_status: "completed".into(),
            }
            .kind(),
            ErrorKind::InvalidState
        );
        assert_eq!(CoreError::AdminRequired.kind(), ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
        assert_eq!(core_err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_kind_codes_serialize() {
        let json = serde_json::to_string(&ErrorKind::PermissionDenied).unwrap();
        assert_eq!(json, "\"PERMISSION_DENIED\"");
        assert_eq!(ErrorKind::NotFound.as_str(), "NOT_FOUND");
    }
}
