//! # Validation Module
//!
//! Input validation for cart, checkout and admin requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP extractors (axum + serde)                               │
//! │  └── Shape: JSON types, required fields                                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Services                                                     │
//! │  └── THIS MODULE: quantity bounds, ids, status names                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (quantity >= 1), CHECK (status IN ...)                      │
//! │  ├── UNIQUE (cart_id, product_id), UNIQUE (order_id)                   │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nexcart_core::validation::{validate_quantity, parse_order_status};
//! use nexcart_core::OrderStatus;
//!
//! assert!(validate_quantity(5).is_ok());
//! assert_eq!(parse_order_status("shipped").unwrap(), OrderStatus::Shipped);
//! ```

use crate::error::ValidationError;
use crate::types::OrderStatus;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a requested cart-line quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed `MAX_ITEM_QUANTITY` (999) per request
///
/// Applies to both add and update. A merge on add may push the stored
/// quantity past the bound; only the increment is checked.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents. Zero is allowed.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Reference Validators
// =============================================================================

/// Validates that a reference field was supplied.
///
/// ## Example
/// ```rust
/// use nexcart_core::validation::validate_required_id;
///
/// assert!(validate_required_id("product_id", "abc").is_ok());
/// assert!(validate_required_id("product_id", "  ").is_err());
/// ```
pub fn validate_required_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Status Validators
// =============================================================================

/// Parses an order status name sent by an administrator.
///
/// Only the five lowercase names are accepted.
pub fn parse_order_status(raw: &str) -> ValidationResult<OrderStatus> {
    if raw.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "status".to_string(),
        });
    }

    raw.parse()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(matches!(
            validate_quantity(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_quantity(-3).is_err());
        assert!(matches!(
            validate_quantity(1000),
            Err(ValidationError::OutOfRange { max: 999, .. })
        ));
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_parse_order_status() {
        assert_eq!(parse_order_status("delivered").unwrap(), OrderStatus::Delivered);
        assert!(matches!(
            parse_order_status(""),
            Err(ValidationError::Required { .. })
        ));
        match parse_order_status("lost") {
            Err(ValidationError::NotAllowed { allowed, .. }) => assert_eq!(allowed.len(), 5),
            other => panic!("expected NotAllowed, got {other:?}"),
        }
    }
}
