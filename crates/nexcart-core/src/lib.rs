//! # nexcart-core: Pure Business Logic for NexCart
//!
//! This crate holds the domain of the NexCart shop backend: money, pricing,
//! the cart/order/payment aggregates and their status machines. It has zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        NexCart Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Storefront (HTTP client)                     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON + Bearer JWT                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    shop-api (axum)                              │   │
//! │  │    CartService, OrderService, PaymentService, StripeClient      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ nexcart-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │   Cart    │  │   Money   │  │ line_total│  │ quantity  │  │   │
//! │  │   │   Order   │  │  (cents)  │  │ container │  │  status   │  │   │
//! │  │   │  Payment  │  │           │  │   total   │  │           │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    nexcart-db (Database Layer)                  │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Cart, Order, Payment and friends
//! - [`money`] - Integer-cent money
//! - [`pricing`] - Line and container totals
//! - [`error`] - Domain errors and the failure taxonomy
//! - [`validation`] - Input rules
//!
//! ## Example Usage
//!
//! ```rust
//! use nexcart_core::money::Money;
//! use nexcart_core::pricing::line_total;
//!
//! let ten = Money::from_cents(1000);
//! let five = Money::from_cents(500);
//! let total = line_total(ten, 2) + line_total(five, 1);
//! assert_eq!(total.cents(), 2500);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ErrorKind, ValidationError};
pub use money::Money;
pub use pricing::PricedLine;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity accepted by a single add or update request.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Shipping is not computed; every order ships at this cost.
pub const DEFAULT_SHIPPING_COST_CENTS: i64 = 0;
