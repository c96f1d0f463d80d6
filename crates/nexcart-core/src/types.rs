//! # Domain Types
//!
//! Core domain types used throughout NexCart.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Cart       │   │      Order      │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  user_id (1:1)  │──►│  status         │◄──│  order_id (1:1) │       │
//! │  │  items          │   │  payment_status │   │  status         │       │
//! │  │   CartLine      │   │  items          │   │  amount_cents   │       │
//! │  │   (live price)  │   │   OrderLine     │   │  stripe         │       │
//! │  └─────────────────┘   │   (snapshot)    │   │   StripePayment │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  OrderStatus    │   │ PaymentStatus   │   │ Product/Address │       │
//! │  │  pending        │   │  pending        │   │  read-only      │       │
//! │  │  processing     │   │  completed      │   │  lookups        │       │
//! │  │  shipped        │   │  failed         │   └─────────────────┘       │
//! │  │  delivered      │   │  refunded       │                              │
//! │  │  cancelled      │   └─────────────────┘                              │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every id is a UUID v4 string. Derived totals are methods, never fields.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::pricing::{self, PricedLine};

// =============================================================================
// Caller
// =============================================================================

/// The authenticated identity behind a request.
///
/// Every service operation takes one explicitly. Nothing downstream
/// re-validates credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Caller {
    pub user_id: String,
    pub is_admin: bool,
}

impl Caller {
    pub fn user(user_id: impl Into<String>) -> Self {
        Caller {
            user_id: user_id.into(),
            is_admin: false,
        }
    }

    pub fn admin(user_id: impl Into<String>) -> Self {
        Caller {
            user_id: user_id.into(),
            is_admin: true,
        }
    }

    /// Whether this caller may see a record owned by `owner_id`.
    pub fn can_access(&self, owner_id: &str) -> bool {
        self.is_admin || self.user_id == owner_id
    }
}

// =============================================================================
// Product (catalog lookup)
// =============================================================================

/// A catalog product. The cart and checkout only ever read these.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub slug: String,
    /// Current unit price in cents.
    pub price_cents: i64,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Address (address book lookup)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Billing,
    Shipping,
}

/// A postal address owned by one user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    pub id: String,
    pub user_id: String,
    pub address_type: AddressType,
    pub street_address: String,
    pub apartment_address: Option<String>,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip_code: String,
    pub is_default: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Cart
// =============================================================================

/// One product+quantity entry in a cart.
///
/// `unit_price_cents` is the product's price at the moment the line was
/// read, not a stored copy.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLine {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub product_name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PricedLine for CartLine {
    fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// The mutable pre-purchase basket. Exactly one per user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<CartLine>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    /// Σ(unit_price × quantity) over the current lines.
    pub fn total_price(&self) -> Money {
        pricing::container_total(&self.items)
    }

    /// Σ(quantity) over the current lines.
    pub fn total_items(&self) -> i64 {
        pricing::total_quantity(&self.items)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Order lifecycle.
///
/// ```text
///  pending ──► processing ──► shipped ──► delivered
///     │            │             │
///     └────────────┴─────────────┴──► cancelled   (owner or admin)
/// ```
///
/// The diagram is the usual flow, not an enforced table: an administrator
/// may set any of the five states directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Delivered and cancelled orders can no longer be cancelled.
    pub const fn is_cancellable(&self) -> bool {
        !matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

// =============================================================================
// Order
// =============================================================================

/// A line in an order. `price_cents` is frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    /// Zero-based position, preserving the cart's line order.
    pub position: i64,
    pub product_id: String,
    pub quantity: i64,
    /// Unit price in cents at time of checkout.
    pub price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl PricedLine for OrderLine {
    fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    fn quantity(&self) -> i64 {
        self.quantity
    }
}

/// A purchase record created from a cart at checkout.
///
/// Header fields are fixed after creation except `status`,
/// `payment_status` and `tracking_number`. Lines never change.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub status: OrderStatus,
    /// True once a payment for this order has been confirmed.
    pub payment_status: bool,
    /// Nulled if the address is later deleted.
    pub shipping_address_id: Option<String>,
    pub billing_address_id: Option<String>,
    pub shipping_cost_cents: i64,
    /// Cart total at the instant of checkout.
    pub total_amount_cents: i64,
    pub tracking_number: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub items: Vec<OrderLine>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Σ(price × quantity) over the snapshotted lines.
    pub fn items_total(&self) -> Money {
        pricing::container_total(&self.items)
    }

    /// `items_total + shipping_cost`.
    pub fn final_total(&self) -> Money {
        self.items_total() + Money::from_cents(self.shipping_cost_cents)
    }

    #[inline]
    pub fn shipping_cost(&self) -> Money {
        Money::from_cents(self.shipping_cost_cents)
    }
}

// =============================================================================
// Payment Status & Method
// =============================================================================

/// Payment lifecycle.
///
/// ```text
///  pending ──confirm──► completed
///     │
///     └────cancel────► failed
/// ```
///
/// Completed, failed and refunded are terminal for confirm/cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    #[inline]
    pub const fn is_pending(&self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Pending
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Stripe,
    Paypal,
    CreditCard,
}

// =============================================================================
// Payment
// =============================================================================

/// Stripe-specific identifiers attached to a payment.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StripePayment {
    pub id: String,
    pub payment_id: String,
    /// Empty until a charge is captured.
    pub stripe_charge_id: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_payment_intent_id: Option<String>,
}

/// The single payment attached to an order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub user_id: String,
    pub payment_method: PaymentMethod,
    pub amount_cents: i64,
    pub status: PaymentStatus,
    /// Processor-side intent id.
    pub transaction_id: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    pub stripe: Option<StripePayment>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cart_line(product_id: &str, price: i64, quantity: i64) -> CartLine {
        CartLine {
            id: format!("line-{product_id}"),
            cart_id: "cart-1".to_string(),
            product_id: product_id.to_string(),
            product_name: product_id.to_uppercase(),
            unit_price_cents: price,
            quantity,
            created_at: Utc::now(),
        }
    }

    fn order_line(position: i64, price: i64, quantity: i64) -> OrderLine {
        OrderLine {
            id: format!("ol-{position}"),
            order_id: "order-1".to_string(),
            position,
            product_id: format!("p{position}"),
            quantity,
            price_cents: price,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_cart_totals() {
        let now = Utc::now();
        let cart = Cart {
            id: "cart-1".to_string(),
            user_id: "alice".to_string(),
            items: vec![cart_line("p1", 1000, 2), cart_line("p2", 500, 1)],
            created_at: now,
            updated_at: now,
        };

        assert_eq!(cart.total_price().cents(), 2500);
        assert_eq!(cart.total_items(), 3);
        assert!(!cart.is_empty());
    }

    #[test]
    fn test_order_totals_include_shipping() {
        let now = Utc::now();
        let mut order = Order {
            id: "order-1".to_string(),
            user_id: "alice".to_string(),
            status: OrderStatus::Pending,
            payment_status: false,
            shipping_address_id: None,
            billing_address_id: None,
            shipping_cost_cents: 0,
            total_amount_cents: 2500,
            tracking_number: None,
            items: vec![order_line(0, 1000, 2), order_line(1, 500, 1)],
            created_at: now,
            updated_at: now,
        };

        assert_eq!(order.items_total().cents(), 2500);
        assert_eq!(order.final_total().cents(), 2500);

        order.shipping_cost_cents = 799;
        assert_eq!(order.final_total().cents(), 3299);
    }

    #[test]
    fn test_order_status_parsing() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
        assert!("Pending".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_cancellable_statuses() {
        assert!(OrderStatus::Pending.is_cancellable());
        assert!(OrderStatus::Processing.is_cancellable());
        assert!(OrderStatus::Shipped.is_cancellable());
        assert!(!OrderStatus::Delivered.is_cancellable());
        assert!(!OrderStatus::Cancelled.is_cancellable());
    }

    #[test]
    fn test_caller_access() {
        assert!(Caller::user("alice").can_access("alice"));
        assert!(!Caller::user("bob").can_access("alice"));
        assert!(Caller::admin("root").can_access("alice"));
    }

    #[test]
    fn test_payment_method_serializes_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::CreditCard).unwrap();
        assert_eq!(json, "\"credit_card\"");
    }
}
