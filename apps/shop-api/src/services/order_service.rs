//! # Order Service
//!
//! Checkout (cart → order) plus order reads and status changes.
//!
//! ## Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     create_from_cart (one transaction)                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │   1. touch cart ─────────► None ──► NotFound        (write lock taken)  │
//! │   2. read lines ─────────► []   ──► InvalidArgument (empty cart)        │
//! │   3. resolve addresses ──► blank ► InvalidArgument, None ► NotFound     │
//! │   4. insert order + lines at current unit prices                        │
//! │   5. clear cart                                                         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: no order, cart intact.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A second checkout racing the first blocks on step 1 until the first
//! commits, then reads an empty cart.

use sqlx::SqliteConnection;
use tracing::{info, warn};

use nexcart_core::validation::{parse_order_status, validate_required_id};
use nexcart_core::{Caller, CoreError, Order, DEFAULT_SHIPPING_COST_CENTS};
use nexcart_db::{Database, NewOrder, NewOrderLine};

use crate::error::ServiceResult;

#[derive(Debug, Clone)]
pub struct OrderService {
    db: Database,
}

impl OrderService {
    pub fn new(db: Database) -> Self {
        OrderService { db }
    }

    /// Converts the caller's cart into a pending order and empties the cart.
    pub async fn create_from_cart(
        &self,
        caller: &Caller,
        shipping_address_id: &str,
        billing_address_id: &str,
    ) -> ServiceResult<Order> {
        let mut tx = self.db.begin().await?;
        let carts = self.db.carts();

        let cart = carts
            .touch(&mut tx, &caller.user_id)
            .await?
            .ok_or_else(|| CoreError::CartNotFound(caller.user_id.clone()))?;

        let cart = carts.load_lines(&mut tx, cart).await?;
        if cart.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        let addresses = self.db.addresses();
        for (field, address_id) in [
            ("shipping_address_id", shipping_address_id),
            ("billing_address_id", billing_address_id),
        ] {
            validate_required_id(field, address_id)?;
            addresses
                .resolve_address(&mut tx, address_id, &caller.user_id)
                .await?
                .ok_or_else(|| CoreError::AddressNotFound(address_id.to_string()))?;
        }

        let new_order = NewOrder {
            user_id: caller.user_id.clone(),
            shipping_address_id: shipping_address_id.to_string(),
            billing_address_id: billing_address_id.to_string(),
            shipping_cost_cents: DEFAULT_SHIPPING_COST_CENTS,
            total_amount_cents: cart.total_price().cents(),
            lines: cart
                .items
                .iter()
                .map(|line| NewOrderLine {
                    product_id: line.product_id.clone(),
                    quantity: line.quantity,
                    price_cents: line.unit_price_cents,
                })
                .collect(),
        };

        let order = self.db.orders().insert(&mut tx, new_order).await?;
        carts.clear(&mut tx, &cart.id).await?;
        tx.commit().await?;

        info!(
            order_id = %order.id,
            user_id = %caller.user_id,
            lines = order.items.len(),
            total = %order.final_total(),
            "Order created from cart"
        );
        Ok(order)
    }

    /// Cancels an order unless it is delivered or already cancelled.
    pub async fn cancel(&self, caller: &Caller, order_id: &str) -> ServiceResult<Order> {
        let mut conn = self.db.acquire().await?;
        let orders = self.db.orders();

        let order = orders
            .get(&mut conn, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        if !caller.can_access(&order.user_id) {
            warn!(order_id = %order_id, user_id = %caller.user_id, "Cancel attempted on foreign order");
            return Err(CoreError::NotOrderOwner(order_id.to_string()).into());
        }

        if !orders.cancel_if_cancellable(&mut conn, order_id).await? {
            let current = orders.get(&mut conn, order_id).await?.map(|o| o.status).unwrap_or(order.status);
            return Err(CoreError::InvalidOrderStatus {
                order_id: order_id.to_string(),
                current_status: current.to_string(),
            }
            .into());
        }

        info!(order_id = %order_id, user_id = %caller.user_id, "Order cancelled");
        self.reload(&mut conn, order_id).await
    }

    /// Administrator status overwrite. Any of the five states, from any state.
    pub async fn set_status(&self, caller: &Caller, order_id: &str, status: &str) -> ServiceResult<Order> {
        if !caller.is_admin {
            return Err(CoreError::AdminRequired.into());
        }
        let status = parse_order_status(status)?;

        let mut conn = self.db.acquire().await?;
        if !self.db.orders().set_status(&mut conn, order_id, status).await? {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }

        info!(order_id = %order_id, status = %status, admin = %caller.user_id, "Order status set");
        self.reload(&mut conn, order_id).await
    }

    pub async fn set_tracking_number(
        &self,
        caller: &Caller,
        order_id: &str,
        tracking_number: &str,
    ) -> ServiceResult<Order> {
        if !caller.is_admin {
            return Err(CoreError::AdminRequired.into());
        }
        validate_required_id("tracking_number", tracking_number)?;

        let mut conn = self.db.acquire().await?;
        if !self
            .db
            .orders()
            .set_tracking_number(&mut conn, order_id, tracking_number.trim())
            .await?
        {
            return Err(CoreError::OrderNotFound(order_id.to_string()).into());
        }

        info!(order_id = %order_id, admin = %caller.user_id, "Tracking number set");
        self.reload(&mut conn, order_id).await
    }

    /// An order the caller owns, or any order for an administrator.
    pub async fn get(&self, caller: &Caller, order_id: &str) -> ServiceResult<Order> {
        let mut conn = self.db.acquire().await?;
        let order = self
            .db
            .orders()
            .get(&mut conn, order_id)
            .await?
            .filter(|o| caller.can_access(&o.user_id))
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

        Ok(order)
    }

    /// Newest first. Administrators see every order.
    pub async fn list(&self, caller: &Caller) -> ServiceResult<Vec<Order>> {
        let mut conn = self.db.acquire().await?;
        let owner = (!caller.is_admin).then_some(caller.user_id.as_str());
        Ok(self.db.orders().list(&mut conn, owner).await?)
    }

    async fn reload(&self, conn: &mut SqliteConnection, order_id: &str) -> ServiceResult<Order> {
        let order = self
            .db
            .orders()
            .get(conn, order_id)
            .await?
            .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;
        Ok(order)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
