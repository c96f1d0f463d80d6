//! # Cart Service
//!
//! One cart per user. Every mutation runs in a transaction whose first
//! statement writes the cart row, so two requests against the same cart
//! take turns instead of interleaving their reads and writes.
//!
//! ```text
//! add_item(caller, product, 2)
//!   BEGIN
//!   claim cart ─────────── upsert carts row, takes the write lock
//!   resolve_product ────── NotFound if absent or inactive
//!   upsert_line ────────── quantity = quantity + 2 on (cart, product)
//!   load lines ─────────── live prices
//!   COMMIT
//! ```

use tracing::{debug, info};

use nexcart_core::validation::{validate_quantity, validate_required_id};
use nexcart_core::{Caller, Cart, CoreError};
use nexcart_db::Database;

use crate::error::ServiceResult;

#[derive(Debug, Clone)]
pub struct CartService {
    db: Database,
}

impl CartService {
    pub fn new(db: Database) -> Self {
        CartService { db }
    }

    /// Returns the caller's cart, creating an empty one if needed.
    pub async fn get_or_create(&self, caller: &Caller) -> ServiceResult<Cart> {
        let mut conn = self.db.acquire().await?;
        let carts = self.db.carts();

        let cart = carts.get_or_create(&mut conn, &caller.user_id).await?;
        Ok(carts.load_lines(&mut conn, cart).await?)
    }

    /// Adds `quantity` of a product, merging into an existing line.
    pub async fn add_item(&self, caller: &Caller, product_id: &str, quantity: i64) -> ServiceResult<Cart> {
        validate_required_id("product_id", product_id)?;
        validate_quantity(quantity)?;

        let mut tx = self.db.begin().await?;
        let carts = self.db.carts();

        let cart = carts.claim(&mut tx, &caller.user_id).await?;

        self.db
            .catalog()
            .resolve_product(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        carts.upsert_line(&mut tx, &cart.id, product_id, quantity).await?;
        let cart = carts.load_lines(&mut tx, cart).await?;
        tx.commit().await?;

        info!(
            user_id = %caller.user_id,
            product_id = %product_id,
            quantity,
            "Item added to cart"
        );
        Ok(cart)
    }

    /// Sets a line's quantity.
    pub async fn update_item(&self, caller: &Caller, line_id: &str, quantity: i64) -> ServiceResult<Cart> {
        validate_required_id("line_id", line_id)?;
        validate_quantity(quantity)?;

        let mut tx = self.db.begin().await?;
        let carts = self.db.carts();

        let cart = carts.claim(&mut tx, &caller.user_id).await?;
        if !carts.set_line_quantity(&mut tx, &cart.id, line_id, quantity).await? {
            return Err(CoreError::CartLineNotFound(line_id.to_string()).into());
        }

        let cart = carts.load_lines(&mut tx, cart).await?;
        tx.commit().await?;

        debug!(user_id = %caller.user_id, line_id = %line_id, quantity, "Cart line updated");
        Ok(cart)
    }

    /// Removes a line from the caller's cart.
    ///
    /// A line in someone else's cart is reported exactly like a missing one.
    pub async fn remove_item(&self, caller: &Caller, line_id: &str) -> ServiceResult<Cart> {
        validate_required_id("line_id", line_id)?;

        let mut tx = self.db.begin().await?;
        let carts = self.db.carts();

        let cart = carts.claim(&mut tx, &caller.user_id).await?;
        if !carts.delete_line(&mut tx, &cart.id, line_id).await? {
            return Err(CoreError::CartLineNotFound(line_id.to_string()).into());
        }

        let cart = carts.load_lines(&mut tx, cart).await?;
        tx.commit().await?;

        debug!(user_id = %caller.user_id, line_id = %line_id, "Cart line removed");
        Ok(cart)
    }

    /// Empties the caller's cart.
    pub async fn clear(&self, caller: &Caller) -> ServiceResult<Cart> {
        let mut tx = self.db.begin().await?;
        let carts = self.db.carts();

        let cart = carts.claim(&mut tx, &caller.user_id).await?;
        let removed = carts.clear(&mut tx, &cart.id).await?;
        let cart = carts.load_lines(&mut tx, cart).await?;
        tx.commit().await?;

        info!(user_id = %caller.user_id, removed, "Cart cleared");
        Ok(cart)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
