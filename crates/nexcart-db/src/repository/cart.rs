//! # Cart Repository
//!
//! Database operations for carts and cart lines.
//!
//! ## Per-Cart Serialization
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every cart mutation / checkout transaction                            │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    claim() or touch()   ← WRITE to carts row: takes the write lock     │
//! │    lines()              ← reads happen only after the lock is held     │
//! │    upsert_line() / ...                                                 │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  A second transaction on the same cart blocks at its own claim/touch   │
//! │  until the first commits, then sees the committed lines.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lines are always returned joined to `products` so `unit_price_cents` is
//! the current catalog price.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use nexcart_core::{Cart, CartLine};

const SELECT_CART_BY_USER: &str = r#"
    SELECT id, user_id, created_at, updated_at
    FROM carts
    WHERE user_id = ?1
"#;

const SELECT_LINES: &str = r#"
    SELECT
        ci.id,
        ci.cart_id,
        ci.product_id,
        p.name AS product_name,
        p.price_cents AS unit_price_cents,
        ci.quantity,
        ci.created_at
    FROM cart_items ci
    JOIN products p ON p.id = ci.product_id
    WHERE ci.cart_id = ?1
    ORDER BY ci.rowid
"#;

/// Repository for cart database operations.
#[derive(Debug, Clone, Default)]
pub struct CartRepository;

impl CartRepository {
    pub fn new() -> Self {
        CartRepository
    }

    /// Returns the user's cart header, creating it if absent, and bumps
    /// `updated_at`. The write is unconditional so it always takes the
    /// write lock.
    pub async fn claim(&self, conn: &mut SqliteConnection, user_id: &str) -> DbResult<Cart> {
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let cart = sqlx::query_as::<_, Cart>(SELECT_CART_BY_USER)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(cart)
    }

    /// Like [`claim`](Self::claim) but never creates: returns `None` if the
    /// user has no cart.
    pub async fn touch(&self, conn: &mut SqliteConnection, user_id: &str) -> DbResult<Option<Cart>> {
        let rows = sqlx::query("UPDATE carts SET updated_at = ?1 WHERE user_id = ?2")
            .bind(Utc::now())
            .bind(user_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        if rows == 0 {
            return Ok(None);
        }

        self.find_by_user(conn, user_id).await
    }

    /// Plain read of the cart header.
    pub async fn find_by_user(
        &self,
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>(SELECT_CART_BY_USER)
            .bind(user_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(cart)
    }

    /// Creates the cart if absent without taking a write when it exists.
    pub async fn get_or_create(&self, conn: &mut SqliteConnection, user_id: &str) -> DbResult<Cart> {
        if let Some(cart) = self.find_by_user(conn, user_id).await? {
            return Ok(cart);
        }

        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO carts (id, user_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?3)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        debug!(user_id = %user_id, "Cart created");

        let cart = sqlx::query_as::<_, Cart>(SELECT_CART_BY_USER)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

        Ok(cart)
    }

    /// Current lines of a cart, in insertion order, priced live.
    pub async fn lines(&self, conn: &mut SqliteConnection, cart_id: &str) -> DbResult<Vec<CartLine>> {
        let lines = sqlx::query_as::<_, CartLine>(SELECT_LINES)
            .bind(cart_id)
            .fetch_all(&mut *conn)
            .await?;

        Ok(lines)
    }

    /// Fills `cart.items` from the database.
    pub async fn load_lines(&self, conn: &mut SqliteConnection, mut cart: Cart) -> DbResult<Cart> {
        cart.items = self.lines(conn, &cart.id).await?;
        Ok(cart)
    }

    /// Adds `quantity` of a product. An existing line for the product has
    /// its quantity incremented instead of a second line being inserted.
    pub async fn upsert_line(
        &self,
        conn: &mut SqliteConnection,
        cart_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<()> {
        debug!(cart_id = %cart_id, product_id = %product_id, quantity, "Upserting cart line");

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (cart_id, product_id)
            DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Sets a line's quantity. Returns false if the line is not in this cart.
    pub async fn set_line_quantity(
        &self,
        conn: &mut SqliteConnection,
        cart_id: &str,
        line_id: &str,
        quantity: i64,
    ) -> DbResult<bool> {
        let rows = sqlx::query("UPDATE cart_items SET quantity = ?1 WHERE id = ?2 AND cart_id = ?3")
            .bind(quantity)
            .bind(line_id)
            .bind(cart_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows == 1)
    }

    /// Deletes a line. Returns false if the line is not in this cart.
    pub async fn delete_line(
        &self,
        conn: &mut SqliteConnection,
        cart_id: &str,
        line_id: &str,
    ) -> DbResult<bool> {
        let rows = sqlx::query("DELETE FROM cart_items WHERE id = ?1 AND cart_id = ?2")
            .bind(line_id)
            .bind(cart_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows == 1)
    }

    /// Deletes every line. Returns the number removed.
    pub async fn clear(&self, conn: &mut SqliteConnection, cart_id: &str) -> DbResult<u64> {
        let rows = sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        debug!(cart_id = %cart_id, removed = rows, "Cart cleared");
        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
