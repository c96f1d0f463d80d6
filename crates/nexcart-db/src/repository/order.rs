//! # Order Repository
//!
//! Database operations for orders and order lines.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE (inside the checkout transaction)                           │
//! │     └── insert() → Order { status: pending, payment_status: false }    │
//! │         + one order_items row per cart line, price snapshotted         │
//! │                                                                         │
//! │  2. PAYMENT                                                            │
//! │     └── mark_paid() → payment_status: true                             │
//! │                                                                         │
//! │  3. STATUS                                                             │
//! │     ├── cancel_if_cancellable() (owner or admin)                       │
//! │     └── set_status() (admin, unconditional)                            │
//! │                                                                         │
//! │  order_items are never updated or deleted after step 1.                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use nexcart_core::{Order, OrderLine, OrderStatus};

const ORDER_COLUMNS: &str = r#"
    id, user_id, status, payment_status, shipping_address_id, billing_address_id,
    shipping_cost_cents, total_amount_cents, tracking_number, created_at, updated_at
"#;

/// One line to snapshot into a new order.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub product_id: String,
    pub quantity: i64,
    /// Unit price at this instant.
    pub price_cents: i64,
}

/// Everything needed to create an order. `total_amount_cents` is stored as
/// given, never recomputed here.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: String,
    pub shipping_address_id: String,
    pub billing_address_id: String,
    pub shipping_cost_cents: i64,
    pub total_amount_cents: i64,
    pub lines: Vec<NewOrderLine>,
}

/// Repository for order database operations.
#[derive(Debug, Clone, Default)]
pub struct OrderRepository;

impl OrderRepository {
    pub fn new() -> Self {
        OrderRepository
    }

    /// Inserts the order header and every line. Run inside a transaction;
    /// on its own a failure halfway leaves a partial order.
    pub async fn insert(&self, conn: &mut SqliteConnection, new: NewOrder) -> DbResult<Order> {
        let now = Utc::now();
        let order_id = Uuid::new_v4().to_string();

        debug!(order_id = %order_id, user_id = %new.user_id, lines = new.lines.len(), "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, status, payment_status, shipping_address_id, billing_address_id,
                shipping_cost_cents, total_amount_cents, tracking_number, created_at, updated_at
            ) VALUES (?1, ?2, ?3, 0, ?4, ?5, ?6, ?7, NULL, ?8, ?8)
            "#,
        )
        .bind(&order_id)
        .bind(&new.user_id)
        .bind(OrderStatus::Pending)
        .bind(&new.shipping_address_id)
        .bind(&new.billing_address_id)
        .bind(new.shipping_cost_cents)
        .bind(new.total_amount_cents)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        let mut items = Vec::with_capacity(new.lines.len());
        for (position, line) in new.lines.into_iter().enumerate() {
            let item = OrderLine {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                position: position as i64,
                product_id: line.product_id,
                quantity: line.quantity,
                price_cents: line.price_cents,
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, position, product_id, quantity, price_cents, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(item.position)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price_cents)
            .bind(item.created_at)
            .execute(&mut *conn)
            .await?;

            items.push(item);
        }

        Ok(Order {
            id: order_id,
            user_id: new.user_id,
            status: OrderStatus::Pending,
            payment_status: false,
            shipping_address_id: Some(new.shipping_address_id),
            billing_address_id: Some(new.billing_address_id),
            shipping_cost_cents: new.shipping_cost_cents,
            total_amount_cents: new.total_amount_cents,
            tracking_number: None,
            items,
            created_at: now,
            updated_at: now,
        })
    }

    /// Gets an order with its lines.
    pub async fn get(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let order = sqlx::query_as::<_, Order>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match order {
            Some(mut order) => {
                order.items = self.lines(conn, &order.id).await?;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Lists orders newest first, all of them or only `owner`'s.
    pub async fn list(&self, conn: &mut SqliteConnection, owner: Option<&str>) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE (?1 IS NULL OR user_id = ?1) \
             ORDER BY created_at DESC, rowid DESC"
        );
        let mut orders = sqlx::query_as::<_, Order>(&sql)
            .bind(owner)
            .fetch_all(&mut *conn)
            .await?;

        for order in &mut orders {
            order.items = self.lines(conn, &order.id).await?;
        }

        Ok(orders)
    }

    async fn lines(&self, conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(
            r#"
            SELECT id, order_id, position, product_id, quantity, price_cents, created_at
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(lines)
    }

    /// Overwrites the status. No transition rules. Returns false if the
    /// order doesn't exist.
    pub async fn set_status(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        status: OrderStatus,
    ) -> DbResult<bool> {
        debug!(order_id = %id, status = %status, "Setting order status");

        let rows = sqlx::query("UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(status)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows == 1)
    }

    /// Moves the order to cancelled unless it is delivered or already
    /// cancelled. Check and write are one statement, so a concurrent status
    /// change cannot slip between them. Returns false when nothing changed.
    pub async fn cancel_if_cancellable(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE orders SET status = ?1, updated_at = ?2
            WHERE id = ?3 AND status NOT IN (?4, ?5)
            "#,
        )
        .bind(OrderStatus::Cancelled)
        .bind(Utc::now())
        .bind(id)
        .bind(OrderStatus::Delivered)
        .bind(OrderStatus::Cancelled)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }

    pub async fn set_tracking_number(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        tracking_number: &str,
    ) -> DbResult<bool> {
        let rows = sqlx::query("UPDATE orders SET tracking_number = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(tracking_number)
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows == 1)
    }

    /// Sets `payment_status = true`.
    pub async fn mark_paid(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
        let rows = sqlx::query("UPDATE orders SET payment_status = 1, updated_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
