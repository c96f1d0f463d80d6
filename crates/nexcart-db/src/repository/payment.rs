//! # Payment Repository
//!
//! Payments and their Stripe sub-records.
//!
//! `payments.order_id` is UNIQUE: inserting the row is how a payment claims
//! its order. A second insert for the same order fails with
//! [`DbError::UniqueViolation`](crate::DbError::UniqueViolation) on
//! `payments.order_id`.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use nexcart_core::{Payment, PaymentMethod, PaymentStatus, StripePayment};

/// The column that makes a payment 1:1 with its order.
pub const PAYMENT_ORDER_UNIQUE: &str = "payments.order_id";

const PAYMENT_COLUMNS: &str = r#"
    id, order_id, user_id, payment_method, amount_cents, status, transaction_id,
    created_at, updated_at
"#;

/// Input for [`PaymentRepository::insert_pending`].
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub order_id: String,
    pub user_id: String,
    pub payment_method: PaymentMethod,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn new() -> Self {
        PaymentRepository
    }

    /// Inserts a pending payment with no transaction id yet.
    pub async fn insert_pending(&self, conn: &mut SqliteConnection, new: &NewPayment) -> DbResult<Payment> {
        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            order_id: new.order_id.clone(),
            user_id: new.user_id.clone(),
            payment_method: new.payment_method,
            amount_cents: new.amount_cents,
            status: PaymentStatus::Pending,
            transaction_id: None,
            stripe: None,
            created_at: now,
            updated_at: now,
        };

        debug!(payment_id = %payment.id, order_id = %payment.order_id, "Inserting payment");

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, user_id, payment_method, amount_cents, status, transaction_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?7)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(&payment.user_id)
        .bind(payment.payment_method)
        .bind(payment.amount_cents)
        .bind(payment.status)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(payment)
    }

    pub async fn set_transaction_id(
        &self,
        conn: &mut SqliteConnection,
        payment_id: &str,
        transaction_id: &str,
    ) -> DbResult<bool> {
        let rows = sqlx::query("UPDATE payments SET transaction_id = ?1, updated_at = ?2 WHERE id = ?3")
            .bind(transaction_id)
            .bind(Utc::now())
            .bind(payment_id)
            .execute(&mut *conn)
            .await?
            .rows_affected();

        Ok(rows == 1)
    }

    /// Deletes a payment that is still pending and never received a
    /// transaction id, which frees its order for another attempt.
    /// Returns false if the payment has moved on or is already gone.
    pub async fn delete_unsettled(&self, conn: &mut SqliteConnection, payment_id: &str) -> DbResult<bool> {
        debug!(payment_id = %payment_id, "Deleting unsettled payment");

        let rows = sqlx::query(
            "DELETE FROM payments WHERE id = ?1 AND status = ?2 AND transaction_id IS NULL",
        )
        .bind(payment_id)
        .bind(PaymentStatus::Pending)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }

    /// Attaches the Stripe sub-record. The charge id starts empty.
    pub async fn insert_stripe(
        &self,
        conn: &mut SqliteConnection,
        payment_id: &str,
        payment_intent_id: &str,
    ) -> DbResult<StripePayment> {
        let record = StripePayment {
            id: Uuid::new_v4().to_string(),
            payment_id: payment_id.to_string(),
            stripe_charge_id: String::new(),
            stripe_customer_id: None,
            stripe_payment_intent_id: Some(payment_intent_id.to_string()),
        };

        sqlx::query(
            r#"
            INSERT INTO stripe_payments (
                id, payment_id, stripe_charge_id, stripe_customer_id, stripe_payment_intent_id
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&record.id)
        .bind(&record.payment_id)
        .bind(&record.stripe_charge_id)
        .bind(&record.stripe_customer_id)
        .bind(&record.stripe_payment_intent_id)
        .execute(&mut *conn)
        .await?;

        Ok(record)
    }

    /// Gets a payment with its Stripe sub-record.
    pub async fn get(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match payment {
            Some(payment) => Ok(Some(self.with_stripe(conn, payment).await?)),
            None => Ok(None),
        }
    }

    pub async fn find_by_order(
        &self,
        conn: &mut SqliteConnection,
        order_id: &str,
    ) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;

        match payment {
            Some(payment) => Ok(Some(self.with_stripe(conn, payment).await?)),
            None => Ok(None),
        }
    }

    /// Lists payments newest first, all of them or only `owner`'s.
    pub async fn list(&self, conn: &mut SqliteConnection, owner: Option<&str>) -> DbResult<Vec<Payment>> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments \
             WHERE (?1 IS NULL OR user_id = ?1) \
             ORDER BY created_at DESC, rowid DESC"
        );
        let payments = sqlx::query_as::<_, Payment>(&sql)
            .bind(owner)
            .fetch_all(&mut *conn)
            .await?;

        let mut out = Vec::with_capacity(payments.len());
        for payment in payments {
            out.push(self.with_stripe(conn, payment).await?);
        }
        Ok(out)
    }

    async fn with_stripe(&self, conn: &mut SqliteConnection, mut payment: Payment) -> DbResult<Payment> {
        payment.stripe = sqlx::query_as::<_, StripePayment>(
            r#"
            SELECT id, payment_id, stripe_charge_id, stripe_customer_id, stripe_payment_intent_id
            FROM stripe_payments
            WHERE payment_id = ?1
            "#,
        )
        .bind(&payment.id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(payment)
    }

    /// Moves a payment from `from` to `to` in one conditional statement.
    /// Returns false if the payment was not in `from`.
    pub async fn transition(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> DbResult<bool> {
        debug!(payment_id = %id, from = %from, to = %to, "Payment transition");

        let rows = sqlx::query(
            "UPDATE payments SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(to)
        .bind(Utc::now())
        .bind(id)
        .bind(from)
        .execute(&mut *conn)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
