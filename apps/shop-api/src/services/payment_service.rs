//! # Payment Service
//!
//! One payment per order, created by opening a processor-side intent.
//!
//! ## Intent Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. order visible to caller? ──────── no ──► NotFound                  │
//! │  2. payment already exists? ───────── yes ─► Conflict                  │
//! │  3. INSERT payment (pending) ──────── UNIQUE(order_id) ─► Conflict      │
//! │     (committed, no transaction held past this point)                    │
//! │  4. processor.create_payment_intent ─ error ─► DELETE payment, Upstream │
//! │  BEGIN                                                                  │
//! │  5. store intent id + Stripe sub-record                                 │
//! │  COMMIT ───────────────────────────── error ─► DELETE payment           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 3 claims the order before the processor is called, so two racing
//! requests cannot both open an intent: the second fails the unique
//! constraint. The processor call runs with no storage lock held, so a slow
//! processor never stalls writes from other callers.
//!
//! ## Status Machine
//! ```text
//! pending ──confirm──► completed   (order.payment_status = true)
//!    └─────cancel───► failed       (order untouched)
//! ```

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};

use nexcart_core::validation::validate_required_id;
use nexcart_core::{Caller, CoreError, Payment, PaymentMethod, PaymentStatus};
use nexcart_db::{Database, NewPayment};

use crate::error::ServiceResult;
use crate::processor::{IntentRequest, PaymentProcessor};

/// What the storefront needs to finish paying client-side.
#[derive(Debug, Clone, Serialize)]
pub struct IntentCreated {
    pub client_secret: String,
    pub payment_id: String,
}

#[derive(Clone)]
pub struct PaymentService {
    db: Database,
    processor: Arc<dyn PaymentProcessor>,
    currency: String,
}

impl PaymentService {
    pub fn new(db: Database, processor: Arc<dyn PaymentProcessor>, currency: impl Into<String>) -> Self {
        PaymentService {
            db,
            processor,
            currency: currency.into(),
        }
    }

    /// Opens a payment intent for an order and records the pending payment.
    pub async fn create_intent(&self, caller: &Caller, order_id: &str) -> ServiceResult<IntentCreated> {
        validate_required_id("order_id", order_id)?;

        let order = {
            let mut conn = self.db.acquire().await?;
            let order = self
                .db
                .orders()
                .get(&mut conn, order_id)
                .await?
                .filter(|o| caller.can_access(&o.user_id))
                .ok_or_else(|| CoreError::OrderNotFound(order_id.to_string()))?;

            if self.db.payments().find_by_order(&mut conn, order_id).await?.is_some() {
                return Err(CoreError::PaymentAlreadyExists(order_id.to_string()).into());
            }
            order
        };

        let amount = order.final_total().to_minor_units();
        let payments = self.db.payments();

        let payment = {
            let mut conn = self.db.acquire().await?;
            payments
                .insert_pending(
                    &mut conn,
                    &NewPayment {
                        order_id: order.id.clone(),
                        user_id: order.user_id.clone(),
                        payment_method: PaymentMethod::Stripe,
                        amount_cents: amount,
                    },
                )
                .await?
        };

        let request = IntentRequest {
            amount_minor_units: amount,
            currency: self.currency.clone(),
            order_id: order.id.clone(),
            user_id: order.user_id.clone(),
        };

        let intent = match self.processor.create_payment_intent(&request).await {
            Ok(intent) => intent,
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "Payment intent failed, discarding payment");
                self.discard(&payment.id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.record_intent(&payment.id, &intent.intent_id).await {
            warn!(
                payment_id = %payment.id,
                intent_id = %intent.intent_id,
                error = %e,
                "Failed to record payment intent, discarding payment"
            );
            self.discard(&payment.id).await;
            return Err(e);
        }

        info!(
            payment_id = %payment.id,
            order_id = %order.id,
            amount,
            intent_id = %intent.intent_id,
            "Payment intent created"
        );

        Ok(IntentCreated {
            client_secret: intent.client_secret,
            payment_id: payment.id,
        })
    }

    async fn record_intent(&self, payment_id: &str, intent_id: &str) -> ServiceResult<()> {
        let payments = self.db.payments();
        let mut tx = self.db.begin().await?;
        payments.set_transaction_id(&mut tx, payment_id, intent_id).await?;
        payments.insert_stripe(&mut tx, payment_id, intent_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Removes a pending payment whose intent never made it into storage.
    async fn discard(&self, payment_id: &str) {
        let result = match self.db.acquire().await {
            Ok(mut conn) => self.db.payments().delete_unsettled(&mut conn, payment_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(true) => {}
            Ok(false) => warn!(payment_id = %payment_id, "Pending payment already settled, not discarded"),
            Err(e) => error!(payment_id = %payment_id, error = %e, "Failed to discard pending payment"),
        }
    }

    /// pending → completed, and marks the order paid in the same transaction.
    pub async fn confirm(&self, caller: &Caller, payment_id: &str) -> ServiceResult<Payment> {
        let payment = self.get(caller, payment_id).await?;
        let payments = self.db.payments();

        let mut tx = self.db.begin().await?;
        if !payments
            .transition(&mut tx, payment_id, PaymentStatus::Pending, PaymentStatus::Completed)
            .await?
        {
            let current = payments.get(&mut tx, payment_id).await?.map(|p| p.status).unwrap_or(payment.status);
            return Err(CoreError::InvalidPaymentStatus {
                payment_id: payment_id.to_string(),
                current_status: current.to_string(),
            }
            .into());
        }

        self.db.orders().mark_paid(&mut tx, &payment.order_id).await?;
        let payment = payments
            .get(&mut tx, payment_id)
            .await?
            .ok_or_else(|| CoreError::PaymentNotFound(payment_id.to_string()))?;
        tx.commit().await?;

        info!(payment_id = %payment_id, order_id = %payment.order_id, "Payment confirmed");
        Ok(payment)
    }

    /// pending → failed. The order keeps its status.
    pub async fn cancel(&self, caller: &Caller, payment_id: &str) -> ServiceResult<Payment> {
        let payment = self.get(caller, payment_id).await?;
        let payments = self.db.payments();

        let mut conn = self.db.acquire().await?;
        if !payments
            .transition(&mut conn, payment_id, PaymentStatus::Pending, PaymentStatus::Failed)
            .await?
        {
            let current = payments.get(&mut conn, payment_id).await?.map(|p| p.status).unwrap_or(payment.status);
            return Err(CoreError::InvalidPaymentStatus {
                payment_id: payment_id.to_string(),
                current_status: current.to_string(),
            }
            .into());
        }

        info!(payment_id = %payment_id, order_id = %payment.order_id, "Payment cancelled");
        let payment = payments
            .get(&mut conn, payment_id)
            .await?
            .ok_or_else(|| CoreError::PaymentNotFound(payment_id.to_string()))?;
        Ok(payment)
    }

    /// A payment the caller owns, or any payment for an administrator.
    pub async fn get(&self, caller: &Caller, payment_id: &str) -> ServiceResult<Payment> {
        let mut conn = self.db.acquire().await?;
        let payment = self
            .db
            .payments()
            .get(&mut conn, payment_id)
            .await?
            .filter(|p| caller.can_access(&p.user_id))
            .ok_or_else(|| CoreError::PaymentNotFound(payment_id.to_string()))?;

        Ok(payment)
    }

    pub async fn list(&self, caller: &Caller) -> ServiceResult<Vec<Payment>> {
        let mut conn = self.db.acquire().await?;
        let owner = (!caller.is_admin).then_some(caller.user_id.as_str());
        Ok(self.db.payments().list(&mut conn, owner).await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::fake::FakeProcessor;
    use crate::services::{fixtures, CartService, OrderService};
    use crate::processor::{PaymentIntent, ProcessorError};
    use async_trait::async_trait;
    use nexcart_core::{ErrorKind, Order};
    use nexcart_db::DbConfig;
    use std::time::Duration;
    use tokio::sync::Notify;

    /// Holds every intent open until the test releases it.
    #[derive(Default)]
    struct GatedProcessor {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl PaymentProcessor for GatedProcessor {
        async fn create_payment_intent(&self, _req: &IntentRequest) -> Result<PaymentIntent, ProcessorError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(PaymentIntent {
                intent_id: "pi_gated".to_string(),
                client_secret: "pi_gated_secret".to_string(),
            })
        }
    }

    async fn pending_order(db: &Database, user: &Caller) -> Order {
        let product = fixtures::product(db, &format!("p-{}", uuid::Uuid::new_v4()), 1999).await;
        let address = fixtures::address(db, &user.user_id).await;

        CartService::new(db.clone()).add_item(user, &product.id, 2).await.unwrap();
        OrderService::new(db.clone())
            .create_from_cart(user, &address, &address)
            .await
            .unwrap()
    }

    fn service(db: &Database, processor: Arc<FakeProcessor>) -> PaymentService {
        PaymentService::new(db.clone(), processor, "usd")
    }

    #[tokio::test]
    async fn test_create_intent() {
        let db = fixtures::db().await;
        let alice = Caller::user("alice");
        let order = pending_order(&db, &alice).await;
        let fake = Arc::new(FakeProcessor::default());
        let payments = service(&db, fake.clone());

        let created = payments.create_intent(&alice, &order.id).await.unwrap();
        assert_eq!(created.client_secret, "pi_fake_1_secret");
        assert_eq!(fake.calls(), 1);

        let sent = fake.last_request().unwrap();
        assert_eq!(sent.amount_minor_units, 3998);
        assert_eq!(sent.currency, "usd");
        assert_eq!(sent.order_id, order.id);
        assert_eq!(sent.user_id, "alice");

        let payment = payments.get(&alice, &created.payment_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.payment_method, PaymentMethod::Stripe);
        assert_eq!(payment.amount_cents, 3998);
        assert_eq!(payment.transaction_id.as_deref(), Some("pi_fake_1"));
        let stripe = payment.stripe.unwrap();
        assert_eq!(stripe.stripe_payment_intent_id.as_deref(), Some("pi_fake_1"));
        assert!(stripe.stripe_charge_id.is_empty());
    }

    #[tokio::test]
    async fn test_second_intent_is_conflict_without_processor_call() {
        let db = fixtures::db().await;
        let alice = Caller::user("alice");
        let order = pending_order(&db, &alice).await;
        let fake = Arc::new(FakeProcessor::default());
        let payments = service(&db, fake.clone());

        let first = payments.create_intent(&alice, &order.id).await.unwrap();
        let err = payments.create_intent(&alice, &order.id).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Conflict);
        assert_eq!(fake.calls(), 1);

        let payment = payments.get(&alice, &first.payment_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payments.list(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_processor_failure_leaves_no_payment() {
        let db = fixtures::db().await;
        let alice = Caller::user("alice");
        let order = pending_order(&db, &alice).await;
        let payments = service(&db, Arc::new(FakeProcessor::failing()));

        let err = payments.create_intent(&alice, &order.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Upstream);
        assert_eq!(err.message, "Your card was declined.");

        assert!(payments.list(&alice).await.unwrap().is_empty());

        // The order can still be paid once the processor recovers
        let payments = service(&db, Arc::new(FakeProcessor::default()));
        assert!(payments.create_intent(&alice, &order.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_intent_for_foreign_order_is_not_found() {
        let db = fixtures::db().await;
        let alice = Caller::user("alice");
        let order = pending_order(&db, &alice).await;
        let fake = Arc::new(FakeProcessor::default());
        let payments = service(&db, fake.clone());

        let err = payments
            .create_intent(&Caller::user("mallory"), &order.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = payments.create_intent(&alice, "no-such-order").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_confirm_marks_order_paid() {
        let db = fixtures::db().await;
        let alice = Caller::user("alice");
        let order = pending_order(&db, &alice).await;
        let payments = service(&db, Arc::new(FakeProcessor::default()));
        let orders = OrderService::new(db.clone());

        let created = payments.create_intent(&alice, &order.id).await.unwrap();
        let payment = payments.confirm(&alice, &created.payment_id).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert!(orders.get(&alice, &order.id).await.unwrap().payment_status);

        let err = payments.confirm(&alice, &created.payment_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
        let err = payments.cancel(&alice, &created.payment_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);
    }

    #[tokio::test]
    async fn test_cancel_then_confirm_is_rejected() {
        let db = fixtures::db().await;
        let alice = Caller::user("alice");
        let order = pending_order(&db, &alice).await;
        let payments = service(&db, Arc::new(FakeProcessor::default()));
        let orders = OrderService::new(db.clone());

        let created = payments.create_intent(&alice, &order.id).await.unwrap();
        let payment = payments.cancel(&alice, &created.payment_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Failed);

        let err = payments.confirm(&alice, &created.payment_id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidState);

        let order = orders.get(&alice, &order.id).await.unwrap();
        assert!(!order.payment_status);
        assert_eq!(order.status, nexcart_core::OrderStatus::Pending);
    }

    #[tokio::test]
    async fn test_payment_visibility() {
        let db = fixtures::db().await;
        let alice = Caller::user("alice");
        let order = pending_order(&db, &alice).await;
        let payments = service(&db, Arc::new(FakeProcessor::default()));

        let created = payments.create_intent(&alice, &order.id).await.unwrap();
        let mallory = Caller::user("mallory");

        assert_eq!(payments.get(&mallory, &created.payment_id).await.unwrap_err().kind, ErrorKind::NotFound);
        assert_eq!(payments.confirm(&mallory, &created.payment_id).await.unwrap_err().kind, ErrorKind::NotFound);
        assert!(payments.list(&mallory).await.unwrap().is_empty());

        let admin = Caller::admin("root");
        assert_eq!(payments.list(&admin).await.unwrap().len(), 1);
        let payment = payments.confirm(&admin, &created.payment_id).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_intents_call_processor_once() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("intents.db")).max_connections(4))
            .await
            .unwrap();
        let alice = Caller::user("alice");
        let order = pending_order(&db, &alice).await;
        let fake = Arc::new(FakeProcessor::default());
        let payments = service(&db, fake.clone());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let payments = payments.clone();
            let alice = alice.clone();
            let order_id = order.id.clone();
            handles.push(tokio::spawn(async move {
                payments.create_intent(&alice, &order_id).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert_eq!(e.kind, ErrorKind::Conflict),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(fake.calls(), 1);
        db.close().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_processor_does_not_block_other_writers() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(
            DbConfig::new(dir.path().join("slow.db"))
                .max_connections(4)
                .busy_timeout(Duration::from_millis(200)),
        )
        .await
        .unwrap();
        let alice = Caller::user("alice");
        let bob = Caller::user("bob");
        let order = pending_order(&db, &alice).await;
        let product = fixtures::product(&db, "lamp", 2500).await;

        let gate = Arc::new(GatedProcessor::default());
        let payments = PaymentService::new(db.clone(), gate.clone(), "usd");
        let intent = {
            let payments = payments.clone();
            let alice = alice.clone();
            let order_id = order.id.clone();
            tokio::spawn(async move { payments.create_intent(&alice, &order_id).await })
        };
        gate.entered.notified().await;

        // Held well past the busy timeout while the intent is open
        tokio::time::sleep(Duration::from_millis(400)).await;
        let cart = CartService::new(db.clone()).add_item(&bob, &product.id, 1).await.unwrap();
        assert_eq!(cart.total_items(), 1);

        // The order is already claimed, so a second attempt is refused at once
        let err = payments.create_intent(&alice, &order.id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);

        gate.release.notify_one();
        let created = intent.await.unwrap().unwrap();
        let payment = payments.get(&alice, &created.payment_id).await.unwrap();
        assert_eq!(payment.transaction_id.as_deref(), Some("pi_gated"));
        db.close().await;
    }
}
