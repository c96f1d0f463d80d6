//! Service layer.
//!
//! Each service owns a [`Database`](nexcart_db::Database) handle and opens
//! its own transactions. Every operation takes the [`Caller`](nexcart_core::Caller)
//! explicitly and returns a fully loaded snapshot of the aggregate it touched.

pub mod cart_service;
pub mod order_service;
pub mod payment_service;

pub use cart_service::CartService;
pub use order_service::OrderService;
pub use payment_service::{IntentCreated, PaymentService};

#[cfg(test)]
pub(crate) mod fixtures {
    use nexcart_core::{AddressType, Product};
    use nexcart_db::{Database, DbConfig, NewAddress, NewProduct};

    /// A fresh in-memory database.
    pub async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    pub async fn product(db: &Database, slug: &str, price_cents: i64) -> Product {
        let mut conn = db.acquire().await.unwrap();
        db.catalog()
            .insert(&mut conn, &NewProduct::new(slug, slug, price_cents))
            .await
            .unwrap()
    }

    /// Inserts a shipping address for `user_id` and returns its id.
    pub async fn address(db: &Database, user_id: &str) -> String {
        let mut conn = db.acquire().await.unwrap();
        db.addresses()
            .insert(&mut conn, &NewAddress::for_user(user_id, AddressType::Shipping))
            .await
            .unwrap()
            .id
    }
}
