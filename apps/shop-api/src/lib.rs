//! # NexCart Shop API
//!
//! HTTP service for the storefront: cart, checkout and payments.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Shop API Services                              │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  CartService   │  │  OrderService  │  │  PaymentService            ││
//! │  │                │  │                │  │                            ││
//! │  │ • get_or_create│  │ • create_from_ │  │ • create_intent            ││
//! │  │ • add_item     │  │   cart         │  │ • confirm                  ││
//! │  │ • update_item  │  │ • cancel       │  │ • cancel                   ││
//! │  │ • remove_item  │  │ • set_status   │  │ • get / list               ││
//! │  │ • clear        │  │ • get / list   │  │                            ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────┐│  │
//! │  │  │  SQLite      │  │  Stripe      │  │    JWT Auth              ││  │
//! │  │  │ (nexcart-db) │  │  (reqwest)   │  │                          ││  │
//! │  │  │ carts/orders │  │  payment     │  │ Bearer token → Caller    ││  │
//! │  │  │ payments     │  │  intents     │  │                          ││  │
//! │  │  └──────────────┘  └──────────────┘  └──────────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! `shop.toml` (or the file named by `SHOP_CONFIG`), overridden by
//! environment variables:
//! - `SHOP_HTTP_PORT` - HTTP port (default: 8000)
//! - `SHOP_DATABASE_PATH` - SQLite file (default: ./nexcart.db)
//! - `SHOP_JWT_SECRET` - Secret for JWT signing (required)
//! - `SHOP_STRIPE_SECRET_KEY` - Stripe API key (required)
//! - `SHOP_CURRENCY` - Payment currency (default: usd)

pub mod auth;
pub mod config;
pub mod error;
pub mod processor;
pub mod routes;
pub mod services;

use std::sync::Arc;

use nexcart_db::Database;

// Re-exports
pub use auth::JwtManager;
pub use config::ShopConfig;
pub use error::{ServiceError, ServiceResult};
pub use processor::{PaymentProcessor, StripeClient, StripeConfig};
pub use routes::build_router;
pub use services::{CartService, OrderService, PaymentService};

/// Shared application state.
pub struct AppState {
    pub db: Database,
    pub config: ShopConfig,
    pub jwt: JwtManager,
    pub carts: CartService,
    pub orders: OrderService,
    pub payments: PaymentService,
}

impl AppState {
    pub fn new(db: Database, config: ShopConfig, processor: Arc<dyn PaymentProcessor>) -> Self {
        AppState {
            jwt: JwtManager::new(config.jwt_secret.clone(), config.jwt_lifetime_secs),
            carts: CartService::new(db.clone()),
            orders: OrderService::new(db.clone()),
            payments: PaymentService::new(db.clone(), processor, config.currency.clone()),
            db,
            config,
        }
    }
}

// =============================================================================
// End-to-end Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::fake::FakeProcessor;
    use crate::services::fixtures;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    struct Running {
        base: String,
        state: Arc<AppState>,
        http: reqwest::Client,
    }

    async fn serve() -> Running {
        let db = fixtures::db().await;
        let config = ShopConfig {
            jwt_secret: "e2e-secret".to_string(),
            stripe_secret_key: "sk_test".to_string(),
            ..ShopConfig::default()
        };
        let state = Arc::new(AppState::new(db, config, Arc::new(FakeProcessor::default())));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = build_router(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Running {
            base: format!("http://{addr}"),
            state,
            http: reqwest::Client::new(),
        }
    }

    impl Running {
        fn token(&self, user: &str, is_admin: bool) -> String {
            self.state.jwt.generate_token(user, is_admin).unwrap()
        }

        async fn call(&self, method: reqwest::Method, path: &str, token: &str, body: Option<Value>) -> (u16, Value) {
            let mut req = self
                .http
                .request(method, format!("{}{}", self.base, path))
                .bearer_auth(token);
            if let Some(body) = body {
                req = req.json(&body);
            }
            let resp = req.send().await.unwrap();
            let status = resp.status().as_u16();
            let body = resp.json::<Value>().await.unwrap_or(Value::Null);
            (status, body)
        }
    }

    #[tokio::test]
    async fn test_health_needs_no_token() {
        let app = serve().await;
        let resp = app.http.get(format!("{}/health", app.base)).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthenticated() {
        let app = serve().await;
        let resp = app.http.get(format!("{}/api/cart", app.base)).send().await.unwrap();
        assert_eq!(resp.status().as_u16(), 401);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "UNAUTHENTICATED");
    }

    #[tokio::test]
    async fn test_checkout_and_pay_over_http() {
        use reqwest::Method;

        let app = serve().await;
        let p1 = fixtures::product(&app.state.db, "p1", 1000).await;
        let p2 = fixtures::product(&app.state.db, "p2", 500).await;
        let address = fixtures::address(&app.state.db, "alice").await;
        let alice = app.token("alice", false);

        let (status, _) = app
            .call(Method::POST, "/api/cart/items", &alice, Some(json!({ "product_id": p1.id, "quantity": 2 })))
            .await;
        assert_eq!(status, 200);
        let (_, cart) = app
            .call(Method::POST, "/api/cart/items", &alice, Some(json!({ "product_id": p2.id })))
            .await;
        assert_eq!(cart["total_price"], 2500);
        assert_eq!(cart["total_items"], 3);

        let (status, order) = app
            .call(
                Method::POST,
                "/api/orders",
                &alice,
                Some(json!({ "shipping_address_id": address, "billing_address_id": address })),
            )
            .await;
        assert_eq!(status, 201);
        assert_eq!(order["final_total"], 2500);
        assert_eq!(order["status"], "pending");
        let order_id = order["id"].as_str().unwrap().to_string();

        let (status, err) = app
            .call(
                Method::POST,
                "/api/orders",
                &alice,
                Some(json!({ "shipping_address_id": address, "billing_address_id": address })),
            )
            .await;
        assert_eq!(status, 400);
        assert_eq!(err["code"], "INVALID_ARGUMENT");

        let (status, intent) = app
            .call(Method::POST, "/api/payments/intents", &alice, Some(json!({ "order_id": order_id })))
            .await;
        assert_eq!(status, 200);
        let payment_id = intent["payment_id"].as_str().unwrap().to_string();
        assert!(intent["client_secret"].as_str().unwrap().ends_with("_secret"));

        let (status, err) = app
            .call(Method::POST, "/api/payments/intents", &alice, Some(json!({ "order_id": order_id })))
            .await;
        assert_eq!(status, 409);
        assert_eq!(err["code"], "CONFLICT");

        let (status, payment) = app
            .call(Method::POST, &format!("/api/payments/{payment_id}/confirm"), &alice, None)
            .await;
        assert_eq!(status, 200);
        assert_eq!(payment["status"], "completed");

        let (_, order) = app.call(Method::GET, &format!("/api/orders/{order_id}"), &alice, None).await;
        assert_eq!(order["payment_status"], true);
    }

    #[tokio::test]
    async fn test_admin_routes_reject_users() {
        use reqwest::Method;

        let app = serve().await;
        let alice = app.token("alice", false);
        let admin = app.token("root", true);

        let (status, err) = app
            .call(Method::PUT, "/api/admin/orders/any/status", &alice, Some(json!({ "status": "shipped" })))
            .await;
        assert_eq!(status, 403);
        assert_eq!(err["code"], "PERMISSION_DENIED");

        let (status, err) = app
            .call(Method::PUT, "/api/admin/orders/any/status", &admin, Some(json!({ "status": "shipped" })))
            .await;
        assert_eq!(status, 404);
        assert_eq!(err["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_malformed_bodies_are_invalid_argument() {
        use reqwest::Method;

        let app = serve().await;
        let p1 = fixtures::product(&app.state.db, "p1", 1000).await;
        let alice = app.token("alice", false);

        let (status, err) = app
            .call(Method::POST, "/api/cart/items", &alice, Some(json!({ "quantity": 1 })))
            .await;
        assert_eq!(status, 400);
        assert_eq!(err["code"], "INVALID_ARGUMENT");
        assert!(err["message"].as_str().unwrap().contains("product_id"));

        let (_, cart) = app
            .call(Method::POST, "/api/cart/items", &alice, Some(json!({ "product_id": p1.id })))
            .await;
        let line_id = cart["items"][0]["id"].as_str().unwrap().to_string();

        let (status, err) = app
            .call(Method::PATCH, &format!("/api/cart/items/{line_id}"), &alice, Some(json!({})))
            .await;
        assert_eq!(status, 400);
        assert_eq!(err["code"], "INVALID_ARGUMENT");
        assert!(err["message"].as_str().unwrap().contains("quantity"));

        let (status, err) = app
            .call(Method::PATCH, &format!("/api/cart/items/{line_id}"), &alice, Some(json!({ "quantity": "two" })))
            .await;
        assert_eq!(status, 400);
        assert_eq!(err["code"], "INVALID_ARGUMENT");

        // The cart is as it was
        let (_, cart) = app.call(Method::GET, "/api/cart", &alice, None).await;
        assert_eq!(cart["total_items"], 1);
    }
}
