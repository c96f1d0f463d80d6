//! # HTTP Routes
//!
//! Thin handlers: extract the caller and the body, call one service
//! operation, render the snapshot it returns.
//!
//! ```text
//! GET    /health
//!
//! GET    /api/cart                         POST   /api/orders
//! POST   /api/cart/items                   GET    /api/orders
//! DELETE /api/cart/items                   GET    /api/orders/{id}
//! PATCH  /api/cart/items/{line_id}         POST   /api/orders/{id}/cancel
//! DELETE /api/cart/items/{line_id}         PUT    /api/admin/orders/{id}/status
//!                                          PUT    /api/admin/orders/{id}/tracking
//! POST   /api/payments/intents
//! GET    /api/payments
//! GET    /api/payments/{id}
//! POST   /api/payments/{id}/confirm
//! POST   /api/payments/{id}/cancel
//! ```
//!
//! Everything under `/api` needs a bearer token. Request bodies are read
//! through [`JsonBody`], so a malformed body is an `INVALID_ARGUMENT` error
//! like any other.

use std::sync::Arc;

use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde_json::json;

use crate::error::ServiceError;
use crate::AppState;

pub mod cart;
pub mod orders;
pub mod payments;

/// Builds the full router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/items", post(cart::add_item).delete(cart::clear))
        .route(
            "/api/cart/items/{line_id}",
            patch(cart::update_item).delete(cart::remove_item),
        )
        .route("/api/orders", post(orders::create_order).get(orders::list_orders))
        .route("/api/orders/{id}", get(orders::get_order))
        .route("/api/orders/{id}/cancel", post(orders::cancel_order))
        .route("/api/admin/orders/{id}/status", put(orders::set_status))
        .route("/api/admin/orders/{id}/tracking", put(orders::set_tracking_number))
        .route("/api/payments/intents", post(payments::create_intent))
        .route("/api/payments", get(payments::list_payments))
        .route("/api/payments/{id}", get(payments::get_payment))
        .route("/api/payments/{id}/confirm", post(payments::confirm_payment))
        .route("/api/payments/{id}/cancel", post(payments::cancel_payment))
        .with_state(state)
}

/// `Json<T>` whose rejection renders as a [`ServiceError`].
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<S, T> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(value))
    }
}

/// Pool health: 200 if `SELECT 1` succeeds, 503 otherwise.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if state.db.health_check().await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        )
    }
}
