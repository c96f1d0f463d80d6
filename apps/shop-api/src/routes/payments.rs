//! Payment routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use nexcart_core::Payment;

use crate::auth::Authenticated;
use crate::error::ServiceResult;
use crate::routes::JsonBody;
use crate::services::IntentCreated;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateIntentRequest {
    pub order_id: String,
}

pub async fn create_intent(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    JsonBody(req): JsonBody<CreateIntentRequest>,
) -> ServiceResult<Json<IntentCreated>> {
    Ok(Json(state.payments.create_intent(&caller, &req.order_id).await?))
}

pub async fn list_payments(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
) -> ServiceResult<Json<Vec<Payment>>> {
    Ok(Json(state.payments.list(&caller).await?))
}

pub async fn get_payment(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ServiceResult<Json<Payment>> {
    Ok(Json(state.payments.get(&caller, &id).await?))
}

pub async fn confirm_payment(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ServiceResult<Json<Payment>> {
    Ok(Json(state.payments.confirm(&caller, &id).await?))
}

pub async fn cancel_payment(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ServiceResult<Json<Payment>> {
    Ok(Json(state.payments.cancel(&caller, &id).await?))
}
