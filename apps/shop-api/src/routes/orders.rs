//! Order routes, including the administrator endpoints.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use nexcart_core::{Money, Order};

use crate::auth::Authenticated;
use crate::error::ServiceResult;
use crate::routes::JsonBody;
use crate::AppState;

/// An order plus its derived totals.
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    #[serde(flatten)]
    pub order: Order,
    pub items_total: Money,
    pub final_total: Money,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            items_total: order.items_total(),
            final_total: order.final_total(),
            order,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub shipping_address_id: String,
    pub billing_address_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct SetTrackingRequest {
    pub tracking_number: String,
}

pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> ServiceResult<(StatusCode, Json<OrderResponse>)> {
    let order = state
        .orders
        .create_from_cart(&caller, &req.shipping_address_id, &req.billing_address_id)
        .await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
) -> ServiceResult<Json<Vec<OrderResponse>>> {
    let orders = state.orders.list(&caller).await?;
    Ok(Json(orders.into_iter().map(OrderResponse::from).collect()))
}

pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ServiceResult<Json<OrderResponse>> {
    let order = state.orders.get(&caller, &id).await?;
    Ok(Json(order.into()))
}

pub async fn cancel_order(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
) -> ServiceResult<Json<OrderResponse>> {
    let order = state.orders.cancel(&caller, &id).await?;
    Ok(Json(order.into()))
}

pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<SetStatusRequest>,
) -> ServiceResult<Json<OrderResponse>> {
    let order = state.orders.set_status(&caller, &id, &req.status).await?;
    Ok(Json(order.into()))
}

pub async fn set_tracking_number(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<SetTrackingRequest>,
) -> ServiceResult<Json<OrderResponse>> {
    let order = state
        .orders
        .set_tracking_number(&caller, &id, &req.tracking_number)
        .await?;
    Ok(Json(order.into()))
}
