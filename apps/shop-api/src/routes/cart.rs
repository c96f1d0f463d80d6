//! Cart routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use nexcart_core::{Cart, Money};

use crate::auth::Authenticated;
use crate::error::ServiceResult;
use crate::routes::JsonBody;
use crate::AppState;

/// A cart plus its derived totals.
#[derive(Debug, Serialize)]
pub struct CartResponse {
    #[serde(flatten)]
    pub cart: Cart,
    pub total_price: Money,
    pub total_items: i64,
}

impl From<Cart> for CartResponse {
    fn from(cart: Cart) -> Self {
        CartResponse {
            total_price: cart.total_price(),
            total_items: cart.total_items(),
            cart,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

fn default_quantity() -> i64 {
    1
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i64,
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
) -> ServiceResult<Json<CartResponse>> {
    let cart = state.carts.get_or_create(&caller).await?;
    Ok(Json(cart.into()))
}

pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    JsonBody(req): JsonBody<AddItemRequest>,
) -> ServiceResult<Json<CartResponse>> {
    let cart = state.carts.add_item(&caller, &req.product_id, req.quantity).await?;
    Ok(Json(cart.into()))
}

pub async fn update_item(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(line_id): Path<String>,
    JsonBody(req): JsonBody<UpdateItemRequest>,
) -> ServiceResult<Json<CartResponse>> {
    let cart = state.carts.update_item(&caller, &line_id, req.quantity).await?;
    Ok(Json(cart.into()))
}

pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
    Path(line_id): Path<String>,
) -> ServiceResult<Json<CartResponse>> {
    let cart = state.carts.remove_item(&caller, &line_id).await?;
    Ok(Json(cart.into()))
}

pub async fn clear(
    State(state): State<Arc<AppState>>,
    Authenticated(caller): Authenticated,
) -> ServiceResult<Json<CartResponse>> {
    let cart = state.carts.clear(&caller).await?;
    Ok(Json(cart.into()))
}
