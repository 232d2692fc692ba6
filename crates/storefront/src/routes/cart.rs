//! Cart route handlers. All require an authenticated buyer.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use velora_core::{CartLineId, ProductId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::cart::{CartAggregate, CartView};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

/// `GET /api/cart`
pub async fn view(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<CartView>> {
    let cart = CartAggregate::load(state.backend(), &auth.ctx).await?;
    Ok(Json(cart.view()))
}

/// `POST /api/cart/lines`
pub async fn add_line(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<AddLineRequest>,
) -> Result<Json<CartView>> {
    let mut cart = CartAggregate::load(state.backend(), &auth.ctx).await?;
    cart.add_line(state.backend(), &auth.ctx, request.product_id, request.quantity)
        .await?;
    Ok(Json(cart.view()))
}

/// `PUT /api/cart/lines/{id}`
pub async fn set_quantity(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(line_id): Path<CartLineId>,
    Json(request): Json<SetQuantityRequest>,
) -> Result<Json<CartView>> {
    let mut cart = CartAggregate::load(state.backend(), &auth.ctx).await?;
    cart.set_quantity(state.backend(), &auth.ctx, line_id, request.quantity)
        .await?;
    Ok(Json(cart.view()))
}

/// `DELETE /api/cart/lines/{id}`
pub async fn remove_line(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(line_id): Path<CartLineId>,
) -> Result<Json<CartView>> {
    let mut cart = CartAggregate::load(state.backend(), &auth.ctx).await?;
    cart.remove_line(state.backend(), &auth.ctx, line_id).await?;
    Ok(Json(cart.view()))
}

/// `DELETE /api/cart`
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<CartView>> {
    let mut cart = CartAggregate::load(state.backend(), &auth.ctx).await?;
    cart.clear(state.backend(), &auth.ctx).await?;
    Ok(Json(cart.view()))
}
