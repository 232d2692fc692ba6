//! Order history and tracking route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;

use velora_backend::models::Order;
use velora_core::OrderId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::orders::{OrderTimeline, order_timeline};
use crate::state::AppState;

/// Order detail with its tracking timeline.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub timeline: OrderTimeline,
}

/// `GET /api/orders`
pub async fn history(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = state
        .backend()
        .orders_for_account(&auth.ctx.backend_auth(), auth.ctx.account_id)
        .await?;
    Ok(Json(orders))
}

/// `GET /api/orders/{id}`
pub async fn detail(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    let order = state
        .backend()
        .order(&auth.ctx.backend_auth(), order_id)
        .await?
        .filter(|order| order.account_id == auth.ctx.account_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;

    let timeline = order_timeline(order.status);
    Ok(Json(OrderDetail { order, timeline }))
}
