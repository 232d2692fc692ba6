//! Order management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use velora_backend::OrderListing;
use velora_backend::models::{Order, OrderStatusPatch};
use velora_core::{FulfillmentStatus, OrderId};

use crate::error::{AdminError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub status: Option<FulfillmentStatus>,
    /// Show only abandoned checkout attempts (pending fulfillment and
    /// pending payment). Overrides `status`.
    #[serde(default)]
    pub abandoned: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<FulfillmentStatus>,
    pub tracking_number: Option<String>,
}

/// `GET /api/orders`
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>> {
    let listing = OrderListing {
        status: query.status,
        abandoned_only: query.abandoned,
    };
    let orders = state.backend().list_orders(&state.auth(), &listing).await?;
    Ok(Json(orders))
}

/// `GET /api/orders/{id}`
pub async fn detail(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Order>> {
    let order = state
        .backend()
        .order(&state.auth(), order_id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("order {order_id}")))?;
    Ok(Json(order))
}

/// `PATCH /api/orders/{id}`
///
/// Advance the fulfillment status and/or attach a carrier tracking number.
/// Transitions run through the state machine: forward-only, cancel from
/// any non-terminal state.
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(request): Json<StatusUpdateRequest>,
) -> Result<Json<Order>> {
    if request.status.is_none() && request.tracking_number.is_none() {
        return Err(AdminError::BadRequest(
            "nothing to update: provide status and/or tracking_number".to_string(),
        ));
    }

    let order = state
        .backend()
        .order(&state.auth(), order_id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("order {order_id}")))?;

    if let Some(to) = request.status
        && !order.status.can_transition_to(to)
    {
        return Err(AdminError::InvalidTransition {
            from: order.status,
            to,
        });
    }

    let patch = OrderStatusPatch {
        status: request.status,
        payment_status: None,
        tracking_number: request.tracking_number,
    };
    let updated = state
        .backend()
        .update_order_status(&state.auth(), order_id, &patch)
        .await?;
    Ok(Json(updated))
}
