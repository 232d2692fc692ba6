//! Dashboard stats handler.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;

use velora_backend::models::{Order, Product};
use velora_backend::{OrderListing, ProductListing};
use velora_core::PaymentStatus;

use crate::error::Result;
use crate::state::AppState;

/// Counters for the back-office landing page.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_products: usize,
    pub active_products: usize,
    pub total_orders: usize,
    pub paid_orders: usize,
    pub abandoned_orders: usize,
    /// Sum of paid order totals.
    pub revenue: Decimal,
}

fn compute(products: &[Product], orders: &[Order]) -> DashboardStats {
    let paid: Vec<&Order> = orders
        .iter()
        .filter(|o| o.payment_status == PaymentStatus::Paid)
        .collect();

    DashboardStats {
        total_products: products.len(),
        active_products: products.iter().filter(|p| p.is_active).count(),
        total_orders: orders.len(),
        paid_orders: paid.len(),
        abandoned_orders: orders.iter().filter(|o| o.is_abandoned()).count(),
        revenue: paid.iter().map(|o| o.total_amount).sum(),
    }
}

/// `GET /api/dashboard`
pub async fn stats(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let products = state
        .backend()
        .list_products(
            &state.auth(),
            &ProductListing {
                include_unlisted: true,
                ..ProductListing::default()
            },
        )
        .await?;
    let orders = state
        .backend()
        .list_orders(&state.auth(), &OrderListing::default())
        .await?;

    Ok(Json(compute(&products, &orders)))
}
