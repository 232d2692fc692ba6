//! HTTP route handlers for the admin API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health              - Liveness check
//! GET    /ready               - Readiness check (pings the backend)
//!
//! # Catalog management
//! GET    /api/products        - Full catalog including unlisted rows
//! POST   /api/products        - Create a product
//! PATCH  /api/products/{id}   - Partial update
//! DELETE /api/products/{id}   - Deactivate (never deletes the row)
//!
//! # Order management
//! GET    /api/orders          - Listing (?status=, ?abandoned=true)
//! GET    /api/orders/{id}     - Detail with lines
//! PATCH  /api/orders/{id}     - Status / tracking number update
//!
//! # Reporting
//! GET    /api/customers       - Per-account order count and lifetime total
//! GET    /api/dashboard       - Aggregate counters
//! ```

pub mod customers;
pub mod dashboard;
pub mod orders;
pub mod products;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde_json::json;

use crate::state::AppState;

/// Assemble the API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::detail)
                .patch(products::update)
                .delete(products::deactivate),
        )
        .route("/orders", get(orders::list))
        .route(
            "/orders/{id}",
            get(orders::detail).patch(orders::update_status),
        )
        .route("/customers", get(customers::report))
        .route("/dashboard", get(dashboard::stats))
}

/// Liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Readiness probe: verifies the backend collaborator answers.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    match state.backend().ping().await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
