//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness check
//! GET    /ready                       - Readiness check (pings the backend)
//!
//! # Auth
//! POST   /api/auth/register           - Create an account
//! POST   /api/auth/login              - Exchange credentials for a token
//! GET    /api/auth/me                 - Current account (requires auth)
//!
//! # Catalog
//! GET    /api/products                - Listing (?category=&search=)
//! GET    /api/products/{id}           - Product detail
//!
//! # Cart (requires auth)
//! GET    /api/cart                    - Cart view
//! POST   /api/cart/lines              - Add a product
//! PUT    /api/cart/lines/{id}         - Set quantity (0 removes)
//! DELETE /api/cart/lines/{id}         - Remove a line
//! DELETE /api/cart                    - Clear the cart
//!
//! # Checkout (requires auth)
//! POST   /api/checkout                - Begin an attempt, returns widget payload
//! POST   /api/checkout/complete       - Verify by reference and reconcile
//!
//! # Orders (requires auth)
//! GET    /api/orders                  - Order history
//! GET    /api/orders/{id}             - Detail with tracking timeline
//!
//! # Profile (requires auth)
//! GET    /api/profile/preferences     - Stored preferences, null when unset
//! PUT    /api/profile/preferences     - Upsert preferences
//!
//! # Recommendations (requires auth)
//! GET    /api/recommendations         - Personalized picks, never errors
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod profile;
pub mod recommendations;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
};
use serde_json::json;

use crate::state::AppState;

/// Assemble the API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/products", get(products::list))
        .route("/products/{id}", get(products::detail))
        .route("/cart", get(cart::view).delete(cart::clear))
        .route("/cart/lines", post(cart::add_line))
        .route(
            "/cart/lines/{id}",
            put(cart::set_quantity).delete(cart::remove_line),
        )
        .route("/checkout", post(checkout::begin))
        .route("/checkout/complete", post(checkout::complete))
        .route("/orders", get(orders::history))
        .route("/orders/{id}", get(orders::detail))
        .route(
            "/profile/preferences",
            get(profile::preferences).put(profile::update_preferences),
        )
        .route("/recommendations", get(recommendations::picks))
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
