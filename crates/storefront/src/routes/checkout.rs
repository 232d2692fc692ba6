//! Checkout route handlers.

use axum::{Json, extract::State};
use serde::Deserialize;

use velora_core::PaymentReference;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::services::cart::CartAggregate;
use crate::services::checkout::{BeganCheckout, CheckoutCompletion, CheckoutOrchestrator};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct BeginRequest {
    pub shipping_address: String,
}

#[derive(Debug, Deserialize)]
pub struct CompleteRequest {
    pub reference: PaymentReference,
}

fn orchestrator(state: &AppState) -> CheckoutOrchestrator<'_> {
    CheckoutOrchestrator::new(
        state.backend(),
        state.backend(),
        state.gateway(),
        state.config().payment.public_key.as_deref(),
        state.config().payment.currency,
    )
}

/// `POST /api/checkout`
///
/// Records the attempt and returns the hosted widget payload; the card
/// interaction itself happens in the buyer's browser.
pub async fn begin(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<BeginRequest>,
) -> Result<Json<BeganCheckout>> {
    let cart = CartAggregate::load(state.backend(), &auth.ctx).await?;
    let began = orchestrator(&state)
        .begin(&auth.ctx, &cart, &request.shipping_address)
        .await?;
    Ok(Json(began))
}

/// `POST /api/checkout/complete`
///
/// Called after the widget reports back (success or dismissal). The
/// outcome is verified with the provider; the client's claim is ignored.
pub async fn complete(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<CompleteRequest>,
) -> Result<Json<CheckoutCompletion>> {
    let completion = orchestrator(&state)
        .complete(&auth.ctx, &request.reference)
        .await?;
    Ok(Json(completion))
}
