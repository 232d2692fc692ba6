//! Recommendation route handler.

use axum::{Json, extract::State};

use velora_backend::models::Product;
use velora_backend::{AuthContext, ProductListing};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// `GET /api/recommendations`
///
/// Personalized picks for the buyer. A buyer without saved preferences
/// gets an empty list; ranking failures degrade to the local heuristic
/// inside the recommender, so this only errors on catalog reads.
pub async fn picks(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let Some(preferences) = state
        .backend()
        .preferences(&auth.ctx.backend_auth(), auth.ctx.account_id)
        .await?
    else {
        return Ok(Json(vec![]));
    };

    let catalog = state
        .backend()
        .list_products(&AuthContext::Anonymous, &ProductListing::default())
        .await?;

    let picks = state.recommender().recommend(&preferences, &catalog).await;
    Ok(Json(picks))
}
