//! Buyer preference route handlers.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Deserialize;

use velora_backend::models::{Preferences, PreferencesUpsert};
use velora_core::SkinType;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    #[serde(default)]
    pub interests: Vec<String>,
    pub min_budget: Decimal,
    pub max_budget: Decimal,
    #[serde(default)]
    pub skin_type: Option<SkinType>,
    #[serde(default)]
    pub preferred_brands: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// `GET /api/profile/preferences`
///
/// `null` body when the buyer never saved preferences.
pub async fn preferences(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
) -> Result<Json<Option<Preferences>>> {
    let preferences = state
        .backend()
        .preferences(&auth.ctx.backend_auth(), auth.ctx.account_id)
        .await?;
    Ok(Json(preferences))
}

/// `PUT /api/profile/preferences`
pub async fn update_preferences(
    State(state): State<AppState>,
    RequireAuth(auth): RequireAuth,
    Json(request): Json<PreferencesRequest>,
) -> Result<Json<Preferences>> {
    if request.min_budget < Decimal::ZERO || request.max_budget < request.min_budget {
        return Err(AppError::BadRequest(
            "budget range must satisfy 0 <= min <= max".to_string(),
        ));
    }

    let upsert = PreferencesUpsert {
        account_id: auth.ctx.account_id,
        interests: request.interests,
        min_budget: request.min_budget,
        max_budget: request.max_budget,
        skin_type: request.skin_type,
        preferred_brands: request.preferred_brands,
        phone: request.phone,
        address: request.address,
        city: request.city,
        state: request.state,
        country: request.country,
    };
    let saved = state
        .backend()
        .upsert_preferences(&auth.ctx.backend_auth(), &upsert)
        .await?;
    Ok(Json(saved))
}
