//! Auth route handlers.
//!
//! Credentials never touch local storage; signup and login are proxied to
//! the identity collaborator and the resulting bearer token goes straight
//! back to the client.

use axum::{Json, extract::State};
use serde::Deserialize;

use velora_backend::Session;
use velora_backend::models::Account;
use velora_core::Email;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /api/auth/register`
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<Session>> {
    let email = Email::parse(&request.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    if request.password.len() < 8 {
        return Err(AppError::BadRequest(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let session = state
        .backend()
        .sign_up(&email, &request.password, request.display_name.trim())
        .await?;
    Ok(Json(session))
}

/// `POST /api/auth/login`
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<Session>> {
    let email = Email::parse(&request.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let session = state.backend().sign_in(&email, &request.password).await?;
    Ok(Json(session))
}

/// `GET /api/auth/me`
pub async fn me(RequireAuth(auth): RequireAuth) -> Json<Account> {
    Json(auth.account)
}
