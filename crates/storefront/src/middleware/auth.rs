//! Authentication extractor.
//!
//! Buyers authenticate against the managed identity collaborator; routes
//! receive a bearer token which is validated remotely on every request.
//! There is no local session state.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use velora_backend::models::Account;

use crate::error::{AppError, set_sentry_user};
use crate::services::cart::AccountContext;
use crate::state::AppState;

/// A validated caller: the account row plus the per-request context the
/// services take.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub account: Account,
    pub ctx: AccountContext,
}

/// Extractor that requires a valid bearer token.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(RequireAuth(auth): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", auth.account.display_name)
/// }
/// ```
pub struct RequireAuth(pub Authenticated);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".to_string()))?;

        let account = state
            .backend()
            .current_account(&token)
            .await
            .map_err(|_| AppError::Unauthorized("invalid or expired token".to_string()))?;

        set_sentry_user(&account.id, Some(account.email.as_str()));

        let ctx = AccountContext {
            account_id: account.id,
            email: account.email.clone(),
            access_token: token,
        };
        Ok(Self(Authenticated { account, ctx }))
    }
}

/// Extractor that optionally resolves the caller.
///
/// Unlike [`RequireAuth`] this never rejects: a missing or invalid token
/// yields `None` and the route serves its anonymous view.
pub struct OptionalAuth(pub Option<Authenticated>);

impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match RequireAuth::from_request_parts(parts, state).await {
            Ok(RequireAuth(auth)) => Ok(Self(Some(auth))),
            Err(_) => Ok(Self(None)),
        }
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}
