//! HTTP client for the managed backend.
//!
//! The backend exposes two surfaces:
//!
//! - `/auth/v1/*` - sign-up, password sign-in, bearer-token identity
//! - `/rest/v1/{table}` - table-oriented reads and writes with equality
//!   filters (`column=eq.value`), join-style selects
//!   (`select=*,product:products(*)`), and representation returns
//!
//! Every request carries the publishable `apikey` header. The
//! `Authorization` bearer decides which row-level policy applies: the
//! buyer's access token, the service-role key, or the publishable key for
//! anonymous catalog reads.

mod accounts;
mod cart;
mod orders;
mod products;

pub use orders::OrderListing;
pub use products::ProductListing;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;

use velora_core::Email;

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::models::{Account, Product};

/// How the current call authenticates against the backend.
#[derive(Debug, Clone)]
pub enum AuthContext {
    /// Publishable key only. Row-level policy exposes active products and
    /// nothing account-scoped.
    Anonymous,
    /// A buyer's access token. Policy restricts rows to the token's account.
    User(String),
    /// Service-role key. Bypasses row-level policy; admin binary only.
    Service,
}

/// An authenticated session returned by sign-up or sign-in. Relayed to
/// the browser client as-is, so it serializes both ways.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub access_token: String,
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    pub account: Account,
}

/// Client for the managed table-store collaborator.
///
/// Cheaply cloneable via `Arc`. Active-catalog reads are cached for 5
/// minutes; cart and order state is never cached.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    http: reqwest::Client,
    base_url: String,
    publishable_key: String,
    service_key: Option<SecretString>,
    catalog_cache: Cache<String, Vec<Product>>,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    display_name: &'a str,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let catalog_cache = Cache::builder()
            .max_capacity(100)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                http: reqwest::Client::new(),
                base_url: config.base_url.trim_end_matches('/').to_string(),
                publishable_key: config.publishable_key.clone(),
                service_key: config.service_key.clone(),
                catalog_cache,
            }),
        }
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Register a new buyer account.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Conflict`] when the email is already
    /// registered, or another variant when the call fails.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        display_name: &str,
    ) -> Result<Session, BackendError> {
        let url = format!("{}/auth/v1/signup", self.inner.base_url);
        let request = self
            .request(reqwest::Method::POST, &url, &AuthContext::Anonymous)?
            .json(&SignUpRequest {
                email: email.as_str(),
                password,
                display_name,
            });
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// Exchange email/password credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] for bad credentials.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &Email, password: &str) -> Result<Session, BackendError> {
        let url = format!(
            "{}/auth/v1/token?grant_type=password",
            self.inner.base_url
        );
        let request = self
            .request(reqwest::Method::POST, &url, &AuthContext::Anonymous)?
            .json(&SignInRequest {
                email: email.as_str(),
                password,
            });
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// Resolve a bearer token to its account projection.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Unauthorized`] for expired or invalid tokens.
    #[instrument(skip(self, access_token))]
    pub async fn current_account(&self, access_token: &str) -> Result<Account, BackendError> {
        let url = format!("{}/auth/v1/user", self.inner.base_url);
        let auth = AuthContext::User(access_token.to_string());
        let request = self.request(reqwest::Method::GET, &url, &auth)?;
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// Cheap connectivity probe for readiness checks.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or rejects the key.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let url = format!("{}/rest/v1/", self.inner.base_url);
        let request = self.request(reqwest::Method::GET, &url, &AuthContext::Anonymous)?;
        self.send(request).await?;
        Ok(())
    }

    // =========================================================================
    // Request Plumbing
    // =========================================================================

    fn bearer(&self, auth: &AuthContext) -> Result<String, BackendError> {
        match auth {
            AuthContext::Anonymous => Ok(self.inner.publishable_key.clone()),
            AuthContext::User(token) => Ok(token.clone()),
            AuthContext::Service => self
                .inner
                .service_key
                .as_ref()
                .map(|key| key.expose_secret().to_string())
                .ok_or_else(|| {
                    BackendError::Unauthorized("service-role key not configured".to_string())
                }),
        }
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        auth: &AuthContext,
    ) -> Result<reqwest::RequestBuilder, BackendError> {
        let bearer = self.bearer(auth)?;
        Ok(self
            .inner
            .http
            .request(method, url)
            .header("apikey", &self.inner.publishable_key)
            .bearer_auth(bearer))
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        // Error payloads are `{"message": "..."}`; fall back to the raw body
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| body.chars().take(200).collect());

        Err(BackendError::from_status(status.as_u16(), message))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "failed to decode backend response"
            );
            BackendError::Parse(e.to_string())
        })
    }

    /// GET rows from a table with the given query parameters.
    async fn fetch_rows<T: DeserializeOwned>(
        &self,
        auth: &AuthContext,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let url = format!("{}/rest/v1/{table}", self.inner.base_url);
        let request = self
            .request(reqwest::Method::GET, &url, auth)?
            .query(query);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// GET at most one row from a table.
    async fn fetch_optional<T: DeserializeOwned>(
        &self,
        auth: &AuthContext,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, BackendError> {
        let mut rows: Vec<T> = self.fetch_rows(auth, table, query).await?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// POST a body and return the inserted rows.
    ///
    /// When `on_conflict` names a unique key, the insert becomes an upsert
    /// that replaces the conflicting row (merge-duplicates semantics).
    async fn insert_returning<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        auth: &AuthContext,
        table: &str,
        body: &B,
        on_conflict: Option<&str>,
    ) -> Result<Vec<T>, BackendError> {
        let url = format!("{}/rest/v1/{table}", self.inner.base_url);
        let prefer = if on_conflict.is_some() {
            "resolution=merge-duplicates,return=representation"
        } else {
            "return=representation"
        };

        let mut request = self
            .request(reqwest::Method::POST, &url, auth)?
            .header("Prefer", prefer)
            .json(body);
        if let Some(key) = on_conflict {
            request = request.query(&[("on_conflict", key)]);
        }

        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// POST a single row and return it.
    async fn insert_one<T: DeserializeOwned, B: Serialize>(
        &self,
        auth: &AuthContext,
        table: &str,
        body: &B,
        on_conflict: Option<&str>,
    ) -> Result<T, BackendError> {
        let mut rows: Vec<T> = self.insert_returning(auth, table, body, on_conflict).await?;
        if rows.is_empty() {
            return Err(BackendError::Parse(format!(
                "insert into {table} returned no representation"
            )));
        }
        Ok(rows.swap_remove(0))
    }

    /// PATCH rows matching the filters and return the updated rows.
    async fn update_returning<T: DeserializeOwned, B: Serialize>(
        &self,
        auth: &AuthContext,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
    ) -> Result<Vec<T>, BackendError> {
        let url = format!("{}/rest/v1/{table}", self.inner.base_url);
        let request = self
            .request(reqwest::Method::PATCH, &url, auth)?
            .header("Prefer", "return=representation")
            .query(filters)
            .json(body);
        let response = self.send(request).await?;
        Self::decode(response).await
    }

    /// DELETE rows matching the filters.
    async fn delete_rows(
        &self,
        auth: &AuthContext,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<(), BackendError> {
        let url = format!("{}/rest/v1/{table}", self.inner.base_url);
        let request = self
            .request(reqwest::Method::DELETE, &url, auth)?
            .query(filters);
        self.send(request).await?;
        Ok(())
    }

    fn catalog_cache(&self) -> &Cache<String, Vec<Product>> {
        &self.inner.catalog_cache
    }
}
