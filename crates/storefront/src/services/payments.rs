//! Hosted payment provider integration.
//!
//! Card collection happens out-of-process in the provider's hosted widget;
//! this module only builds the widget invocation payload and verifies
//! transaction outcomes server-side by reference. The provider is the
//! source of truth for whether money was taken.

use async_trait::async_trait;
use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use velora_core::{Email, PaymentReference, Price};

use crate::config::PaymentConfig;

/// Payment provider API base URL.
const BASE_URL: &str = "https://api.paystack.co";

/// Errors that can occur when interacting with the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("provider error: {status} - {message}")]
    Api { status: u16, message: String },

    /// No secret key configured for server-side verification.
    #[error("payment provider secret key not configured")]
    NotConfigured,

    /// The provider has no transaction for the reference.
    #[error("unknown payment reference: {0}")]
    UnknownReference(String),

    /// Failed to parse the provider response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Terminal outcome of one widget invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The provider captured the payment.
    Succeeded,
    /// The provider reported an explicit failure.
    Failed { reason: String },
    /// The buyer closed the widget without completing payment.
    Abandoned,
}

/// Everything the browser widget needs to collect the card payment.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetInvocation {
    pub public_key: String,
    pub email: Email,
    /// Integer amount in the currency's minor unit (e.g., kobo).
    pub amount_minor_units: i64,
    pub currency_code: &'static str,
    pub reference: PaymentReference,
}

impl WidgetInvocation {
    /// Build the invocation payload for a checkout attempt.
    #[must_use]
    pub fn new(
        public_key: String,
        email: Email,
        total: Price,
        reference: PaymentReference,
    ) -> Self {
        Self {
            public_key,
            email,
            amount_minor_units: total.minor_units(),
            currency_code: total.currency_code.code(),
            reference,
        }
    }
}

/// Generate a payment reference: time-based prefix plus random suffix.
///
/// Collision probability is negligible but not proven zero; the unique key
/// on the orders table catches the pathological case and the buyer retries.
#[must_use]
pub fn generate_payment_reference() -> PaymentReference {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(char::from)
        .collect();
    PaymentReference::new(format!("vl_{millis}_{}", suffix.to_lowercase()))
}

/// Seam between the checkout orchestrator and the payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Verify the terminal status of a transaction by reference.
    async fn verify(&self, reference: &PaymentReference) -> Result<PaymentOutcome, PaymentError>;
}

/// Provider client performing server-side transaction verification.
#[derive(Clone)]
pub struct HostedPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    secret_key: Option<SecretString>,
}

#[derive(Deserialize)]
struct VerifyResponse {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<VerifyData>,
}

#[derive(Deserialize)]
struct VerifyData {
    status: String,
    #[serde(default)]
    gateway_response: Option<String>,
}

impl HostedPaymentGateway {
    /// Create a gateway from the payment configuration.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: BASE_URL.to_string(),
            secret_key: config.secret_key.clone(),
        }
    }

    /// Create a gateway pointed at a non-default base URL.
    #[must_use]
    pub fn with_base_url(config: &PaymentConfig, base_url: String) -> Self {
        Self {
            base_url,
            ..Self::new(config)
        }
    }
}

#[async_trait]
impl PaymentGateway for HostedPaymentGateway {
    #[instrument(skip(self), fields(reference = %reference))]
    async fn verify(&self, reference: &PaymentReference) -> Result<PaymentOutcome, PaymentError> {
        let secret_key = self.secret_key.as_ref().ok_or(PaymentError::NotConfigured)?;

        let url = format!("{}/transaction/verify/{}", self.base_url, reference);
        let response = self
            .client
            .get(&url)
            .bearer_auth(secret_key.expose_secret())
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(PaymentError::UnknownReference(reference.to_string()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: VerifyResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        if !body.status {
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message: body.message.unwrap_or_else(|| "verification failed".to_string()),
            });
        }

        let data = body
            .data
            .ok_or_else(|| PaymentError::Parse("verification response has no data".to_string()))?;

        Ok(match data.status.as_str() {
            "success" => PaymentOutcome::Succeeded,
            "abandoned" => PaymentOutcome::Abandoned,
            other => PaymentOutcome::Failed {
                reason: data
                    .gateway_response
                    .unwrap_or_else(|| other.to_string()),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use velora_core::CurrencyCode;

    #[test]
    fn test_reference_format() {
        let reference = generate_payment_reference();
        let text = reference.as_str();
        assert!(text.starts_with("vl_"));
        let parts: Vec<&str> = text.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts.get(2).map(|s| s.len()), Some(9));
    }

    #[test]
    fn test_references_are_unique() {
        let a = generate_payment_reference();
        let b = generate_payment_reference();
        assert_ne!(a, b);
    }

    #[test]
    fn test_widget_invocation_converts_to_minor_units() {
        let email = Email::parse("buyer@example.com").expect("valid email");
        let total = Price::new(Decimal::from(15000), CurrencyCode::NGN);
        let invocation = WidgetInvocation::new(
            "pk_test".to_string(),
            email,
            total,
            PaymentReference::new("vl_1_abcdefghi".to_string()),
        );

        assert_eq!(invocation.amount_minor_units, 1_500_000);
        assert_eq!(invocation.currency_code, "NGN");
    }
}
