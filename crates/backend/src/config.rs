//! Connection settings for the managed backend.

use secrecy::SecretString;

/// Configuration for the managed table-store collaborator.
///
/// Implements `Debug` manually to redact the service-role key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL of the backend project (e.g., `https://velora.backend.example.com`).
    pub base_url: String,
    /// Publishable API key. Safe to expose; row-level policies still apply.
    pub publishable_key: String,
    /// Service-role key that bypasses row-level policies. Admin binary only.
    pub service_key: Option<SecretString>,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("base_url", &self.base_url)
            .field("publishable_key", &self.publishable_key)
            .field(
                "service_key",
                &self.service_key.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_service_key() {
        let config = BackendConfig {
            base_url: "https://velora.backend.example.com".to_string(),
            publishable_key: "pk_live_visible".to_string(),
            service_key: Some(SecretString::from("sk_live_very_secret")),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("pk_live_visible"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_live_very_secret"));
    }
}
