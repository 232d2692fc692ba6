//! Application state shared across handlers.

use std::sync::Arc;

use velora_backend::BackendClient;

use crate::config::StorefrontConfig;
use crate::services::payments::{HostedPaymentGateway, PaymentGateway};
use crate::services::recommend::{GenerativeRecommender, Recommender};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; holds the configuration and the clients
/// for every external collaborator.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    backend: BackendClient,
    gateway: Box<dyn PaymentGateway>,
    recommender: Recommender,
}

impl AppState {
    /// Create the shared state from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let backend = BackendClient::new(&config.backend);
        let gateway = Box::new(HostedPaymentGateway::new(&config.payment));
        let recommender = Recommender::new(Box::new(GenerativeRecommender::new(
            &config.recommendation,
        )));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                backend,
                gateway,
                recommender,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn backend(&self) -> &BackendClient {
        &self.inner.backend
    }

    #[must_use]
    pub fn gateway(&self) -> &dyn PaymentGateway {
        self.inner.gateway.as_ref()
    }

    #[must_use]
    pub fn recommender(&self) -> &Recommender {
        &self.inner.recommender
    }
}
