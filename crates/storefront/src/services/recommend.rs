//! Personalized product picks.
//!
//! A generative language API ranks the catalog against the buyer's stated
//! preferences; any failure there (missing key, timeout, unparseable reply)
//! degrades to a deterministic local heuristic. Recommendations never
//! surface an error to the buyer.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{instrument, warn};

use velora_backend::models::{Preferences, Product};
use velora_core::ProductId;

use crate::config::RecommendationConfig;

/// Upper bound on picks shown to the buyer.
const MAX_RECOMMENDATIONS: usize = 6;

/// The generative API gets a hard deadline; past it the local heuristic is
/// a better experience than a spinner.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the generative source. Internal to this module's fallback
/// handling; callers of [`Recommender::recommend`] never see them.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("recommendation API key is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("recommendation API error: status {0}")]
    Api(u16),

    #[error("unusable model reply: {0}")]
    Parse(String),
}

/// Seam for anything that can rank the catalog for one buyer.
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    async fn rank(
        &self,
        preferences: &Preferences,
        catalog: &[Product],
    ) -> Result<Vec<ProductId>, RecommendationError>;
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

/// Client for the generative ranking API.
pub struct GenerativeRecommender {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<SecretString>,
}

impl GenerativeRecommender {
    #[must_use]
    pub fn new(config: &RecommendationConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn prompt(preferences: &Preferences, catalog: &[Product]) -> String {
        use std::fmt::Write as _;

        let mut prompt = String::from(
            "You are a beauty shopping assistant. Pick up to 6 products for \
             this customer from the catalog below. Reply with ONLY the chosen \
             product IDs, comma-separated, best match first.\n\n",
        );
        let _ = writeln!(
            prompt,
            "Customer: budget {} to {}, interests [{}], skin type {}",
            preferences.min_budget,
            preferences.max_budget,
            preferences.interests.join(", "),
            preferences
                .skin_type
                .map_or("unspecified", |skin_type| skin_type.as_str()),
        );
        prompt.push_str("\nCatalog:\n");
        for product in catalog {
            let _ = writeln!(
                prompt,
                "{} | {} | {} | {} | {}",
                product.id,
                product.name,
                product.category,
                product.price,
                product.tags.join(",")
            );
        }
        prompt
    }

    /// Extract product IDs from the model's comma-separated reply, keeping
    /// only IDs that actually exist in the catalog.
    fn parse_reply(reply: &str, catalog: &[Product]) -> Vec<ProductId> {
        reply
            .split(',')
            .filter_map(|token| token.trim().parse::<ProductId>().ok())
            .filter(|id| catalog.iter().any(|p| p.id == *id))
            .take(MAX_RECOMMENDATIONS)
            .collect()
    }
}

#[async_trait]
impl RecommendationSource for GenerativeRecommender {
    #[instrument(skip_all, fields(catalog_size = catalog.len()))]
    async fn rank(
        &self,
        preferences: &Preferences,
        catalog: &[Product],
    ) -> Result<Vec<ProductId>, RecommendationError> {
        let Some(api_key) = &self.api_key else {
            return Err(RecommendationError::NotConfigured);
        };

        let prompt = Self::prompt(preferences, catalog);
        let response = self
            .client
            .post(&self.api_url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&GenerateRequest {
                contents: vec![Content {
                    parts: vec![Part { text: &prompt }],
                }],
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecommendationError::Api(status.as_u16()));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| RecommendationError::Parse(e.to_string()))?;
        let reply = body
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.as_str())
            .ok_or_else(|| RecommendationError::Parse("no candidates in reply".to_string()))?;

        let ids = Self::parse_reply(reply, catalog);
        if ids.is_empty() {
            return Err(RecommendationError::Parse(format!(
                "no catalog IDs in reply: {reply:.80}"
            )));
        }
        Ok(ids)
    }
}

/// Whether a product's price falls inside the buyer's declared budget.
///
/// Shared by the fallback heuristic and the catalog view's budget
/// annotation.
#[must_use]
pub fn in_budget(preferences: &Preferences, product: &Product) -> bool {
    product.price >= preferences.min_budget && product.price <= preferences.max_budget
}

/// Deterministic heuristic used when the generative source is unavailable.
///
/// Keeps products inside the buyer's budget, prefers those matching an
/// interest by name, category or tag, and falls back to budget-only matches
/// when no interest lines up. An out-of-reach budget yields no picks.
#[must_use]
pub fn fallback_recommendations(preferences: &Preferences, catalog: &[Product]) -> Vec<Product> {
    let affordable: Vec<&Product> = catalog
        .iter()
        .filter(|p| in_budget(preferences, p))
        .collect();

    let matches_interest = |product: &Product| {
        preferences.interests.iter().any(|interest| {
            let interest = interest.to_lowercase();
            product.name.to_lowercase().contains(&interest)
                || product.category.as_str().contains(&interest)
                || product
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&interest))
        })
    };

    let preferred: Vec<&Product> = affordable
        .iter()
        .copied()
        .filter(|p| matches_interest(p))
        .collect();

    let picks = if preferred.is_empty() {
        affordable
    } else {
        preferred
    };
    picks
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .cloned()
        .collect()
}

/// Buyer-facing recommender: generative when possible, heuristic otherwise.
pub struct Recommender {
    source: Box<dyn RecommendationSource>,
}

impl Recommender {
    #[must_use]
    pub fn new(source: Box<dyn RecommendationSource>) -> Self {
        Self { source }
    }

    /// Rank the catalog for one buyer. Infallible by contract: any source
    /// failure degrades to the local heuristic.
    #[instrument(skip_all)]
    pub async fn recommend(
        &self,
        preferences: &Preferences,
        catalog: &[Product],
    ) -> Vec<Product> {
        match self.source.rank(preferences, catalog).await {
            Ok(ids) => ids
                .into_iter()
                .filter_map(|id| catalog.iter().find(|p| p.id == id).cloned())
                .collect(),
            Err(error) => {
                warn!(%error, "generative ranking unavailable, using local heuristic");
                fallback_recommendations(preferences, catalog)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::product;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use velora_core::{AccountId, PreferencesId};

    fn preferences(min: u32, max: u32, interests: &[&str]) -> Preferences {
        Preferences {
            id: PreferencesId::generate(),
            account_id: AccountId::generate(),
            interests: interests.iter().map(ToString::to_string).collect(),
            min_budget: Decimal::from(min),
            max_budget: Decimal::from(max),
            skin_type: None,
            preferred_brands: vec![],
            phone: None,
            address: None,
            city: None,
            state: None,
            country: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tagged(name: &str, price: u32, tags: &[&str]) -> Product {
        let mut p = product(name, price);
        p.tags = tags.iter().map(ToString::to_string).collect();
        p
    }

    #[test]
    fn test_fallback_prefers_interest_matches_within_budget() {
        let catalog = vec![
            tagged("Hydrating Serum", 5000, &["hydration", "serum"]),
            tagged("Matte Lipstick", 4000, &["makeup"]),
            tagged("Luxury Cream", 50000, &["hydration"]),
        ];
        let prefs = preferences(1000, 10000, &["hydration"]);

        let picks = fallback_recommendations(&prefs, &catalog);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].name, "Hydrating Serum");
    }

    #[test]
    fn test_fallback_interest_matches_are_case_insensitive() {
        let catalog = vec![tagged("Hydrating Serum", 5000, &["Hydration"])];
        let prefs = preferences(1000, 10000, &["HYDRATION"]);

        assert_eq!(fallback_recommendations(&prefs, &catalog).len(), 1);
    }

    #[test]
    fn test_fallback_uses_budget_only_when_no_interest_matches() {
        let catalog = vec![
            tagged("Matte Lipstick", 4000, &["makeup"]),
            tagged("Luxury Cream", 50000, &["hydration"]),
        ];
        let prefs = preferences(1000, 10000, &["fragrance"]);

        let picks = fallback_recommendations(&prefs, &catalog);
        assert_eq!(picks.len(), 1);
        assert_eq!(picks[0].name, "Matte Lipstick");
    }

    #[test]
    fn test_fallback_empty_when_budget_excludes_everything() {
        let catalog = vec![tagged("Matte Lipstick", 4000, &["makeup"])];
        let prefs = preferences(0, 100, &["makeup"]);

        assert!(fallback_recommendations(&prefs, &catalog).is_empty());
    }

    #[test]
    fn test_fallback_truncates_to_limit() {
        let catalog: Vec<Product> = (0..10)
            .map(|i| tagged(&format!("Serum {i}"), 5000, &["serum"]))
            .collect();
        let prefs = preferences(1000, 10000, &["serum"]);

        assert_eq!(fallback_recommendations(&prefs, &catalog).len(), 6);
    }

    #[test]
    fn test_parse_reply_keeps_only_catalog_ids() {
        let catalog = vec![product("Serum", 5000), product("Balm", 3000)];
        let foreign = ProductId::generate();
        let reply = format!("{}, {}, {}, not-an-id", catalog[0].id, foreign, catalog[1].id);

        let ids = GenerativeRecommender::parse_reply(&reply, &catalog);
        assert_eq!(ids, vec![catalog[0].id, catalog[1].id]);
    }

    #[tokio::test]
    async fn test_recommender_falls_back_when_source_unconfigured() {
        let recommender = Recommender::new(Box::new(GenerativeRecommender::new(
            &RecommendationConfig {
                api_key: None,
                api_url: "http://localhost:1".to_string(),
            },
        )));
        let catalog = vec![tagged("Hydrating Serum", 5000, &["hydration"])];
        let prefs = preferences(1000, 10000, &["hydration"]);

        let picks = recommender.recommend(&prefs, &catalog).await;
        assert_eq!(picks.len(), 1);
    }
}
