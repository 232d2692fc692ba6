//! Recommendation scenarios over a realistic catalog.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use velora_backend::models::{Preferences, Product};
use velora_core::ProductCategory::{Fragrance, Makeup, Skincare};
use velora_core::{AccountId, PreferencesId, ProductId};
use velora_integration_tests::catalog_product;
use velora_storefront::services::recommend::{
    RecommendationError, RecommendationSource, Recommender, fallback_recommendations,
};

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

fn catalog() -> Vec<Product> {
    vec![
        catalog_product("Hydrating Serum", 5000, Skincare, &["hydration", "serum"]),
        catalog_product("Repair Balm", 3000, Skincare, &["repair"]),
        catalog_product("Matte Lipstick", 4000, Makeup, &["lipstick"]),
        catalog_product("Oud Parfum", 45000, Fragrance, &["oud"]),
    ]
}

#[test]
fn test_interest_in_category_name_selects_skincare() {
    let picks = fallback_recommendations(&preferences(1000, 10000, &["skincare"]), &catalog());

    assert_eq!(picks.len(), 2);
    assert!(picks.iter().all(|p| p.category == Skincare));
}

#[test]
fn test_budget_excludes_expensive_interest_match() {
    // The buyer loves fragrance but the only fragrance is out of budget
    let picks = fallback_recommendations(&preferences(1000, 10000, &["oud"]), &catalog());

    assert!(picks.iter().all(|p| p.price <= Decimal::from(10000)));
    assert!(!picks.is_empty());
}

#[test]
fn test_unreachable_budget_yields_nothing() {
    let picks = fallback_recommendations(&preferences(0, 100, &["skincare"]), &catalog());
    assert!(picks.is_empty());
}

struct RankByScript(Vec<ProductId>);

#[async_trait]
impl RecommendationSource for RankByScript {
    async fn rank(
        &self,
        _preferences: &Preferences,
        _catalog: &[Product],
    ) -> Result<Vec<ProductId>, RecommendationError> {
        Ok(self.0.clone())
    }
}

struct AlwaysFails;

#[async_trait]
impl RecommendationSource for AlwaysFails {
    async fn rank(
        &self,
        _preferences: &Preferences,
        _catalog: &[Product],
    ) -> Result<Vec<ProductId>, RecommendationError> {
        Err(RecommendationError::Api(500))
    }
}

#[tokio::test]
async fn test_recommender_preserves_source_ranking() {
    let catalog = catalog();
    let scripted = vec![catalog[2].id, catalog[0].id];
    let recommender = Recommender::new(Box::new(RankByScript(scripted.clone())));

    let picks = recommender
        .recommend(&preferences(1000, 10000, &[]), &catalog)
        .await;
    let ids: Vec<ProductId> = picks.iter().map(|p| p.id).collect();
    assert_eq!(ids, scripted);
}

#[tokio::test]
async fn test_recommender_absorbs_source_failure() {
    let recommender = Recommender::new(Box::new(AlwaysFails));

    let picks = recommender
        .recommend(&preferences(1000, 10000, &["skincare"]), &catalog())
        .await;

    // Degrades to the deterministic heuristic instead of erroring
    assert_eq!(picks.len(), 2);
}
