//! Catalog route handlers. Public: browsing needs no account, but a
//! logged-in buyer with saved preferences gets a budget annotation on
//! each listing entry.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use velora_backend::models::Product;
use velora_backend::{AuthContext, ProductListing};
use velora_core::{ProductCategory, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::services::recommend::in_budget;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<ProductCategory>,
    pub search: Option<String>,
}

/// One listing entry; `in_budget` is only present for buyers with saved
/// preferences.
#[derive(Debug, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub product: Product,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_budget: Option<bool>,
}

/// `GET /api/products`
pub async fn list(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<CatalogEntry>>> {
    let listing = ProductListing {
        category: query.category,
        search: query.search.filter(|s| !s.trim().is_empty()),
        include_unlisted: false,
    };
    let products = state
        .backend()
        .list_products(&AuthContext::Anonymous, &listing)
        .await?;

    let preferences = match &auth {
        Some(auth) => {
            state
                .backend()
                .preferences(&auth.ctx.backend_auth(), auth.ctx.account_id)
                .await?
        }
        None => None,
    };

    let entries = products
        .into_iter()
        .map(|product| CatalogEntry {
            in_budget: preferences.as_ref().map(|prefs| in_budget(prefs, &product)),
            product,
        })
        .collect();
    Ok(Json(entries))
}

/// `GET /api/products/{id}`
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = state
        .backend()
        .product(&AuthContext::Anonymous, id)
        .await?
        .filter(Product::is_listable)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;
    Ok(Json(product))
}
