//! Catalog management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use velora_backend::ProductListing;
use velora_backend::models::{NewProduct, Product, ProductPatch};
use velora_core::{ProductCategory, ProductId};

use crate::error::{AdminError, Result};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<ProductCategory>,
    pub search: Option<String>,
}

/// `GET /api/products` - full catalog, including inactive and out-of-stock
/// rows.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<Vec<Product>>> {
    let listing = ProductListing {
        category: query.category,
        search: query.search.filter(|s| !s.trim().is_empty()),
        include_unlisted: true,
    };
    let products = state
        .backend()
        .list_products(&state.auth(), &listing)
        .await?;
    Ok(Json(products))
}

/// `GET /api/products/{id}` - one row, listable or not.
pub async fn detail(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Product>> {
    let product = state
        .backend()
        .product(&state.auth(), product_id)
        .await?
        .ok_or_else(|| AdminError::NotFound(format!("product {product_id}")))?;
    Ok(Json(product))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    Json(product): Json<NewProduct>,
) -> Result<Json<Product>> {
    if product.name.trim().is_empty() {
        return Err(AdminError::BadRequest("name is required".to_string()));
    }
    if product.price <= Decimal::ZERO {
        return Err(AdminError::BadRequest("price must be positive".to_string()));
    }

    let created = state
        .backend()
        .insert_product(&state.auth(), &product)
        .await?;
    Ok(Json(created))
}

/// `PATCH /api/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>> {
    if let Some(price) = patch.price
        && price <= Decimal::ZERO
    {
        return Err(AdminError::BadRequest("price must be positive".to_string()));
    }

    let updated = state
        .backend()
        .update_product(&state.auth(), product_id, &patch)
        .await?;
    Ok(Json(updated))
}

/// `DELETE /api/products/{id}`
///
/// Deactivation, not deletion: historical order lines keep referencing
/// the row.
pub async fn deactivate(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Product>> {
    let patch = ProductPatch {
        is_active: Some(false),
        ..ProductPatch::default()
    };
    let updated = state
        .backend()
        .update_product(&state.auth(), product_id, &patch)
        .await?;
    Ok(Json(updated))
}
