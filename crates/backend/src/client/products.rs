//! Catalog reads and administrative product writes.

use tracing::{debug, instrument};

use velora_core::{ProductCategory, ProductId};

use super::{AuthContext, BackendClient};
use crate::error::BackendError;
use crate::models::{NewProduct, Product, ProductPatch};

/// Filters for a catalog listing.
#[derive(Debug, Clone, Default)]
pub struct ProductListing {
    /// Restrict to one category.
    pub category: Option<ProductCategory>,
    /// Case-insensitive substring match on the product name.
    pub search: Option<String>,
    /// When set, include inactive and out-of-stock rows (admin views).
    pub include_unlisted: bool,
}

impl BackendClient {
    /// List catalog products.
    ///
    /// Unfiltered active listings are cached for 5 minutes; filtered and
    /// admin reads go straight to the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        auth: &AuthContext,
        listing: &ProductListing,
    ) -> Result<Vec<Product>, BackendError> {
        let cacheable =
            !listing.include_unlisted && listing.category.is_none() && listing.search.is_none();

        if cacheable
            && let Some(products) = self.catalog_cache().get("products:listable").await
        {
            debug!("cache hit for catalog listing");
            return Ok(products);
        }

        let mut query: Vec<(&str, String)> = vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if !listing.include_unlisted {
            query.push(("is_active", "eq.true".to_string()));
            query.push(("stock_quantity", "gt.0".to_string()));
        }
        if let Some(category) = listing.category {
            query.push(("category", format!("eq.{category}")));
        }
        if let Some(search) = &listing.search {
            query.push(("name", format!("ilike.*{search}*")));
        }

        let products: Vec<Product> = self.fetch_rows(auth, "products", &query).await?;

        if cacheable {
            self.catalog_cache()
                .insert("products:listable".to_string(), products.clone())
                .await;
        }

        Ok(products)
    }

    /// Fetch one product by id, listable or not.
    ///
    /// Historical order lines reference deactivated products, so this does
    /// not filter on `is_active`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product(
        &self,
        auth: &AuthContext,
        product_id: ProductId,
    ) -> Result<Option<Product>, BackendError> {
        self.fetch_optional(
            auth,
            "products",
            &[
                ("select", "*".to_string()),
                ("id", format!("eq.{product_id}")),
            ],
        )
        .await
    }

    /// Insert a new catalog entry (admin).
    ///
    /// # Errors
    ///
    /// Returns an error if the insert is rejected.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn insert_product(
        &self,
        auth: &AuthContext,
        product: &NewProduct,
    ) -> Result<Product, BackendError> {
        let inserted = self.insert_one(auth, "products", product, None).await?;
        self.invalidate_catalog().await;
        Ok(inserted)
    }

    /// Apply a partial update to a catalog entry (admin).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row matched, or another
    /// variant if the update fails.
    #[instrument(skip(self, patch), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        auth: &AuthContext,
        product_id: ProductId,
        patch: &ProductPatch,
    ) -> Result<Product, BackendError> {
        let mut updated: Vec<Product> = self
            .update_returning(
                auth,
                "products",
                &[("id", format!("eq.{product_id}"))],
                patch,
            )
            .await?;
        self.invalidate_catalog().await;
        if updated.is_empty() {
            return Err(BackendError::NotFound(format!("product {product_id}")));
        }
        Ok(updated.swap_remove(0))
    }

    /// Drop cached catalog listings after a product mutation.
    async fn invalidate_catalog(&self) {
        self.catalog_cache().invalidate_all();
        self.catalog_cache().run_pending_tasks().await;
    }
}
