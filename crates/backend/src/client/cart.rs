//! Cart line reads and writes.
//!
//! Cart rows are unique per `(account_id, product_id)`; adding a product a
//! second time upserts the row with the new quantity rather than appending
//! a duplicate line. Cart state is never cached.

use tracing::instrument;

use velora_core::{AccountId, CartLineId, ProductId};

use super::{AuthContext, BackendClient};
use crate::error::BackendError;
use crate::models::CartLine;

const CART_SELECT: &str = "*,product:products(*)";

#[derive(serde::Serialize)]
struct CartLineUpsert {
    account_id: AccountId,
    product_id: ProductId,
    quantity: u32,
}

#[derive(serde::Serialize)]
struct QuantityPatch {
    quantity: u32,
}

impl BackendClient {
    /// All cart lines for an account, with products joined in.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn cart_lines(
        &self,
        auth: &AuthContext,
        account_id: AccountId,
    ) -> Result<Vec<CartLine>, BackendError> {
        self.fetch_rows(
            auth,
            "cart_lines",
            &[
                ("select", CART_SELECT.to_string()),
                ("account_id", format!("eq.{account_id}")),
                ("order", "created_at.asc".to_string()),
            ],
        )
        .await
    }

    /// Insert or replace the cart line for `(account_id, product_id)`.
    ///
    /// The new quantity replaces any existing quantity; it is not summed.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert is rejected.
    #[instrument(skip(self), fields(account_id = %account_id, product_id = %product_id))]
    pub async fn upsert_cart_line(
        &self,
        auth: &AuthContext,
        account_id: AccountId,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, BackendError> {
        self.insert_one(
            auth,
            "cart_lines",
            &CartLineUpsert {
                account_id,
                product_id,
                quantity,
            },
            Some("account_id,product_id"),
        )
        .await
    }

    /// Set the quantity on an existing cart line.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the line does not exist (or
    /// belongs to another account under row-level policy).
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn set_cart_line_quantity(
        &self,
        auth: &AuthContext,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<CartLine, BackendError> {
        let mut updated: Vec<CartLine> = self
            .update_returning(
                auth,
                "cart_lines",
                &[("id", format!("eq.{line_id}"))],
                &QuantityPatch { quantity },
            )
            .await?;
        if updated.is_empty() {
            return Err(BackendError::NotFound(format!("cart line {line_id}")));
        }
        Ok(updated.swap_remove(0))
    }

    /// Remove one cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn delete_cart_line(
        &self,
        auth: &AuthContext,
        line_id: CartLineId,
    ) -> Result<(), BackendError> {
        self.delete_rows(auth, "cart_lines", &[("id", format!("eq.{line_id}"))])
            .await
    }

    /// Remove every cart line for an account (successful checkout).
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn clear_cart(
        &self,
        auth: &AuthContext,
        account_id: AccountId,
    ) -> Result<(), BackendError> {
        self.delete_rows(
            auth,
            "cart_lines",
            &[("account_id", format!("eq.{account_id}"))],
        )
        .await
    }
}
