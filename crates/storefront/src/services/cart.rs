//! The buyer's cart: an in-memory aggregate synchronized with the remote store.
//!
//! Every mutating call persists to the store synchronously and only then
//! applies the same change locally. On a store failure the local snapshot
//! is left untouched, so the caller never sees an optimistic mutation that
//! the backend did not confirm.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use velora_backend::models::CartLine;
use velora_backend::{AuthContext, BackendClient, BackendError};
use velora_core::{AccountId, CartLineId, Email, ProductId};

/// Explicit per-request account context.
///
/// Passed into every component operation instead of an ambient "current
/// user" lookup; keeps the orchestrator and filters independently testable.
#[derive(Debug, Clone)]
pub struct AccountContext {
    pub account_id: AccountId,
    pub email: Email,
    pub access_token: String,
}

impl AccountContext {
    pub(crate) fn backend_auth(&self) -> AuthContext {
        AuthContext::User(self.access_token.clone())
    }
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be at least 1 when adding a line.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// The remote store rejected or failed the mutation; local state is
    /// unchanged.
    #[error(transparent)]
    Remote(#[from] BackendError),
}

/// Seam between the cart aggregate and the remote table store.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn lines(&self, ctx: &AccountContext) -> Result<Vec<CartLine>, BackendError>;

    /// Insert or replace the `(account, product)` line with the new quantity.
    async fn upsert_line(
        &self,
        ctx: &AccountContext,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, BackendError>;

    async fn set_quantity(
        &self,
        ctx: &AccountContext,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<CartLine, BackendError>;

    async fn remove_line(
        &self,
        ctx: &AccountContext,
        line_id: CartLineId,
    ) -> Result<(), BackendError>;

    async fn clear(&self, ctx: &AccountContext) -> Result<(), BackendError>;
}

#[async_trait]
impl CartStore for BackendClient {
    async fn lines(&self, ctx: &AccountContext) -> Result<Vec<CartLine>, BackendError> {
        self.cart_lines(&ctx.backend_auth(), ctx.account_id).await
    }

    async fn upsert_line(
        &self,
        ctx: &AccountContext,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, BackendError> {
        self.upsert_cart_line(&ctx.backend_auth(), ctx.account_id, product_id, quantity)
            .await
    }

    async fn set_quantity(
        &self,
        ctx: &AccountContext,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<CartLine, BackendError> {
        self.set_cart_line_quantity(&ctx.backend_auth(), line_id, quantity)
            .await
    }

    async fn remove_line(
        &self,
        ctx: &AccountContext,
        line_id: CartLineId,
    ) -> Result<(), BackendError> {
        self.delete_cart_line(&ctx.backend_auth(), line_id).await
    }

    async fn clear(&self, ctx: &AccountContext) -> Result<(), BackendError> {
        self.clear_cart(&ctx.backend_auth(), ctx.account_id).await
    }
}

/// Cart display data returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: u32,
    /// Lines whose product no longer resolves (deleted or deactivated).
    /// They contribute 0 to the subtotal and the UI should offer removal
    /// rather than hiding the discrepancy.
    pub unavailable_line_ids: Vec<CartLineId>,
}

/// In-memory snapshot of one account's cart.
#[derive(Debug, Clone, Default)]
pub struct CartAggregate {
    lines: Vec<CartLine>,
}

impl CartAggregate {
    /// Load the aggregate from the remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store read fails.
    pub async fn load(store: &dyn CartStore, ctx: &AccountContext) -> Result<Self, CartError> {
        Ok(Self {
            lines: store.lines(ctx).await?,
        })
    }

    /// Build an aggregate from already-fetched lines.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        Self { lines }
    }

    /// Add a product to the cart.
    ///
    /// If a line for the product already exists its quantity is replaced by
    /// `quantity` (upsert-by-unique-key), not summed.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity` for `quantity == 0`; `Remote` if persistence fails
    /// (local state unchanged).
    #[instrument(skip(self, store, ctx), fields(product_id = %product_id))]
    pub async fn add_line(
        &mut self,
        store: &dyn CartStore,
        ctx: &AccountContext,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }

        let persisted = store.upsert_line(ctx, product_id, quantity).await?;

        match self.lines.iter_mut().find(|l| l.product_id == product_id) {
            Some(line) => *line = persisted,
            None => self.lines.push(persisted),
        }
        Ok(())
    }

    /// Set the quantity on a line. Zero is equivalent to removal.
    ///
    /// # Errors
    ///
    /// `Remote` if persistence fails (local state unchanged).
    #[instrument(skip(self, store, ctx), fields(line_id = %line_id))]
    pub async fn set_quantity(
        &mut self,
        store: &dyn CartStore,
        ctx: &AccountContext,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove_line(store, ctx, line_id).await;
        }

        let persisted = store.set_quantity(ctx, line_id, quantity).await?;
        if let Some(line) = self.lines.iter_mut().find(|l| l.id == line_id) {
            *line = persisted;
        }
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// `Remote` if persistence fails (local state unchanged).
    #[instrument(skip(self, store, ctx), fields(line_id = %line_id))]
    pub async fn remove_line(
        &mut self,
        store: &dyn CartStore,
        ctx: &AccountContext,
        line_id: CartLineId,
    ) -> Result<(), CartError> {
        store.remove_line(ctx, line_id).await?;
        self.lines.retain(|l| l.id != line_id);
        Ok(())
    }

    /// Empty the cart (successful checkout or explicit clear).
    ///
    /// # Errors
    ///
    /// `Remote` if persistence fails (local state unchanged).
    #[instrument(skip_all)]
    pub async fn clear(
        &mut self,
        store: &dyn CartStore,
        ctx: &AccountContext,
    ) -> Result<(), CartError> {
        store.clear(ctx).await?;
        self.lines.clear();
        Ok(())
    }

    /// Sum of `product.price × quantity` over resolvable lines.
    ///
    /// A line whose product failed to resolve contributes 0; see
    /// [`Self::unavailable_line_ids`] for the flag the UI surfaces.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| {
                line.product
                    .as_ref()
                    .filter(|p| p.is_active)
                    .map_or(Decimal::ZERO, |p| p.price * Decimal::from(line.quantity))
            })
            .sum()
    }

    /// Lines whose product is deleted or deactivated.
    #[must_use]
    pub fn unavailable_line_ids(&self) -> Vec<CartLineId> {
        self.lines
            .iter()
            .filter(|line| line.product.as_ref().is_none_or(|p| !p.is_active))
            .map(|line| line.id)
            .collect()
    }

    /// The current line snapshot.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// True when the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Display data for the client.
    #[must_use]
    pub fn view(&self) -> CartView {
        CartView {
            subtotal: self.total(),
            item_count: self.lines.iter().map(|l| l.quantity).sum(),
            unavailable_line_ids: self.unavailable_line_ids(),
            lines: self.lines.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{InMemoryCartStore, account_context, product};

    #[tokio::test]
    async fn test_add_line_is_idempotent_by_product() {
        let store = InMemoryCartStore::default();
        store.stock_product(product("Serum", 5000));
        let ctx = account_context();
        let product_id = store.product_ids()[0];

        let mut cart = CartAggregate::default();
        cart.add_line(&store, &ctx, product_id, 2).await.expect("add");
        cart.add_line(&store, &ctx, product_id, 5).await.expect("re-add");

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_set_quantity_zero_equals_remove() {
        let store = InMemoryCartStore::default();
        store.stock_product(product("Serum", 5000));
        store.stock_product(product("Balm", 3000));
        let ctx = account_context();
        let ids = store.product_ids();

        let mut by_set = CartAggregate::default();
        by_set.add_line(&store, &ctx, ids[0], 1).await.expect("add");
        by_set.add_line(&store, &ctx, ids[1], 2).await.expect("add");
        let line_id = by_set.lines()[0].id;
        by_set
            .set_quantity(&store, &ctx, line_id, 0)
            .await
            .expect("set to zero");

        let mut by_remove = CartAggregate::from_lines(store.lines(&ctx).await.expect("lines"));
        // Re-add the removed line so both carts start identical, then remove
        by_remove
            .add_line(&store, &ctx, ids[0], 1)
            .await
            .expect("add");
        let line_id = by_remove
            .lines()
            .iter()
            .find(|l| l.product_id == ids[0])
            .expect("line")
            .id;
        by_remove
            .remove_line(&store, &ctx, line_id)
            .await
            .expect("remove");

        let product_ids =
            |cart: &CartAggregate| cart.lines().iter().map(|l| l.product_id).collect::<Vec<_>>();
        assert_eq!(product_ids(&by_set), product_ids(&by_remove));
        assert_eq!(product_ids(&by_set), vec![ids[1]]);
    }

    #[tokio::test]
    async fn test_unresolved_product_contributes_zero_and_is_flagged() {
        let store = InMemoryCartStore::default();
        store.stock_product(product("Serum", 5000));
        let ctx = account_context();
        let product_id = store.product_ids()[0];

        let mut cart = CartAggregate::default();
        cart.add_line(&store, &ctx, product_id, 2).await.expect("add");
        assert_eq!(cart.total(), Decimal::from(10000));

        // Simulate the product being deactivated after it was carted
        let mut lines = cart.lines().to_vec();
        if let Some(p) = lines.get_mut(0).and_then(|l| l.product.as_mut()) {
            p.is_active = false;
        }
        let cart = CartAggregate::from_lines(lines);

        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.unavailable_line_ids().len(), 1);
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_local_state_unchanged() {
        let store = InMemoryCartStore::default();
        store.stock_product(product("Serum", 5000));
        store.stock_product(product("Balm", 3000));
        let ctx = account_context();
        let ids = store.product_ids();

        let mut cart = CartAggregate::default();
        cart.add_line(&store, &ctx, ids[0], 2).await.expect("add");

        store.fail_next_mutation();
        let result = cart.add_line(&store, &ctx, ids[1], 1).await;
        assert!(matches!(result, Err(CartError::Remote(_))));

        // The failed mutation must not leak into the snapshot
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].product_id, ids[0]);
        assert_eq!(cart.total(), Decimal::from(10000));
    }

    #[tokio::test]
    async fn test_add_line_rejects_zero_quantity() {
        let store = InMemoryCartStore::default();
        store.stock_product(product("Serum", 5000));
        let ctx = account_context();
        let product_id = store.product_ids()[0];

        let mut cart = CartAggregate::default();
        let result = cart.add_line(&store, &ctx, product_id, 0).await;
        assert!(matches!(result, Err(CartError::InvalidQuantity)));
    }
}
