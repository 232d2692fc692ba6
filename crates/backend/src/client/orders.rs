//! Order and order-line persistence.

use tracing::instrument;

use velora_core::{AccountId, FulfillmentStatus, OrderId, PaymentReference};

use super::{AuthContext, BackendClient};
use crate::error::BackendError;
use crate::models::{NewOrder, NewOrderLine, Order, OrderLine, OrderStatusPatch};

const ORDER_SELECT: &str = "*,order_lines(*,product:products(*))";

/// Filters for an administrative order listing.
#[derive(Debug, Clone, Default)]
pub struct OrderListing {
    /// Restrict to one fulfillment status.
    pub status: Option<FulfillmentStatus>,
    /// Restrict to abandoned checkout attempts (pending/pending).
    pub abandoned_only: bool,
}

impl BackendClient {
    /// Persist a new order row.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Conflict`] if the payment reference collides
    /// with an existing order, or another variant if the insert fails.
    #[instrument(skip(self, order), fields(reference = %order.payment_reference))]
    pub async fn insert_order(
        &self,
        auth: &AuthContext,
        order: &NewOrder,
    ) -> Result<Order, BackendError> {
        self.insert_one(auth, "orders", order, None).await
    }

    /// Persist the order lines for a checkout attempt in one call.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails. The caller's order row is left
    /// as-is; orphan cleanup is out of scope.
    #[instrument(skip(self, lines), fields(count = lines.len()))]
    pub async fn insert_order_lines(
        &self,
        auth: &AuthContext,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, BackendError> {
        self.insert_returning(auth, "order_lines", lines, None).await
    }

    /// Apply a status patch to one order.
    ///
    /// The backend stores whatever it is told; transition legality is the
    /// caller's responsibility (`FulfillmentStatus::can_transition_to`).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if no row matched.
    #[instrument(skip(self, patch), fields(order_id = %order_id))]
    pub async fn update_order_status(
        &self,
        auth: &AuthContext,
        order_id: OrderId,
        patch: &OrderStatusPatch,
    ) -> Result<Order, BackendError> {
        let mut updated: Vec<Order> = self
            .update_returning(auth, "orders", &[("id", format!("eq.{order_id}"))], patch)
            .await?;
        if updated.is_empty() {
            return Err(BackendError::NotFound(format!("order {order_id}")));
        }
        Ok(updated.swap_remove(0))
    }

    /// One order with its lines and their product snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn order(
        &self,
        auth: &AuthContext,
        order_id: OrderId,
    ) -> Result<Option<Order>, BackendError> {
        self.fetch_optional(
            auth,
            "orders",
            &[
                ("select", ORDER_SELECT.to_string()),
                ("id", format!("eq.{order_id}")),
            ],
        )
        .await
    }

    /// Look up the order created for a checkout attempt by its payment
    /// reference. References are unique per attempt so at most one row
    /// matches.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self), fields(reference = %reference))]
    pub async fn order_by_reference(
        &self,
        auth: &AuthContext,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, BackendError> {
        self.fetch_optional(
            auth,
            "orders",
            &[
                ("select", ORDER_SELECT.to_string()),
                ("payment_reference", format!("eq.{reference}")),
            ],
        )
        .await
    }

    /// A buyer's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self), fields(account_id = %account_id))]
    pub async fn orders_for_account(
        &self,
        auth: &AuthContext,
        account_id: AccountId,
    ) -> Result<Vec<Order>, BackendError> {
        self.fetch_rows(
            auth,
            "orders",
            &[
                ("select", ORDER_SELECT.to_string()),
                ("account_id", format!("eq.{account_id}")),
                ("order", "created_at.desc".to_string()),
            ],
        )
        .await
    }

    /// Administrative order listing across all accounts.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        auth: &AuthContext,
        listing: &OrderListing,
    ) -> Result<Vec<Order>, BackendError> {
        let mut query: Vec<(&str, String)> = vec![
            ("select", ORDER_SELECT.to_string()),
            ("order", "created_at.desc".to_string()),
        ];
        if listing.abandoned_only {
            query.push(("status", "eq.pending".to_string()));
            query.push(("payment_status", "eq.pending".to_string()));
        } else if let Some(status) = listing.status {
            query.push(("status", format!("eq.{status}")));
        }

        self.fetch_rows(auth, "orders", &query).await
    }
}
