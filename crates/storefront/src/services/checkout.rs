//! Two-phase checkout.
//!
//! `begin` records the attempt (a pending/pending order plus its line
//! snapshots) and hands back the payload the hosted card widget needs.
//! `complete` runs after the widget reports back: it verifies the
//! transaction server-side by reference and reconciles the order, never
//! trusting the client-reported result.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::{instrument, warn};

use velora_backend::models::{NewOrder, NewOrderLine, Order, OrderLine, OrderStatusPatch};
use velora_backend::{BackendClient, BackendError};
use velora_core::{
    CartLineId, CurrencyCode, FulfillmentStatus, OrderId, PaymentReference, PaymentStatus, Price,
};

use super::cart::{AccountContext, CartAggregate, CartStore};
use super::payments::{
    PaymentError, PaymentGateway, PaymentOutcome, WidgetInvocation, generate_payment_reference,
};

/// Flat delivery fee added to every order total.
#[must_use]
pub fn shipping_fee() -> Decimal {
    Decimal::from(2000)
}

/// Errors from either checkout phase.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cannot check out an empty cart")]
    EmptyCart,

    #[error("a shipping address is required")]
    MissingShippingAddress,

    /// The cart holds lines whose products no longer resolve. The buyer
    /// must remove them before retrying.
    #[error("cart contains unavailable products")]
    UnavailableProducts(Vec<CartLineId>),

    /// The payment provider's public key is not configured; checkout is
    /// disabled rather than silently degraded.
    #[error("payment provider is not configured")]
    NotConfigured,

    /// No checkout attempt matches the verified reference.
    #[error("no checkout attempt found for reference {0}")]
    UnknownReference(PaymentReference),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Remote(#[from] BackendError),
}

/// Seam between the orchestrator and order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(
        &self,
        ctx: &AccountContext,
        order: &NewOrder,
    ) -> Result<Order, BackendError>;

    async fn insert_order_lines(
        &self,
        ctx: &AccountContext,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, BackendError>;

    async fn order_by_reference(
        &self,
        ctx: &AccountContext,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, BackendError>;

    async fn update_order_status(
        &self,
        ctx: &AccountContext,
        order_id: OrderId,
        patch: &OrderStatusPatch,
    ) -> Result<Order, BackendError>;
}

#[async_trait]
impl OrderStore for BackendClient {
    async fn insert_order(
        &self,
        ctx: &AccountContext,
        order: &NewOrder,
    ) -> Result<Order, BackendError> {
        BackendClient::insert_order(self, &ctx.backend_auth(), order).await
    }

    async fn insert_order_lines(
        &self,
        ctx: &AccountContext,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, BackendError> {
        BackendClient::insert_order_lines(self, &ctx.backend_auth(), lines).await
    }

    async fn order_by_reference(
        &self,
        ctx: &AccountContext,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, BackendError> {
        BackendClient::order_by_reference(self, &ctx.backend_auth(), reference).await
    }

    async fn update_order_status(
        &self,
        ctx: &AccountContext,
        order_id: OrderId,
        patch: &OrderStatusPatch,
    ) -> Result<Order, BackendError> {
        BackendClient::update_order_status(self, &ctx.backend_auth(), order_id, patch).await
    }
}

/// Result of `begin`: the recorded attempt and the widget payload.
#[derive(Debug, Serialize)]
pub struct BeganCheckout {
    pub order: Order,
    pub widget: WidgetInvocation,
}

/// Result of `complete`, after server-side verification.
#[derive(Debug, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CheckoutCompletion {
    /// Payment confirmed; the order moved to paid/processing and the cart
    /// was emptied.
    Confirmed { order: Order },
    /// The provider reported a decline. The cart is kept so the buyer can
    /// retry.
    Declined { order: Order, reason: String },
    /// The widget was dismissed without a charge. Nothing changes; the
    /// attempt stays visible as an abandoned order.
    StillPending { order: Order },
}

/// Drives a checkout attempt across cart, order store and payment gateway.
pub struct CheckoutOrchestrator<'a> {
    orders: &'a dyn OrderStore,
    carts: &'a dyn CartStore,
    gateway: &'a dyn PaymentGateway,
    public_key: Option<&'a str>,
    currency: CurrencyCode,
}

impl<'a> CheckoutOrchestrator<'a> {
    pub fn new(
        orders: &'a dyn OrderStore,
        carts: &'a dyn CartStore,
        gateway: &'a dyn PaymentGateway,
        public_key: Option<&'a str>,
        currency: CurrencyCode,
    ) -> Self {
        Self {
            orders,
            carts,
            gateway,
            public_key,
            currency,
        }
    }

    /// Record a checkout attempt and build the widget invocation.
    ///
    /// The order is inserted first, then its lines. A line insert failure
    /// surfaces as an error and leaves the order row behind as a visible
    /// orphan; it is never retried under the same reference.
    ///
    /// # Errors
    ///
    /// See [`CheckoutError`]; entry conditions are checked before anything
    /// is persisted.
    #[instrument(skip_all, fields(account_id = %ctx.account_id))]
    pub async fn begin(
        &self,
        ctx: &AccountContext,
        cart: &CartAggregate,
        shipping_address: &str,
    ) -> Result<BeganCheckout, CheckoutError> {
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let shipping_address = shipping_address.trim();
        if shipping_address.is_empty() {
            return Err(CheckoutError::MissingShippingAddress);
        }
        let unavailable = cart.unavailable_line_ids();
        if !unavailable.is_empty() {
            return Err(CheckoutError::UnavailableProducts(unavailable));
        }
        let Some(public_key) = self.public_key else {
            return Err(CheckoutError::NotConfigured);
        };

        let reference = generate_payment_reference();
        let total = cart.total() + shipping_fee();

        let order = self
            .orders
            .insert_order(
                ctx,
                &NewOrder {
                    account_id: ctx.account_id,
                    total_amount: total,
                    status: FulfillmentStatus::Pending,
                    payment_status: PaymentStatus::Pending,
                    payment_reference: reference.clone(),
                    shipping_address: shipping_address.to_string(),
                },
            )
            .await?;

        let lines: Vec<NewOrderLine> = cart
            .lines()
            .iter()
            .filter_map(|line| {
                line.product.as_ref().map(|product| NewOrderLine {
                    order_id: order.id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    price: product.price,
                })
            })
            .collect();
        self.orders.insert_order_lines(ctx, &lines).await?;

        let widget = WidgetInvocation::new(
            public_key.to_string(),
            ctx.email.clone(),
            Price {
                amount: total,
                currency_code: self.currency,
            },
            reference,
        );

        Ok(BeganCheckout { order, widget })
    }

    /// Reconcile a checkout attempt after the widget reported back.
    ///
    /// The transaction is verified with the provider by reference; the
    /// client's claimed result is ignored. Calling this twice for a
    /// confirmed payment is a no-op.
    ///
    /// # Errors
    ///
    /// `UnknownReference` when no attempt matches, `Payment` when
    /// verification itself fails, `Remote` when the attempt lookup fails.
    #[instrument(skip(self, ctx), fields(reference = %reference))]
    pub async fn complete(
        &self,
        ctx: &AccountContext,
        reference: &PaymentReference,
    ) -> Result<CheckoutCompletion, CheckoutError> {
        let outcome = self.gateway.verify(reference).await?;

        let order = self
            .orders
            .order_by_reference(ctx, reference)
            .await?
            .ok_or_else(|| CheckoutError::UnknownReference(reference.clone()))?;

        match outcome {
            PaymentOutcome::Succeeded => {
                if !order.payment_status.can_transition_to(PaymentStatus::Paid) {
                    // Repeat callback for an already-settled attempt
                    return Ok(CheckoutCompletion::Confirmed { order });
                }
                // The provider already captured the money. A failed status
                // patch leaves the order pending until a later callback or
                // an operator reconciles it; it must not fail the call.
                let order = match self
                    .orders
                    .update_order_status(
                        ctx,
                        order.id,
                        &OrderStatusPatch {
                            status: Some(FulfillmentStatus::Processing),
                            payment_status: Some(PaymentStatus::Paid),
                            tracking_number: None,
                        },
                    )
                    .await
                {
                    Ok(updated) => updated,
                    Err(error) => {
                        warn!(%error, order_id = %order.id, "status update failed after captured payment");
                        order
                    }
                };

                // The order is already paid; a cart that fails to clear is
                // an annoyance, not a lost sale.
                if let Err(error) = self.carts.clear(ctx).await {
                    warn!(%error, order_id = %order.id, "cart clear failed after paid checkout");
                }

                Ok(CheckoutCompletion::Confirmed { order })
            }
            PaymentOutcome::Failed { reason } => {
                let order = if order.payment_status.can_transition_to(PaymentStatus::Failed) {
                    self.orders
                        .update_order_status(
                            ctx,
                            order.id,
                            &OrderStatusPatch {
                                status: None,
                                payment_status: Some(PaymentStatus::Failed),
                                tracking_number: None,
                            },
                        )
                        .await?
                } else {
                    order
                };
                Ok(CheckoutCompletion::Declined { order, reason })
            }
            PaymentOutcome::Abandoned => Ok(CheckoutCompletion::StillPending { order }),
        }
    }
}
