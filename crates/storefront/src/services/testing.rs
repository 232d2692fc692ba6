//! In-memory doubles for the store and gateway seams, shared across the
//! service unit tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use velora_backend::models::{
    CartLine, NewOrder, NewOrderLine, Order, OrderLine, OrderStatusPatch, Product,
};
use velora_backend::BackendError;
use velora_core::{
    AccountId, CartLineId, Email, OrderId, OrderLineId, PaymentReference, ProductCategory,
    ProductId,
};

use super::cart::{AccountContext, CartStore};
use super::checkout::OrderStore;
use super::payments::{PaymentError, PaymentGateway, PaymentOutcome};

pub fn account_context() -> AccountContext {
    AccountContext {
        account_id: AccountId::generate(),
        email: Email::parse("ada@example.com").expect("valid email"),
        access_token: "test-token".to_string(),
    }
}

pub fn product(name: &str, price: u32) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_string(),
        description: String::new(),
        price: Decimal::from(price),
        category: ProductCategory::Skincare,
        brand: "Velora".to_string(),
        image_url: String::new(),
        images: vec![],
        stock_quantity: 10,
        is_active: true,
        tags: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn induced_failure() -> BackendError {
    BackendError::Api {
        status: 503,
        message: "induced failure".to_string(),
    }
}

/// Cart store double backed by vectors, with an optional one-shot failure.
#[derive(Default)]
pub struct InMemoryCartStore {
    products: Mutex<Vec<Product>>,
    lines: Mutex<Vec<CartLine>>,
    fail_next: AtomicBool,
}

impl InMemoryCartStore {
    pub fn stock_product(&self, product: Product) {
        self.products.lock().expect("lock").push(product);
    }

    pub fn product_ids(&self) -> Vec<ProductId> {
        self.products
            .lock()
            .expect("lock")
            .iter()
            .map(|p| p.id)
            .collect()
    }

    /// Make the next mutating call fail once.
    pub fn fail_next_mutation(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn check_induced_failure(&self) -> Result<(), BackendError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(induced_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn lines(&self, ctx: &AccountContext) -> Result<Vec<CartLine>, BackendError> {
        Ok(self
            .lines
            .lock()
            .expect("lock")
            .iter()
            .filter(|l| l.account_id == ctx.account_id)
            .cloned()
            .collect())
    }

    async fn upsert_line(
        &self,
        ctx: &AccountContext,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<CartLine, BackendError> {
        self.check_induced_failure()?;
        let joined = self
            .products
            .lock()
            .expect("lock")
            .iter()
            .find(|p| p.id == product_id)
            .cloned();

        let mut lines = self.lines.lock().expect("lock");
        if let Some(line) = lines
            .iter_mut()
            .find(|l| l.account_id == ctx.account_id && l.product_id == product_id)
        {
            line.quantity = quantity;
            line.product = joined;
            return Ok(line.clone());
        }

        let line = CartLine {
            id: CartLineId::generate(),
            account_id: ctx.account_id,
            product_id,
            quantity,
            created_at: Utc::now(),
            product: joined,
        };
        lines.push(line.clone());
        Ok(line)
    }

    async fn set_quantity(
        &self,
        _ctx: &AccountContext,
        line_id: CartLineId,
        quantity: u32,
    ) -> Result<CartLine, BackendError> {
        self.check_induced_failure()?;
        let mut lines = self.lines.lock().expect("lock");
        let line = lines
            .iter_mut()
            .find(|l| l.id == line_id)
            .ok_or_else(|| BackendError::NotFound(format!("cart line {line_id}")))?;
        line.quantity = quantity;
        Ok(line.clone())
    }

    async fn remove_line(
        &self,
        _ctx: &AccountContext,
        line_id: CartLineId,
    ) -> Result<(), BackendError> {
        self.check_induced_failure()?;
        self.lines.lock().expect("lock").retain(|l| l.id != line_id);
        Ok(())
    }

    async fn clear(&self, ctx: &AccountContext) -> Result<(), BackendError> {
        self.check_induced_failure()?;
        self.lines
            .lock()
            .expect("lock")
            .retain(|l| l.account_id != ctx.account_id);
        Ok(())
    }
}

/// Order store double keeping orders and lines in vectors.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<Vec<Order>>,
    lines: Mutex<Vec<OrderLine>>,
    fail_status_updates: AtomicBool,
}

impl InMemoryOrderStore {
    pub fn all_orders(&self) -> Vec<Order> {
        self.orders.lock().expect("lock").clone()
    }

    /// Make every `update_order_status` call fail.
    pub fn fail_status_updates(&self) {
        self.fail_status_updates.store(true, Ordering::SeqCst);
    }

    pub fn lines_for(&self, order_id: OrderId) -> Vec<OrderLine> {
        self.lines
            .lock()
            .expect("lock")
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert_order(
        &self,
        _ctx: &AccountContext,
        order: &NewOrder,
    ) -> Result<Order, BackendError> {
        let mut orders = self.orders.lock().expect("lock");
        if orders
            .iter()
            .any(|o| o.payment_reference == order.payment_reference)
        {
            return Err(BackendError::Conflict(format!(
                "payment reference {}",
                order.payment_reference
            )));
        }
        let row = Order {
            id: OrderId::generate(),
            account_id: order.account_id,
            total_amount: order.total_amount,
            status: order.status,
            payment_status: order.payment_status,
            payment_reference: order.payment_reference.clone(),
            shipping_address: order.shipping_address.clone(),
            tracking_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            order_lines: None,
        };
        orders.push(row.clone());
        Ok(row)
    }

    async fn insert_order_lines(
        &self,
        _ctx: &AccountContext,
        lines: &[NewOrderLine],
    ) -> Result<Vec<OrderLine>, BackendError> {
        let mut stored = self.lines.lock().expect("lock");
        let rows: Vec<OrderLine> = lines
            .iter()
            .map(|line| OrderLine {
                id: OrderLineId::generate(),
                order_id: line.order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price: line.price,
                created_at: Utc::now(),
                product: None,
            })
            .collect();
        stored.extend(rows.clone());
        Ok(rows)
    }

    async fn order_by_reference(
        &self,
        _ctx: &AccountContext,
        reference: &PaymentReference,
    ) -> Result<Option<Order>, BackendError> {
        Ok(self
            .orders
            .lock()
            .expect("lock")
            .iter()
            .find(|o| &o.payment_reference == reference)
            .cloned())
    }

    async fn update_order_status(
        &self,
        _ctx: &AccountContext,
        order_id: OrderId,
        patch: &OrderStatusPatch,
    ) -> Result<Order, BackendError> {
        if self.fail_status_updates.load(Ordering::SeqCst) {
            return Err(induced_failure());
        }
        let mut orders = self.orders.lock().expect("lock");
        let order = orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or_else(|| BackendError::NotFound(format!("order {order_id}")))?;
        if let Some(status) = patch.status {
            order.status = status;
        }
        if let Some(payment_status) = patch.payment_status {
            order.payment_status = payment_status;
        }
        if let Some(tracking) = &patch.tracking_number {
            order.tracking_number = Some(tracking.clone());
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }
}

/// Gateway double returning one fixed verification outcome.
pub struct StaticGateway {
    outcome: PaymentOutcome,
}

impl StaticGateway {
    pub fn succeeding() -> Self {
        Self {
            outcome: PaymentOutcome::Succeeded,
        }
    }

    pub fn declining(reason: &str) -> Self {
        Self {
            outcome: PaymentOutcome::Failed {
                reason: reason.to_string(),
            },
        }
    }

    pub fn abandoned() -> Self {
        Self {
            outcome: PaymentOutcome::Abandoned,
        }
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    async fn verify(&self, _reference: &PaymentReference) -> Result<PaymentOutcome, PaymentError> {
        Ok(self.outcome.clone())
    }
}
