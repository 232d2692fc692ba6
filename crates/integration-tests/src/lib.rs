//! Integration test harness for Velora.
//!
//! [`TestShop`] is a single in-memory double standing in for every external
//! collaborator at once: the cart and order tables of the managed backend
//! and the payment provider. The tests drive the real storefront services
//! against it, exercising whole buyer journeys without network or state
//! outside the process.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use velora_backend::BackendError;
use velora_backend::models::{
    CartLine, NewOrder, NewOrderLine, Order, OrderLine, OrderStatusPatch, Product,
};
use velora_core::{
    AccountId, CartLineId, Email, OrderId, OrderLineId, PaymentReference, ProductCategory,
    ProductId,
};
use velora_storefront::services::cart::{AccountContext, CartStore};
use velora_storefront::services::checkout::OrderStore;
use velora_storefront::services::payments::{PaymentError, PaymentGateway, PaymentOutcome};

/// A buyer context for one test.
#[must_use]
pub fn buyer() -> AccountContext {
    AccountContext {
        account_id: AccountId::generate(),
        email: Email::parse("ada@example.com").expect("valid email"),
        access_token: "test-token".to_string(),
    }
}

/// A catalog product with the given name, price, category and tags.
#[must_use]
pub fn catalog_product(
    name: &str,
    price: u32,
    category: ProductCategory,
    tags: &[&str],
) -> Product {
    Product {
        id: ProductId::generate(),
        name: name.to_string(),
        description: String::new(),
        price: Decimal::from(price),
        category,
        brand: "Velora".to_string(),
        image_url: String::new(),
        images: vec![],
        stock_quantity: 10,
        is_active: true,
        tags: tags.iter().map(ToString::to_string).collect(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// In-memory stand-in for every collaborator the storefront talks to.
pub struct TestShop {
    products: Mutex<Vec<Product>>,
    cart_lines: Mutex<Vec<CartLine>>,
    orders: Mutex<Vec<Order>>,
    order_lines: Mutex<Vec<OrderLine>>,
    payment_outcome: Mutex<PaymentOutcome>,
    fail_cart_mutations: AtomicBool,
}

impl Default for TestShop {
    fn default() -> Self {
        Self {
            products: Mutex::new(vec![]),
            cart_lines: Mutex::new(vec![]),
            orders: Mutex::new(vec![]),
            order_lines: Mutex::new(vec![]),
            payment_outcome: Mutex::new(PaymentOutcome::Succeeded),
            fail_cart_mutations: AtomicBool::new(false),
        }
    }
}

impl TestShop {
    /// Add a product to the shop's catalog, returning its id.
    pub fn stock(&self, product: Product) -> ProductId {
        let id = product.id;
        self.products.lock().expect("lock").push(product);
        id
    }

    /// Snapshot of the full catalog.
    #[must_use]
    pub fn catalog(&self) -> Vec<Product> {
        self.products.lock().expect("lock").clone()
    }

    /// Script what the payment provider reports for every verification.
    pub fn set_payment_outcome(&self, outcome: PaymentOutcome) {
        *self.payment_outcome.lock().expect("lock") = outcome;
    }

    /// Make every subsequent cart mutation fail.
    pub fn break_cart_store(&self) {
        self.fail_cart_mutations.store(true, Ordering::SeqCst);
    }

    /// All recorded orders.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.orders.lock().expect("lock").clone()
    }

    /// Recorded lines for one order.
    #[must_use]
    pub fn order_lines(&self, order_id: OrderId) -> Vec<OrderLine> {
        self.order_lines
            .lock()
            .expect("lock")
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect()
    }

    fn check_cart_store(&self) -> Result<(), BackendError> {
        if self.fail_cart_mutations.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 503,
                message: "induced failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for TestShop {
    async fn lines(&self, ctx: &AccountContext) -> Result<Vec<CartLine>, BackendError> {
        Ok(self
            .cart_lines
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
        self.check_cart_store()?;
        let joined = self
            .products
            .lock()
            .expect("lock")
            .iter()
            .find(|p| p.id == product_id)
            .cloned();

        let mut lines = self.cart_lines.lock().expect("lock");
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
        self.check_cart_store()?;
        let mut lines = self.cart_lines.lock().expect("lock");
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
        self.check_cart_store()?;
        self.cart_lines
            .lock()
            .expect("lock")
            .retain(|l| l.id != line_id);
        Ok(())
    }

    async fn clear(&self, ctx: &AccountContext) -> Result<(), BackendError> {
        self.check_cart_store()?;
        self.cart_lines
            .lock()
            .expect("lock")
            .retain(|l| l.account_id != ctx.account_id);
        Ok(())
    }
}

#[async_trait]
impl OrderStore for TestShop {
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
        let mut stored = self.order_lines.lock().expect("lock");
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

#[async_trait]
impl PaymentGateway for TestShop {
    async fn verify(&self, _reference: &PaymentReference) -> Result<PaymentOutcome, PaymentError> {
        Ok(self.payment_outcome.lock().expect("lock").clone())
    }
}
