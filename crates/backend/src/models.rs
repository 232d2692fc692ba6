//! Typed row models for the managed table store.
//!
//! Field names match the backend's column names one-to-one so rows
//! round-trip through serde without rename indirection. Joined relations
//! (`product` on a cart line, `order_lines` on an order) are optional: they
//! are only populated when the read asked for them via `select`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use velora_core::{
    AccountId, CartLineId, Email, FulfillmentStatus, OrderId, OrderLineId, PaymentReference,
    PaymentStatus, PreferencesId, ProductCategory, ProductId, Role, SkinType,
};

/// Read-mostly projection of an identity owned by the auth collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Per-account preference record. One-to-one with [`Account`]; absence is
/// "no preference", never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    pub id: PreferencesId,
    pub account_id: AccountId,
    #[serde(default)]
    pub interests: Vec<String>,
    pub min_budget: Decimal,
    pub max_budget: Decimal,
    #[serde(default)]
    pub skin_type: Option<SkinType>,
    #[serde(default)]
    pub preferred_brands: Vec<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upsert payload for [`Preferences`], keyed on `account_id`.
#[derive(Debug, Clone, Serialize)]
pub struct PreferencesUpsert {
    pub account_id: AccountId,
    pub interests: Vec<String>,
    pub min_budget: Decimal,
    pub max_budget: Decimal,
    pub skin_type: Option<SkinType>,
    pub preferred_brands: Vec<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
}

/// Catalog entry. Mutated only through administrative action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: ProductCategory,
    pub brand: String,
    pub image_url: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock_quantity: u32,
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Buyer-facing listings exclude inactive and out-of-stock products.
    /// The row itself stays referenceable by historical order lines.
    #[must_use]
    pub const fn is_listable(&self) -> bool {
        self.is_active && self.stock_quantity > 0
    }
}

/// Insert payload for a new catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: ProductCategory,
    pub brand: String,
    pub image_url: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub stock_quantity: u32,
    pub is_active: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Partial update for a catalog entry. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ProductCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// One cart row, unique per `(account_id, product_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartLineId,
    pub account_id: AccountId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub created_at: DateTime<Utc>,
    /// Populated by `select=*,product:products(*)` reads. `None` when the
    /// referenced product was deleted or the read skipped the join.
    #[serde(default)]
    pub product: Option<Product>,
}

/// An order row. Created once per checkout attempt, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub account_id: AccountId,
    pub total_amount: Decimal,
    pub status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: PaymentReference,
    pub shipping_address: String,
    #[serde(default)]
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Populated by `select=*,order_lines(*)` reads.
    #[serde(default)]
    pub order_lines: Option<Vec<OrderLine>>,
}

impl Order {
    /// An abandoned checkout attempt: payment never resolved.
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.status == FulfillmentStatus::Pending && self.payment_status == PaymentStatus::Pending
    }
}

/// Insert payload for a new order (pending/pending).
#[derive(Debug, Clone, Serialize)]
pub struct NewOrder {
    pub account_id: AccountId,
    pub total_amount: Decimal,
    pub status: FulfillmentStatus,
    pub payment_status: PaymentStatus,
    pub payment_reference: PaymentReference,
    pub shipping_address: String,
}

/// Immutable snapshot of one purchased line. `price` is the unit price at
/// order time and must not track later catalog changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub product: Option<Product>,
}

/// Insert payload for one order line.
#[derive(Debug, Clone, Serialize)]
pub struct NewOrderLine {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: u32,
    pub price: Decimal,
}

/// Status patch applied by payment reconciliation or administrative action.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderStatusPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<FulfillmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_status: Option<PaymentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: u32, active: bool) -> Product {
        Product {
            id: ProductId::generate(),
            name: "Hydrating Serum".to_string(),
            description: String::new(),
            price: Decimal::from(5000),
            category: ProductCategory::Skincare,
            brand: "Velora".to_string(),
            image_url: String::new(),
            images: vec![],
            stock_quantity: stock,
            is_active: active,
            tags: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_listable_requires_active_and_stock() {
        assert!(product(3, true).is_listable());
        assert!(!product(0, true).is_listable());
        assert!(!product(3, false).is_listable());
    }

    #[test]
    fn test_order_abandoned_only_when_both_pending() {
        let mut order = Order {
            id: OrderId::generate(),
            account_id: AccountId::generate(),
            total_amount: Decimal::from(15000),
            status: FulfillmentStatus::Pending,
            payment_status: PaymentStatus::Pending,
            payment_reference: PaymentReference::new("vl_1_abc".to_string()),
            shipping_address: "12 Alara St, Lagos".to_string(),
            tracking_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            order_lines: None,
        };
        assert!(order.is_abandoned());

        order.payment_status = PaymentStatus::Paid;
        order.status = FulfillmentStatus::Processing;
        assert!(!order.is_abandoned());
    }
}
