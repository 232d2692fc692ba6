//! Customer report handler.

use std::collections::HashMap;

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;

use velora_backend::OrderListing;
use velora_backend::models::{Account, Order};
use velora_core::{AccountId, PaymentStatus};

use crate::error::Result;
use crate::state::AppState;

/// One row of the customer report.
#[derive(Debug, Serialize)]
pub struct CustomerReportRow {
    #[serde(flatten)]
    pub account: Account,
    /// All orders, including abandoned attempts.
    pub order_count: usize,
    /// Sum of paid order totals.
    pub lifetime_total: Decimal,
}

fn summarize(orders: &[Order]) -> HashMap<AccountId, (usize, Decimal)> {
    let mut by_account: HashMap<AccountId, (usize, Decimal)> = HashMap::new();
    for order in orders {
        let entry = by_account.entry(order.account_id).or_default();
        entry.0 += 1;
        if order.payment_status == PaymentStatus::Paid {
            entry.1 += order.total_amount;
        }
    }
    by_account
}

/// `GET /api/customers`
///
/// Every account with its order count and paid lifetime total, highest
/// spenders first.
pub async fn report(State(state): State<AppState>) -> Result<Json<Vec<CustomerReportRow>>> {
    let accounts = state.backend().list_accounts(&state.auth()).await?;
    let orders = state
        .backend()
        .list_orders(&state.auth(), &OrderListing::default())
        .await?;

    let summaries = summarize(&orders);
    let mut rows: Vec<CustomerReportRow> = accounts
        .into_iter()
        .map(|account| {
            let (order_count, lifetime_total) =
                summaries.get(&account.id).copied().unwrap_or_default();
            CustomerReportRow {
                account,
                order_count,
                lifetime_total,
            }
        })
        .collect();
    rows.sort_by(|a, b| b.lifetime_total.cmp(&a.lifetime_total));

    Ok(Json(rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use velora_core::{FulfillmentStatus, OrderId, PaymentReference};

    fn order(account_id: AccountId, total: u32, payment_status: PaymentStatus) -> Order {
        Order {
            id: OrderId::generate(),
            account_id,
            total_amount: Decimal::from(total),
            status: FulfillmentStatus::Pending,
            payment_status,
            payment_reference: PaymentReference::new(format!("vl_{}", OrderId::generate())),
            shipping_address: "12 Alara St, Lagos".to_string(),
            tracking_number: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            order_lines: None,
        }
    }

    #[test]
    fn test_lifetime_total_counts_only_paid_orders() {
        let account_id = AccountId::generate();
        let orders = vec![
            order(account_id, 15000, PaymentStatus::Paid),
            order(account_id, 8000, PaymentStatus::Paid),
            order(account_id, 9999, PaymentStatus::Pending),
            order(account_id, 5000, PaymentStatus::Failed),
        ];

        let summaries = summarize(&orders);
        let (count, total) = *summaries.get(&account_id).expect("summary");
        assert_eq!(count, 4);
        assert_eq!(total, Decimal::from(23000));
    }
}
