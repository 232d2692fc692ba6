//! End-to-end checkout journeys over the in-memory shop.

use rust_decimal::Decimal;

use velora_core::{CurrencyCode, FulfillmentStatus, PaymentStatus};
use velora_integration_tests::{TestShop, buyer, catalog_product};
use velora_storefront::services::cart::{CartAggregate, CartStore};
use velora_storefront::services::checkout::{CheckoutCompletion, CheckoutOrchestrator};
use velora_storefront::services::payments::PaymentOutcome;

use velora_core::ProductCategory::{Makeup, Skincare};

const PUBLIC_KEY: Option<&str> = Some("pk_test_velora");

fn orchestrator(shop: &TestShop) -> CheckoutOrchestrator<'_> {
    CheckoutOrchestrator::new(shop, shop, shop, PUBLIC_KEY, CurrencyCode::default())
}

#[tokio::test]
async fn test_successful_purchase_journey() {
    let shop = TestShop::default();
    let serum = shop.stock(catalog_product("Hydrating Serum", 5000, Skincare, &[]));
    let lipstick = shop.stock(catalog_product("Matte Lipstick", 3000, Makeup, &[]));
    let ctx = buyer();

    let mut cart = CartAggregate::load(&shop, &ctx).await.expect("load cart");
    cart.add_line(&shop, &ctx, serum, 2).await.expect("add serum");
    cart.add_line(&shop, &ctx, lipstick, 1)
        .await
        .expect("add lipstick");

    let began = orchestrator(&shop)
        .begin(&ctx, &cart, "12 Alara St, Lagos")
        .await
        .expect("begin checkout");

    // 5000 x 2 + 3000 + 2000 flat shipping, x100 for the widget's minor units
    assert_eq!(began.order.total_amount, Decimal::from(15000));
    assert_eq!(began.widget.amount_minor_units, 1_500_000);
    assert_eq!(began.widget.currency_code, "NGN");
    assert_eq!(shop.order_lines(began.order.id).len(), 2);

    let completion = orchestrator(&shop)
        .complete(&ctx, &began.order.payment_reference)
        .await
        .expect("complete checkout");

    let CheckoutCompletion::Confirmed { order } = completion else {
        panic!("expected confirmation");
    };
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.status, FulfillmentStatus::Processing);
    assert!(shop.lines(&ctx).await.expect("lines").is_empty());
}

#[tokio::test]
async fn test_closing_the_widget_keeps_cart_and_abandoned_order() {
    let shop = TestShop::default();
    let serum = shop.stock(catalog_product("Hydrating Serum", 5000, Skincare, &[]));
    shop.set_payment_outcome(PaymentOutcome::Abandoned);
    let ctx = buyer();

    let mut cart = CartAggregate::load(&shop, &ctx).await.expect("load cart");
    cart.add_line(&shop, &ctx, serum, 1).await.expect("add");

    let began = orchestrator(&shop)
        .begin(&ctx, &cart, "12 Alara St, Lagos")
        .await
        .expect("begin checkout");
    let completion = orchestrator(&shop)
        .complete(&ctx, &began.order.payment_reference)
        .await
        .expect("complete checkout");

    let CheckoutCompletion::StillPending { order } = completion else {
        panic!("expected still-pending");
    };
    assert!(order.is_abandoned());
    // The cart survives for a retry
    assert_eq!(shop.lines(&ctx).await.expect("lines").len(), 1);
}

#[tokio::test]
async fn test_declined_payment_is_retryable_under_new_reference() {
    let shop = TestShop::default();
    let serum = shop.stock(catalog_product("Hydrating Serum", 5000, Skincare, &[]));
    shop.set_payment_outcome(PaymentOutcome::Failed {
        reason: "Insufficient funds".to_string(),
    });
    let ctx = buyer();

    let mut cart = CartAggregate::load(&shop, &ctx).await.expect("load cart");
    cart.add_line(&shop, &ctx, serum, 1).await.expect("add");

    let first = orchestrator(&shop)
        .begin(&ctx, &cart, "12 Alara St, Lagos")
        .await
        .expect("begin checkout");
    let completion = orchestrator(&shop)
        .complete(&ctx, &first.order.payment_reference)
        .await
        .expect("complete checkout");

    let CheckoutCompletion::Declined { order, reason } = completion else {
        panic!("expected decline");
    };
    assert_eq!(order.payment_status, PaymentStatus::Failed);
    assert_eq!(reason, "Insufficient funds");

    // Retry succeeds from the untouched cart, recording a second attempt
    shop.set_payment_outcome(PaymentOutcome::Succeeded);
    let cart = CartAggregate::load(&shop, &ctx).await.expect("reload cart");
    let second = orchestrator(&shop)
        .begin(&ctx, &cart, "12 Alara St, Lagos")
        .await
        .expect("retry checkout");
    assert_ne!(second.order.payment_reference, first.order.payment_reference);

    let completion = orchestrator(&shop)
        .complete(&ctx, &second.order.payment_reference)
        .await
        .expect("complete retry");
    assert!(matches!(completion, CheckoutCompletion::Confirmed { .. }));
    assert_eq!(shop.orders().len(), 2);
}
