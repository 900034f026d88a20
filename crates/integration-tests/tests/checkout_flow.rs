//! Integration tests for the checkout orchestration happy paths.
//!
//! These tests drive `CheckoutOrchestrator` against a recording mock
//! backend and assert both the returned outcomes and the exact backend
//! traffic.

use std::sync::Arc;

use rust_decimal::dec;

use paper_crane_core::Money;
use paper_crane_integration_tests::{
    Call, MockBackend, cart_with_one_toy, filled_form, init_tracing, toy,
};
use paper_crane_storefront::cart::CartStore;
use paper_crane_storefront::checkout::{CheckoutOrchestrator, CheckoutOutcome};

fn setup(mock: MockBackend, cart: CartStore) -> (Arc<MockBackend>, CheckoutOrchestrator) {
    init_tracing();
    let backend = Arc::new(mock);
    let orchestrator = CheckoutOrchestrator::new(backend.clone(), cart);
    (backend, orchestrator)
}

// =============================================================================
// Recalculation
// =============================================================================

#[tokio::test]
async fn test_recalculate_rebuilds_server_cart_in_order() {
    let cart = cart_with_one_toy();
    let (backend, orchestrator) = setup(MockBackend::new(), cart.clone());

    let calculation = orchestrator.recalculate().await.expect("calculation");

    assert_eq!(calculation.total, Money::new(dec!(25.00)));
    assert_eq!(orchestrator.last_calculation(), Some(calculation));
    assert!(!orchestrator.is_calculating());
    assert!(orchestrator.last_error().is_none());

    assert_eq!(
        backend.calls(),
        vec![
            Call::ClearCart,
            Call::AddCartItem {
                product_id: 1,
                quantity: 2
            },
            Call::CalculatePrice { item_count: 1 },
        ]
    );
}

#[tokio::test]
async fn test_recalculate_skips_unresolvable_product_ids() {
    let cart = CartStore::new();
    cart.add(toy(-7, dec!(5.00)), 1);
    cart.add(toy(2, dec!(10.00)), 3);
    let (backend, orchestrator) = setup(MockBackend::new(), cart);

    orchestrator.recalculate().await.expect("calculation");

    // The unresolvable item never reaches the server cart, but the
    // calculation request still carries the full local list
    assert_eq!(
        backend.calls(),
        vec![
            Call::ClearCart,
            Call::AddCartItem {
                product_id: 2,
                quantity: 3
            },
            Call::CalculatePrice { item_count: 2 },
        ]
    );
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submit_redirect_outcome_clears_cart() {
    let cart = cart_with_one_toy();
    let (backend, orchestrator) = setup(MockBackend::new(), cart.clone());

    let outcome = orchestrator
        .submit_checkout(&filled_form())
        .await
        .expect("checkout");

    match outcome {
        CheckoutOutcome::Redirect(url) => {
            assert_eq!(url.as_str(), "https://pay.example.com/INV-1001");
        }
        CheckoutOutcome::AwaitingQr(_) => panic!("expected a redirect outcome"),
    }

    assert!(cart.is_empty(), "local cart is cleared on success");
    assert!(!orchestrator.is_submitting());
    assert!(orchestrator.last_error().is_none());

    assert_eq!(
        backend.calls(),
        vec![
            Call::UpdateProfile,
            Call::ClearCart,
            Call::AddCartItem {
                product_id: 1,
                quantity: 2
            },
            Call::CalculatePrice { item_count: 1 },
            Call::SubmitCheckout,
            Call::CreatePaymentLink {
                invoice_id: "INV-1001".to_string()
            },
        ]
    );
}

#[tokio::test]
async fn test_submit_qr_only_outcome_is_awaiting_qr() {
    let cart = cart_with_one_toy();
    let mock = MockBackend::new().with_payment_link(None, Some("00020101021226..."));
    let (_backend, orchestrator) = setup(mock, cart.clone());

    let outcome = orchestrator
        .submit_checkout(&filled_form())
        .await
        .expect("checkout");

    assert_eq!(
        outcome,
        CheckoutOutcome::AwaitingQr("00020101021226...".to_string())
    );
    assert!(cart.is_empty(), "local cart is cleared before the QR is shown");
}

#[tokio::test]
async fn test_submit_reuses_held_calculation() {
    let cart = cart_with_one_toy();
    let (backend, orchestrator) = setup(MockBackend::new(), cart);

    orchestrator.recalculate().await.expect("calculation");
    orchestrator
        .submit_checkout(&filled_form())
        .await
        .expect("checkout");

    let calculate_calls = backend
        .calls()
        .iter()
        .filter(|call| matches!(call, Call::CalculatePrice { .. }))
        .count();
    assert_eq!(
        calculate_calls, 1,
        "submission must not recalculate when a calculation is held"
    );
}

#[tokio::test]
async fn test_successful_checkout_drops_held_calculation() {
    let cart = cart_with_one_toy();
    let (_backend, orchestrator) = setup(MockBackend::new(), cart);

    orchestrator.recalculate().await.expect("calculation");
    assert!(orchestrator.last_calculation().is_some());

    orchestrator
        .submit_checkout(&filled_form())
        .await
        .expect("checkout");

    assert!(
        orchestrator.last_calculation().is_none(),
        "a held calculation belongs to the cart that was just cleared"
    );
}
