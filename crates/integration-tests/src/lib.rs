//! Integration test support for Paper Crane Toys.
//!
//! Provides [`MockBackend`], a programmable in-memory implementation of
//! the commerce backend boundary that records every call it receives, so
//! checkout orchestration tests can assert both outcomes and traffic
//! (including the absence of traffic).
//!
//! # Test Categories
//!
//! - `checkout_flow` - Happy paths and outcome resolution
//! - `checkout_failures` - Fallbacks, partial failures, and error surfacing

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rust_decimal::{Decimal, dec};

use paper_crane_core::{Money, ProductId};
use paper_crane_storefront::api::{
    ApiError, CheckoutSubmission, CommerceBackend, PaymentLink, PriceCalculation, PriceRequestItem,
    ProfileUpdate, RemoteCart,
};
use paper_crane_storefront::cart::{CartStore, Product};
use paper_crane_storefront::checkout::CheckoutForm;

/// Initialize tracing for tests. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "paper_crane_storefront=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ClearCart,
    AddCartItem { product_id: i64, quantity: u32 },
    GetCart,
    CalculatePrice { item_count: usize },
    SubmitCheckout,
    CreatePaymentLink { invoice_id: String },
    UpdateProfile,
}

/// Programmable commerce backend for orchestration tests.
///
/// Every call is recorded in order. Failure switches flip individual
/// endpoints into error responses; response setters shape what successful
/// calls return.
pub struct MockBackend {
    calls: Mutex<Vec<Call>>,
    clear_cart_fails: AtomicBool,
    add_item_fails: AtomicBool,
    calculate_fails: AtomicBool,
    cart_read_fails: AtomicBool,
    submit_fails: AtomicBool,
    payment_link_fails: AtomicBool,
    profile_fails: AtomicBool,
    calculation: Mutex<PriceCalculation>,
    cart: Mutex<RemoteCart>,
    invoice_id: Mutex<Option<String>>,
    payment_link: Mutex<PaymentLink>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    /// A backend where every endpoint succeeds with plausible defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            clear_cart_fails: AtomicBool::new(false),
            add_item_fails: AtomicBool::new(false),
            calculate_fails: AtomicBool::new(false),
            cart_read_fails: AtomicBool::new(false),
            submit_fails: AtomicBool::new(false),
            payment_link_fails: AtomicBool::new(false),
            profile_fails: AtomicBool::new(false),
            calculation: Mutex::new(PriceCalculation {
                subtotal: Money::new(dec!(30.00)),
                discount: Money::new(dec!(5.00)),
                total: Money::new(dec!(25.00)),
                message: None,
            }),
            cart: Mutex::new(RemoteCart {
                items: Vec::new(),
                total: Money::new(dec!(30.00)),
            }),
            invoice_id: Mutex::new(Some("INV-1001".to_string())),
            payment_link: Mutex::new(PaymentLink {
                redirect_url: Some("https://pay.example.com/INV-1001".to_string()),
                qr_payload: None,
            }),
        }
    }

    /// Make the dedicated price-calculation endpoint unavailable.
    #[must_use]
    pub fn without_calculate_endpoint(self) -> Self {
        self.calculate_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make the cart read fail.
    #[must_use]
    pub fn with_failing_cart_read(self) -> Self {
        self.cart_read_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make the cart clear fail.
    #[must_use]
    pub fn with_failing_clear_cart(self) -> Self {
        self.clear_cart_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make the add-item call fail.
    #[must_use]
    pub fn with_failing_add_item(self) -> Self {
        self.add_item_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make the checkout submission fail.
    #[must_use]
    pub fn with_failing_submit(self) -> Self {
        self.submit_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make payment-link creation fail.
    #[must_use]
    pub fn with_failing_payment_link(self) -> Self {
        self.payment_link_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Make the profile update fail.
    #[must_use]
    pub fn with_failing_profile_sync(self) -> Self {
        self.profile_fails.store(true, Ordering::SeqCst);
        self
    }

    /// Shape the successful calculation response.
    #[must_use]
    pub fn with_calculation(self, calculation: PriceCalculation) -> Self {
        *lock(&self.calculation) = calculation;
        self
    }

    /// Shape the cart read's aggregate total.
    #[must_use]
    pub fn with_cart_total(self, total: Money) -> Self {
        lock(&self.cart).total = total;
        self
    }

    /// Shape the invoice id the submission returns (None omits it).
    #[must_use]
    pub fn with_invoice_id(self, invoice_id: Option<&str>) -> Self {
        *lock(&self.invoice_id) = invoice_id.map(str::to_string);
        self
    }

    /// Shape the payment link response.
    #[must_use]
    pub fn with_payment_link(
        self,
        redirect_url: Option<&str>,
        qr_payload: Option<&str>,
    ) -> Self {
        *lock(&self.payment_link) = PaymentLink {
            redirect_url: redirect_url.map(str::to_string),
            qr_payload: qr_payload.map(str::to_string),
        };
        self
    }

    /// All calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    /// Number of calls received so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    fn record(&self, call: Call) {
        lock(&self.calls).push(call);
    }

    fn service_error() -> ApiError {
        ApiError::Api {
            status: 500,
            message: "backend unavailable".to_string(),
        }
    }
}

#[async_trait]
impl CommerceBackend for MockBackend {
    async fn clear_cart(&self) -> Result<(), ApiError> {
        self.record(Call::ClearCart);
        if self.clear_cart_fails.load(Ordering::SeqCst) {
            return Err(Self::service_error());
        }
        Ok(())
    }

    async fn add_cart_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        self.record(Call::AddCartItem {
            product_id: product_id.as_i64(),
            quantity,
        });
        if self.add_item_fails.load(Ordering::SeqCst) {
            return Err(Self::service_error());
        }
        Ok(())
    }

    async fn get_cart(&self) -> Result<RemoteCart, ApiError> {
        self.record(Call::GetCart);
        if self.cart_read_fails.load(Ordering::SeqCst) {
            return Err(Self::service_error());
        }
        Ok(lock(&self.cart).clone())
    }

    async fn calculate_price(
        &self,
        items: &[PriceRequestItem],
    ) -> Result<PriceCalculation, ApiError> {
        self.record(Call::CalculatePrice {
            item_count: items.len(),
        });
        if self.calculate_fails.load(Ordering::SeqCst) {
            // Models a deployment without the endpoint
            return Err(ApiError::NotFound("calculate price".to_string()));
        }
        Ok(lock(&self.calculation).clone())
    }

    async fn submit_checkout(&self) -> Result<CheckoutSubmission, ApiError> {
        self.record(Call::SubmitCheckout);
        if self.submit_fails.load(Ordering::SeqCst) {
            return Err(ApiError::Api {
                status: 422,
                message: "Checkout rejected; address: is too short".to_string(),
            });
        }
        Ok(CheckoutSubmission {
            invoice_id: lock(&self.invoice_id).clone(),
        })
    }

    async fn create_payment_link(&self, invoice_id: &str) -> Result<PaymentLink, ApiError> {
        self.record(Call::CreatePaymentLink {
            invoice_id: invoice_id.to_string(),
        });
        if self.payment_link_fails.load(Ordering::SeqCst) {
            return Err(Self::service_error());
        }
        Ok(lock(&self.payment_link).clone())
    }

    async fn update_profile(&self, _update: &ProfileUpdate) -> Result<(), ApiError> {
        self.record(Call::UpdateProfile);
        if self.profile_fails.load(Ordering::SeqCst) {
            return Err(Self::service_error());
        }
        Ok(())
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// A catalog product for cart fixtures.
#[must_use]
pub fn toy(id: i64, price: Decimal) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("Toy {id}"),
        price: Money::new(price),
        image_url: None,
    }
}

/// A cart with one resolvable product in it.
#[must_use]
pub fn cart_with_one_toy() -> CartStore {
    let cart = CartStore::new();
    cart.add(toy(1, dec!(15.00)), 2);
    cart
}

/// A checkout form with all required fields filled.
#[must_use]
pub fn filled_form() -> CheckoutForm {
    CheckoutForm {
        name: "Sari Wijaya".to_string(),
        phone_number: "+62812000111".to_string(),
        email: "sari@example.com".to_string(),
        address: "Jl. Melati 5, Jakarta".to_string(),
        notes: "Leave at the front desk".to_string(),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
