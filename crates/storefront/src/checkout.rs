//! Checkout orchestration.
//!
//! Drives a client-side cart through price calculation and payment-link
//! creation against the commerce backend. The sequence per attempt:
//!
//! ```text
//! validate form -> sync profile (best-effort) -> recalculate (if needed)
//!   -> submit checkout -> create payment link -> clear local cart
//!   -> Redirect | AwaitingQr
//! ```
//!
//! The orchestrator tolerates two classes of partial failure: the
//! dedicated price-calculation endpoint may not exist (fall back to the
//! server-side cart total), and the user-profile sync may fail (logged,
//! never blocks checkout). No retries happen at this layer; retrying is
//! a caller decision.
//!
//! Callers are responsible for not starting a second attempt while one is
//! in flight; [`CheckoutOrchestrator::is_calculating`] and
//! [`CheckoutOrchestrator::is_submitting`] exist so UI triggers can be
//! disabled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use paper_crane_core::{Email, Money};

use crate::api::{ApiError, CommerceBackend, PriceCalculation, PriceRequestItem, ProfileUpdate};
use crate::cart::CartStore;

/// Note attached to a synthesized calculation when the dedicated
/// price-calculation endpoint is unavailable.
const FALLBACK_CALCULATION_MESSAGE: &str = "Discount preview unavailable; showing the cart total.";

// =============================================================================
// Form handling
// =============================================================================

/// A user profile, when one is present for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Full name.
    pub name: Option<String>,
    /// Contact phone number.
    pub phone_number: Option<String>,
    /// Email address.
    pub email: Option<Email>,
    /// Delivery address.
    pub address: Option<String>,
}

/// Checkout form data, user-editable after prefill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    /// Full name. Required.
    pub name: String,
    /// Contact phone number. Required.
    pub phone_number: String,
    /// Email address. Optional free text; see [`CheckoutForm::email`].
    pub email: String,
    /// Delivery address. Required.
    pub address: String,
    /// Free-form order notes.
    pub notes: String,
}

impl CheckoutForm {
    /// Build a form prefilled from an optional user profile.
    #[must_use]
    pub fn prefill(profile: Option<&UserProfile>) -> Self {
        profile.map_or_else(Self::default, |profile| Self {
            name: profile.name.clone().unwrap_or_default(),
            phone_number: profile.phone_number.clone().unwrap_or_default(),
            email: profile
                .email
                .as_ref()
                .map(|email| email.as_str().to_string())
                .unwrap_or_default(),
            address: profile.address.clone().unwrap_or_default(),
            notes: String::new(),
        })
    }

    /// Names of required fields that are empty or whitespace.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.phone_number.trim().is_empty() {
            missing.push("phone number");
        }
        if self.address.trim().is_empty() {
            missing.push("address");
        }
        missing
    }

    /// Structurally valid email from the form, if any.
    ///
    /// The email is optional and only feeds the best-effort profile sync,
    /// so invalid input is treated as absent rather than rejected.
    #[must_use]
    pub fn email(&self) -> Option<Email> {
        Email::parse(self.email.trim()).ok()
    }
}

// =============================================================================
// Errors and outcomes
// =============================================================================

/// Errors surfaced to the caller from a checkout or calculation attempt.
///
/// Every variant renders as a single human-readable line, carrying
/// server-provided detail through the wrapped [`ApiError`] where there is
/// one. None of these is fatal: the caller may retry the same operation.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Required form fields are empty. Checked locally; no network call
    /// was made.
    #[error("missing required fields: {}", .0.join(", "))]
    Validation(Vec<&'static str>),

    /// The local cart has no items.
    #[error("cart is empty")]
    EmptyCart,

    /// Both the dedicated price calculation and the cart-total fallback
    /// failed; this carries the original calculation error.
    #[error("price calculation failed: {0}")]
    Calculation(#[source] ApiError),

    /// Order submission was rejected by the backend.
    #[error("order submission failed: {0}")]
    Submission(#[source] ApiError),

    /// The checkout response carried no invoice identifier.
    #[error("checkout response did not include an invoice id")]
    MissingInvoiceId,

    /// Payment-link creation failed after the order was submitted.
    #[error("payment link creation failed: {0}")]
    PaymentLink(#[source] ApiError),

    /// The payment link carried neither a redirect URL nor a QR payload.
    /// The order was submitted and the local cart cleared, so payment may
    /// still be pending on the gateway side.
    #[error("no payment method was returned for the order; payment may still be pending")]
    NoPaymentMethod,

    /// The gateway returned an unparseable redirect URL. The order was
    /// submitted and the local cart cleared.
    #[error("payment page address is invalid: {0}; payment may still be pending")]
    InvalidRedirectUrl(#[source] url::ParseError),
}

/// Terminal signal of a successful checkout attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The caller must navigate the user to this externally hosted
    /// payment page. Navigation is not performed here.
    Redirect(Url),
    /// Payment is pending; the caller should present the QR payload.
    /// No further transition happens at this layer.
    AwaitingQr(String),
}

/// Result of the best-effort profile sync.
///
/// Not a `Result`: this outcome is logged, never propagated, and stays
/// structurally distinct from the hard-failure path.
#[derive(Debug)]
pub enum ProfileSyncOutcome {
    /// The profile update went through.
    Synced,
    /// The profile update failed; checkout proceeds regardless.
    Failed(ApiError),
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Sequences cart calculation and checkout against the commerce backend.
///
/// One orchestrator serves one cart session. Operations within a single
/// attempt run sequentially (the server-side cart is stateful), and an
/// in-flight attempt runs to completion or failure; cancellation is not
/// supported.
pub struct CheckoutOrchestrator {
    backend: Arc<dyn CommerceBackend>,
    cart: CartStore,
    calculating: AtomicBool,
    submitting: AtomicBool,
    last_calculation: Mutex<Option<PriceCalculation>>,
    last_error: Mutex<Option<String>>,
}

impl CheckoutOrchestrator {
    /// Create an orchestrator for a cart session.
    #[must_use]
    pub fn new(backend: Arc<dyn CommerceBackend>, cart: CartStore) -> Self {
        Self {
            backend,
            cart,
            calculating: AtomicBool::new(false),
            submitting: AtomicBool::new(false),
            last_calculation: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// The cart this orchestrator reads from and clears on success.
    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Whether a calculation attempt is in flight.
    #[must_use]
    pub fn is_calculating(&self) -> bool {
        self.calculating.load(Ordering::SeqCst)
    }

    /// Whether a checkout submission is in flight.
    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::SeqCst)
    }

    /// The calculation from the most recent successful attempt, if any.
    #[must_use]
    pub fn last_calculation(&self) -> Option<PriceCalculation> {
        lock_unpoisoned(&self.last_calculation).clone()
    }

    /// Message of the most recent failed operation, cleared on success.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        lock_unpoisoned(&self.last_error).clone()
    }

    /// Rebuild the server-side cart from the local one and obtain a price
    /// calculation.
    ///
    /// The server-side cart is cleared and replayed as a byproduct: a
    /// price preview is NOT read-only on the remote side. Items whose
    /// product id is not resolvable (non-positive) stay in the local
    /// summary but are excluded from the replay.
    ///
    /// When the dedicated calculation endpoint fails for any reason, the
    /// server-side cart's aggregate total is used instead, with a zero
    /// discount. If that fallback read also fails, the original
    /// calculation error is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::EmptyCart`] before any network call when
    /// the local cart is empty, or [`CheckoutError::Calculation`] when the
    /// server-side cart cannot be rebuilt or both price lookups fail.
    #[instrument(skip(self))]
    pub async fn recalculate(&self) -> Result<PriceCalculation, CheckoutError> {
        if self.cart.is_empty() {
            let error = CheckoutError::EmptyCart;
            self.record_error(&error);
            return Err(error);
        }

        self.calculating.store(true, Ordering::SeqCst);
        let result = self.recalculate_inner().await;
        self.calculating.store(false, Ordering::SeqCst);

        match &result {
            Ok(calculation) => {
                *lock_unpoisoned(&self.last_calculation) = Some(calculation.clone());
                *lock_unpoisoned(&self.last_error) = None;
            }
            Err(error) => self.record_error(error),
        }

        result
    }

    async fn recalculate_inner(&self) -> Result<PriceCalculation, CheckoutError> {
        let items = self.cart.items();

        // Rebuild the server-side mirror from scratch; ordering matters,
        // so these calls are sequential by construction.
        self.backend
            .clear_cart()
            .await
            .map_err(CheckoutError::Calculation)?;

        for item in &items {
            if !item.product.id.is_resolvable() {
                tracing::debug!(
                    product_id = %item.product.id,
                    "skipping cart item without a resolvable backend id"
                );
                continue;
            }
            self.backend
                .add_cart_item(item.product.id, item.quantity)
                .await
                .map_err(CheckoutError::Calculation)?;
        }

        // The calculation request carries the full local item list; only
        // the server-side mirror filters unresolvable ids.
        let request: Vec<PriceRequestItem> = items
            .iter()
            .map(|item| PriceRequestItem {
                product_id: item.product.id,
                quantity: item.quantity,
            })
            .collect();

        match self.backend.calculate_price(&request).await {
            Ok(calculation) => Ok(calculation),
            Err(primary) => {
                tracing::warn!(
                    error = %primary,
                    "price calculation unavailable, falling back to cart total"
                );
                match self.backend.get_cart().await {
                    Ok(remote_cart) => Ok(PriceCalculation {
                        subtotal: remote_cart.total,
                        discount: Money::ZERO,
                        total: remote_cart.total,
                        message: Some(FALLBACK_CALCULATION_MESSAGE.to_string()),
                    }),
                    Err(fallback) => {
                        tracing::error!(error = %fallback, "cart-total fallback failed");
                        Err(CheckoutError::Calculation(primary))
                    }
                }
            }
        }
    }

    /// Submit the checkout and obtain a payment handle.
    ///
    /// The local cart is cleared only once a payment link has been
    /// created; that clear is irreversible, so any error past that point
    /// states that payment may still be pending.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Validation`] (zero network calls) when
    /// required fields are missing, and the other [`CheckoutError`]
    /// variants per failing step. The submitting flag is cleared on every
    /// exit path.
    #[instrument(skip(self, form))]
    pub async fn submit_checkout(
        &self,
        form: &CheckoutForm,
    ) -> Result<CheckoutOutcome, CheckoutError> {
        // Validate locally before any network traffic
        let missing = form.missing_fields();
        if !missing.is_empty() {
            let error = CheckoutError::Validation(missing);
            self.record_error(&error);
            return Err(error);
        }
        if self.cart.is_empty() {
            let error = CheckoutError::EmptyCart;
            self.record_error(&error);
            return Err(error);
        }

        self.submitting.store(true, Ordering::SeqCst);
        let result = self.submit_inner(form).await;
        self.submitting.store(false, Ordering::SeqCst);

        match &result {
            Ok(_) => *lock_unpoisoned(&self.last_error) = None,
            Err(error) => self.record_error(error),
        }

        result
    }

    async fn submit_inner(&self, form: &CheckoutForm) -> Result<CheckoutOutcome, CheckoutError> {
        // Profile sync is off the critical path: log and continue
        if let ProfileSyncOutcome::Failed(error) = self.sync_profile(form).await {
            tracing::warn!(error = %error, "profile sync failed; continuing with checkout");
        }

        // Checkout submits against the server-side cart, so make sure it
        // has been populated at least once
        if self.last_calculation().is_none() {
            self.recalculate().await?;
        }

        let submission = self
            .backend
            .submit_checkout()
            .await
            .map_err(CheckoutError::Submission)?;

        let invoice_id = submission
            .invoice_id
            .filter(|id| !id.trim().is_empty())
            .ok_or(CheckoutError::MissingInvoiceId)?;

        let link = self
            .backend
            .create_payment_link(&invoice_id)
            .await
            .map_err(CheckoutError::PaymentLink)?;

        // Terminal success for the order itself. The local clear cannot be
        // undone; everything below only resolves how payment proceeds.
        self.cart.clear();
        *lock_unpoisoned(&self.last_calculation) = None;

        if let Some(redirect) = link.redirect_url.filter(|u| !u.is_empty()) {
            let url = Url::parse(&redirect).map_err(CheckoutError::InvalidRedirectUrl)?;
            return Ok(CheckoutOutcome::Redirect(url));
        }

        if let Some(qr) = link.qr_payload.filter(|q| !q.is_empty()) {
            return Ok(CheckoutOutcome::AwaitingQr(qr));
        }

        Err(CheckoutError::NoPaymentMethod)
    }

    /// Push the form's contact data to the user profile.
    async fn sync_profile(&self, form: &CheckoutForm) -> ProfileSyncOutcome {
        let update = ProfileUpdate {
            name: form.name.trim().to_string(),
            phone_number: form.phone_number.trim().to_string(),
            address: form.address.trim().to_string(),
            email: form.email(),
        };

        match self.backend.update_profile(&update).await {
            Ok(()) => ProfileSyncOutcome::Synced,
            Err(error) => ProfileSyncOutcome::Failed(error),
        }
    }

    fn record_error(&self, error: &CheckoutError) {
        *lock_unpoisoned(&self.last_error) = Some(error.to_string());
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_prefill_from_profile() {
        let profile = UserProfile {
            name: Some("Sari Wijaya".to_string()),
            phone_number: Some("+62812000111".to_string()),
            email: Some(Email::parse("sari@example.com").unwrap()),
            address: None,
        };

        let form = CheckoutForm::prefill(Some(&profile));
        assert_eq!(form.name, "Sari Wijaya");
        assert_eq!(form.phone_number, "+62812000111");
        assert_eq!(form.email, "sari@example.com");
        assert!(form.address.is_empty());
        assert!(form.notes.is_empty());
    }

    #[test]
    fn test_prefill_without_profile() {
        assert_eq!(CheckoutForm::prefill(None), CheckoutForm::default());
    }

    #[test]
    fn test_missing_fields() {
        let form = CheckoutForm {
            name: "Sari".to_string(),
            phone_number: "   ".to_string(),
            email: String::new(),
            address: String::new(),
            notes: String::new(),
        };
        assert_eq!(form.missing_fields(), vec!["phone number", "address"]);
    }

    #[test]
    fn test_form_email_lenient() {
        let mut form = CheckoutForm {
            email: "not-an-email".to_string(),
            ..CheckoutForm::default()
        };
        assert!(form.email().is_none());

        form.email = " sari@example.com ".to_string();
        assert_eq!(form.email().unwrap().as_str(), "sari@example.com");
    }

    #[test]
    fn test_validation_error_lists_fields() {
        let error = CheckoutError::Validation(vec!["name", "address"]);
        assert_eq!(error.to_string(), "missing required fields: name, address");
    }

    #[test]
    fn test_pending_payment_errors_mention_it() {
        assert!(
            CheckoutError::NoPaymentMethod
                .to_string()
                .contains("payment may still be pending")
        );
    }
}
