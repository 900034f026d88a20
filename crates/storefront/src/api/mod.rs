//! Commerce backend boundary.
//!
//! # Architecture
//!
//! The storefront core talks to the commerce REST backend through the
//! [`CommerceBackend`] trait so the checkout orchestrator can be driven
//! against a mock in tests. [`RestBackend`] is the production
//! implementation, using `reqwest` with a session cookie jar - the
//! server-side cart is session-scoped, so all calls of one storefront
//! session must share a jar.
//!
//! # Interface
//!
//! One method per backend endpoint:
//! - cart: clear (destructive), add item, read (aggregate total + items)
//! - checkout: price calculation (optional on a given deployment),
//!   submission (no body; the server uses its session-side cart)
//! - payment: create payment link for an invoice
//! - profile: best-effort update
//!
//! # Example
//!
//! ```rust,ignore
//! use paper_crane_storefront::api::{CommerceBackend, RestBackend};
//!
//! let backend = RestBackend::new(&config.backend)?;
//! backend.clear_cart().await?;
//! backend.add_cart_item(product_id, 2).await?;
//! let cart = backend.get_cart().await?;
//! ```

mod rest;
pub mod types;

pub use rest::RestBackend;
pub use types::*;

use async_trait::async_trait;
use paper_crane_core::ProductId;
use thiserror::Error;

/// Errors that can occur when talking to the commerce backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Human-readable message, aggregated from structured detail
        /// when the backend provides it.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Endpoint or resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Client could not be constructed from configuration.
    #[error("Invalid client configuration: {0}")]
    Config(String),
}

/// Abstract commerce backend consumed by the storefront core.
///
/// The server-side cart behind this trait is a stateful, session-scoped
/// resource: the final cart content depends on call ordering, so callers
/// must issue cart mutations sequentially.
#[async_trait]
pub trait CommerceBackend: Send + Sync {
    /// Empty the server-side cart. Destructive.
    async fn clear_cart(&self) -> Result<(), ApiError>;

    /// Add a product to the server-side cart.
    async fn add_cart_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError>;

    /// Read the server-side cart, including its aggregate total.
    async fn get_cart(&self) -> Result<RemoteCart, ApiError>;

    /// Ask the backend for a price preview of the given items.
    ///
    /// Not every deployment exposes this endpoint; callers must be
    /// prepared for any failure here, including [`ApiError::NotFound`].
    async fn calculate_price(
        &self,
        items: &[PriceRequestItem],
    ) -> Result<PriceCalculation, ApiError>;

    /// Submit the checkout. No body: the server uses its session-side cart.
    async fn submit_checkout(&self) -> Result<CheckoutSubmission, ApiError>;

    /// Request a payment link for a submitted invoice.
    async fn create_payment_link(&self, invoice_id: &str) -> Result<PaymentLink, ApiError>;

    /// Update the user profile. Best-effort from the orchestrator's view.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError>;
}
