//! Wire types for the commerce backend.
//!
//! These types mirror the backend's JSON shapes. Monetary amounts are
//! string-encoded decimals on the wire (see [`paper_crane_core::Money`]).
//! Response fields the backend may omit are `Option` with serde defaults,
//! because the orchestrator's control flow branches on their absence.

use paper_crane_core::{Email, Money, ProductId};
use serde::{Deserialize, Serialize};

// =============================================================================
// Cart
// =============================================================================

/// One line of the server-side cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCartItem {
    /// Backend product identifier.
    pub product_id: ProductId,
    /// Product name as the backend knows it.
    pub name: String,
    /// Price per unit.
    pub unit_price: Money,
    /// Number of units.
    pub quantity: u32,
}

/// The server-side cart with its aggregate total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCart {
    /// Cart lines.
    #[serde(default)]
    pub items: Vec<RemoteCartItem>,
    /// Aggregate total as computed by the backend.
    pub total: Money,
}

// =============================================================================
// Price calculation
// =============================================================================

/// One item of a price-calculation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRequestItem {
    /// Backend product identifier.
    pub product_id: ProductId,
    /// Number of units.
    pub quantity: u32,
}

/// A price preview for one checkout attempt.
///
/// Transient: superseded each time recalculation is requested, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceCalculation {
    /// Sum of line totals before discounts.
    pub subtotal: Money,
    /// Discount applied by the backend.
    pub discount: Money,
    /// Amount due.
    pub total: Money,
    /// Informational note for display (e.g., which promo applied).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Checkout and payment
// =============================================================================

/// Response of a checkout submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSubmission {
    /// Server-assigned invoice identifier, required to request a payment
    /// link. The backend may omit it on partial failures.
    #[serde(default)]
    pub invoice_id: Option<String>,
}

/// Payment gateway handle for a submitted invoice.
///
/// The gateway returns a redirect URL, a QR payload, or both. Neither
/// being present is an error state the caller must surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLink {
    /// Externally hosted payment page to send the user to.
    #[serde(default)]
    pub redirect_url: Option<String>,
    /// QR payload for in-page payment completion.
    #[serde(default)]
    pub qr_payload: Option<String>,
}

// =============================================================================
// Profile
// =============================================================================

/// Best-effort user-profile update pushed during checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    /// Full name.
    pub name: String,
    /// Contact phone number.
    pub phone_number: String,
    /// Delivery address.
    pub address: String,
    /// Email, when the form carries a structurally valid one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
}
