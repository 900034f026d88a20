//! REST implementation of the commerce backend boundary.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tracing::instrument;

use paper_crane_core::ProductId;

use crate::config::BackendConfig;

use super::types::{
    CheckoutSubmission, PaymentLink, PriceCalculation, PriceRequestItem, ProfileUpdate, RemoteCart,
};
use super::{ApiError, CommerceBackend};

/// Maximum number of raw body characters carried into error messages.
const ERROR_BODY_PREVIEW: usize = 200;

/// Client for the commerce REST backend.
///
/// Uses a cookie jar because the server-side cart is session-scoped: all
/// requests of one client instance address the same remote cart.
#[derive(Clone)]
pub struct RestBackend {
    inner: Arc<RestBackendInner>,
}

struct RestBackendInner {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

impl RestBackend {
    /// Create a new backend client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(config: &BackendConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {}", config.api_token.expose_secret());
        let mut auth_header = HeaderValue::from_str(&auth_value)
            .map_err(|e| ApiError::Config(format!("invalid API token format: {e}")))?;
        auth_header.set_sensitive(true);
        headers.insert("Authorization", auth_header);
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestBackendInner {
                client,
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                api_version: config.api_version.clone(),
            }),
        })
    }

    /// Build a full endpoint URL for a backend path.
    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/{}/{path}",
            self.inner.base_url, self.inner.api_version
        )
    }

    /// Turn a non-success response into an `ApiError`.
    async fn error_from(context: &str, response: reqwest::Response) -> ApiError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::NOT_FOUND {
            return ApiError::NotFound(context.to_string());
        }

        ApiError::Api {
            status: status.as_u16(),
            message: flatten_error_body(&body),
        }
    }

    /// Send a request and decode a JSON body, checking the status first.
    async fn decode<T: serde::de::DeserializeOwned>(
        context: &str,
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from(context, response).await);
        }

        // Read text first so decode failures can be logged with the body
        let text = response.text().await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    context,
                    error = %e,
                    body = %text.chars().take(ERROR_BODY_PREVIEW).collect::<String>(),
                    "Failed to parse backend response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    /// Check a response from which no body is expected.
    async fn check(context: &str, response: reqwest::Response) -> Result<(), ApiError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::error_from(context, response).await)
        }
    }
}

#[async_trait]
impl CommerceBackend for RestBackend {
    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .delete(self.endpoint("cart"))
            .send()
            .await?;
        Self::check("clear cart", response).await
    }

    #[instrument(skip(self), fields(product_id = %product_id, quantity))]
    async fn add_cart_item(&self, product_id: ProductId, quantity: u32) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("cart/items"))
            .json(&serde_json::json!({
                "product_id": product_id,
                "quantity": quantity,
            }))
            .send()
            .await?;
        Self::check("add cart item", response).await
    }

    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<RemoteCart, ApiError> {
        let response = self.inner.client.get(self.endpoint("cart")).send().await?;
        Self::decode("get cart", response).await
    }

    #[instrument(skip(self, items), fields(item_count = items.len()))]
    async fn calculate_price(
        &self,
        items: &[PriceRequestItem],
    ) -> Result<PriceCalculation, ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("checkout/calculate"))
            .json(&serde_json::json!({ "items": items }))
            .send()
            .await?;
        Self::decode("calculate price", response).await
    }

    #[instrument(skip(self))]
    async fn submit_checkout(&self) -> Result<CheckoutSubmission, ApiError> {
        // No payload: the server uses its session-side cart
        let response = self
            .inner
            .client
            .post(self.endpoint("checkout"))
            .send()
            .await?;
        Self::decode("submit checkout", response).await
    }

    #[instrument(skip(self), fields(invoice_id = %invoice_id))]
    async fn create_payment_link(&self, invoice_id: &str) -> Result<PaymentLink, ApiError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(&format!("invoices/{invoice_id}/payment-link")))
            .send()
            .await?;
        Self::decode("create payment link", response).await
    }

    #[instrument(skip(self, update))]
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), ApiError> {
        let response = self
            .inner
            .client
            .patch(self.endpoint("profile"))
            .json(update)
            .send()
            .await?;
        Self::check("update profile", response).await
    }
}

// =============================================================================
// Error body handling
// =============================================================================

/// Structured error body the backend returns on validation failures.
///
/// `errors` maps field names to one or more messages. A `BTreeMap` keeps
/// the aggregated output stable across runs.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: BTreeMap<String, Vec<String>>,
}

/// Aggregate a backend error body into one human-readable string.
///
/// Prefers structured detail (top-level message plus per-field messages);
/// falls back to a truncated raw body.
fn flatten_error_body(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        let mut parts = Vec::new();

        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            parts.push(message);
        }

        for (field, messages) in &parsed.errors {
            if messages.is_empty() {
                continue;
            }
            parts.push(format!("{field}: {}", messages.join(", ")));
        }

        if !parts.is_empty() {
            return parts.join("; ");
        }
    }

    let preview = body.trim().chars().take(ERROR_BODY_PREVIEW).collect::<String>();
    if preview.is_empty() {
        "(no error details provided)".to_string()
    } else {
        preview
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_structured_body() {
        let body = r#"{
            "message": "Checkout rejected",
            "errors": {
                "phone_number": ["must be a valid phone number"],
                "address": ["is required", "is too short"]
            }
        }"#;
        assert_eq!(
            flatten_error_body(body),
            "Checkout rejected; address: is required, is too short; \
             phone_number: must be a valid phone number"
        );
    }

    #[test]
    fn test_flatten_field_errors_only() {
        let body = r#"{"errors":{"name":["is required"]}}"#;
        assert_eq!(flatten_error_body(body), "name: is required");
    }

    #[test]
    fn test_flatten_unstructured_body() {
        assert_eq!(flatten_error_body("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_flatten_empty_body() {
        assert_eq!(flatten_error_body(""), "(no error details provided)");
        assert_eq!(flatten_error_body("{}"), "{}");
    }
}
