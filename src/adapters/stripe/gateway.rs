//! Stripe payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against Stripe's REST API for
//! reconciliation lookups: checkout sessions and payment intents are fetched
//! directly so the verify flow never trusts local state alone.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::payments::{GatewayTransaction, OrderReference, ProviderStatus};
use crate::ports::{GatewayError, PaymentGateway};

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeGatewayConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for the Stripe API (overridable for testing).
    api_base_url: String,
}

impl StripeGatewayConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            api_base_url: "https://api.stripe.com".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Gateway adapter querying Stripe's verification endpoints.
pub struct StripeGateway {
    config: StripeGatewayConfig,
    http_client: reqwest::Client,
}

/// Checkout session fields relevant to reconciliation.
#[derive(Debug, Deserialize)]
struct CheckoutSessionResponse {
    payment_status: String,
    status: Option<String>,
    amount_total: Option<i64>,
}

/// Payment intent fields relevant to reconciliation.
#[derive(Debug, Deserialize)]
struct PaymentIntentResponse {
    status: String,
    amount_received: Option<i64>,
}

impl StripeGateway {
    pub fn new(config: StripeGatewayConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, GatewayError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(self.config.api_key.expose_secret())
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => Err(GatewayError::NotFound),
            reqwest::StatusCode::UNAUTHORIZED => Err(GatewayError::Unauthorized),
            status if status.is_success() => response
                .json::<T>()
                .await
                .map_err(|e| GatewayError::UnexpectedResponse(e.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(GatewayError::Request(format!(
                    "Stripe API error {}: {}",
                    status, body
                )))
            }
        }
    }

    async fn verify_session(&self, session_id: &str) -> Result<GatewayTransaction, GatewayError> {
        let url = format!(
            "{}/v1/checkout/sessions/{}",
            self.config.api_base_url, session_id
        );
        let session: CheckoutSessionResponse = self.get_json(&url).await?;

        let status = match session.payment_status.as_str() {
            "paid" => ProviderStatus::Paid,
            // An expired session will never settle.
            _ if session.status.as_deref() == Some("expired") => ProviderStatus::Failed,
            "unpaid" | "no_payment_required" => ProviderStatus::Pending,
            _ => ProviderStatus::Unknown,
        };

        Ok(GatewayTransaction {
            status,
            amount_minor: session.amount_total,
            paid_at: None,
            raw_status: session.payment_status,
        })
    }

    async fn verify_intent(&self, intent_id: &str) -> Result<GatewayTransaction, GatewayError> {
        let url = format!(
            "{}/v1/payment_intents/{}",
            self.config.api_base_url, intent_id
        );
        let intent: PaymentIntentResponse = self.get_json(&url).await?;

        let status = match intent.status.as_str() {
            "succeeded" => ProviderStatus::Paid,
            "canceled" => ProviderStatus::Failed,
            "processing" | "requires_payment_method" | "requires_confirmation"
            | "requires_action" | "requires_capture" => ProviderStatus::Pending,
            _ => ProviderStatus::Unknown,
        };

        Ok(GatewayTransaction {
            status,
            amount_minor: intent.amount_received,
            paid_at: None,
            raw_status: intent.status,
        })
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn verify_transaction(
        &self,
        reference: &OrderReference,
    ) -> Result<GatewayTransaction, GatewayError> {
        match reference {
            OrderReference::StripeSession(id) => self.verify_session(id).await,
            OrderReference::StripePaymentIntent(id) => self.verify_intent(id).await,
            OrderReference::PaystackReference(_) => Err(GatewayError::UnexpectedResponse(
                "Paystack reference routed to Stripe gateway".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_status_mapping() {
        let paid: CheckoutSessionResponse =
            serde_json::from_str(r#"{"payment_status":"paid","status":"complete","amount_total":5000}"#)
                .unwrap();
        assert_eq!(paid.payment_status, "paid");
        assert_eq!(paid.amount_total, Some(5000));
    }

    #[test]
    fn intent_response_parses_without_amount() {
        let intent: PaymentIntentResponse =
            serde_json::from_str(r#"{"status":"processing"}"#).unwrap();
        assert_eq!(intent.status, "processing");
        assert_eq!(intent.amount_received, None);
    }
}
