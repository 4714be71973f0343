//! Paystack payment gateway adapter.
//!
//! Implements the `PaymentGateway` port against Paystack's transaction
//! verification endpoint (`GET /transaction/verify/{reference}`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::payments::{GatewayTransaction, OrderReference, ProviderStatus};
use crate::ports::{GatewayError, PaymentGateway};

/// Paystack API configuration.
#[derive(Clone)]
pub struct PaystackGatewayConfig {
    /// Paystack secret key (sk_live_... or sk_test_...).
    secret_key: SecretString,

    /// Base URL for the Paystack API (overridable for testing).
    api_base_url: String,
}

impl PaystackGatewayConfig {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            secret_key,
            api_base_url: "https://api.paystack.co".to_string(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }
}

/// Gateway adapter querying Paystack's verification endpoint.
pub struct PaystackGateway {
    config: PaystackGatewayConfig,
    http_client: reqwest::Client,
}

/// Envelope Paystack wraps every response in.
#[derive(Debug, Deserialize)]
struct VerifyResponse {
    status: bool,
    message: String,
    data: Option<VerifyData>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    amount: Option<i64>,
    paid_at: Option<DateTime<Utc>>,
}

impl PaystackGateway {
    pub fn new(config: PaystackGatewayConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn verify_reference(&self, reference: &str) -> Result<GatewayTransaction, GatewayError> {
        let url = format!(
            "{}/transaction/verify/{}",
            self.config.api_base_url, reference
        );

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        match response.status() {
            reqwest::StatusCode::NOT_FOUND => return Err(GatewayError::NotFound),
            reqwest::StatusCode::UNAUTHORIZED => return Err(GatewayError::Unauthorized),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(GatewayError::Request(format!(
                    "Paystack API error {}: {}",
                    status, body
                )));
            }
            _ => {}
        }

        let envelope: VerifyResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::UnexpectedResponse(e.to_string()))?;

        if !envelope.status {
            return Err(GatewayError::UnexpectedResponse(envelope.message));
        }

        let data = envelope
            .data
            .ok_or_else(|| GatewayError::UnexpectedResponse("missing data field".to_string()))?;

        let status = match data.status.as_str() {
            "success" => ProviderStatus::Paid,
            "failed" | "reversed" => ProviderStatus::Failed,
            "pending" | "ongoing" | "processing" | "queued" => ProviderStatus::Pending,
            "abandoned" => ProviderStatus::Failed,
            _ => ProviderStatus::Unknown,
        };

        Ok(GatewayTransaction {
            status,
            amount_minor: data.amount,
            paid_at: data.paid_at,
            raw_status: data.status,
        })
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn verify_transaction(
        &self,
        reference: &OrderReference,
    ) -> Result<GatewayTransaction, GatewayError> {
        match reference {
            OrderReference::PaystackReference(r) => self.verify_reference(r).await,
            OrderReference::StripeSession(_) | OrderReference::StripePaymentIntent(_) => {
                Err(GatewayError::UnexpectedResponse(
                    "Stripe reference routed to Paystack gateway".to_string(),
                ))
            }
        }
    }
}
