//! Payment gateway port for provider verification APIs.
//!
//! Reconciliation cannot trust local state alone, so this port fetches the
//! authoritative transaction record from the provider that took the payment.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::payments::{GatewayTransaction, OrderReference};

/// Errors from provider verification calls.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The provider has no record matching the reference.
    #[error("transaction not found at provider")]
    NotFound,

    /// The provider rejected our credentials.
    #[error("provider rejected credentials")]
    Unauthorized,

    /// Transport failure or provider outage.
    #[error("provider request failed: {0}")]
    Request(String),

    /// The provider answered with a body we could not interpret.
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),
}

/// Port for querying a provider's transaction verification API.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetch the provider's record for a transaction reference.
    ///
    /// Implementations pick the provider endpoint from the reference variant
    /// (checkout session, payment intent, or Paystack reference).
    async fn verify_transaction(
        &self,
        reference: &OrderReference,
    ) -> Result<GatewayTransaction, GatewayError>;
}
