//! Paystack webhook signature verification and event normalization.
//!
//! Paystack's scheme is simpler than Stripe's: the `x-paystack-signature`
//! header carries a hex HMAC-SHA512 of the raw body keyed with the account
//! secret key. There is no timestamp, so no replay window applies; replay
//! safety comes from the idempotent order transition instead.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha512;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::event::{OrderReference, PaymentEvent};

/// Raw Paystack webhook event, as delivered.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PaystackEvent {
    /// Event name (e.g., "charge.success").
    pub event: String,

    /// Event payload (shape varies per event name).
    pub data: serde_json::Value,
}

impl PaystackEvent {
    /// Normalize the event into the provider-agnostic shape.
    ///
    /// - `charge.success` with `data.status == "success"` -> Success
    /// - `charge.failed` -> Failure
    /// - everything else -> Other
    ///
    /// Paystack events carry no event id, so one is synthesized from the
    /// event name and transaction reference for log correlation.
    pub fn normalize(&self) -> Result<PaymentEvent, WebhookError> {
        match self.event.as_str() {
            "charge.success" => {
                let reference = self.data_str("reference")?;
                let status = self
                    .data
                    .get("status")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");

                if status != "success" {
                    return Ok(PaymentEvent::Other {
                        event_id: self.synthetic_id(&reference),
                        event_type: format!("{} ({})", self.event, status),
                    });
                }

                Ok(PaymentEvent::Success {
                    event_id: self.synthetic_id(&reference),
                    reference: OrderReference::PaystackReference(reference),
                    amount_minor: self.data.get("amount").and_then(|v| v.as_i64()),
                    raw_status: status.to_string(),
                })
            }
            "charge.failed" => {
                let reference = self.data_str("reference")?;
                Ok(PaymentEvent::Failure {
                    event_id: self.synthetic_id(&reference),
                    reference: OrderReference::PaystackReference(reference),
                    raw_status: self
                        .data
                        .get("status")
                        .and_then(|v| v.as_str())
                        .unwrap_or("failed")
                        .to_string(),
                })
            }
            _ => Ok(PaymentEvent::Other {
                event_id: format!("paystack:{}", self.event),
                event_type: self.event.clone(),
            }),
        }
    }

    fn synthetic_id(&self, reference: &str) -> String {
        format!("paystack:{}:{}", self.event, reference)
    }

    fn data_str(&self, field: &'static str) -> Result<String, WebhookError> {
        self.data
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(WebhookError::MissingField(field))
    }
}

/// Verifier for Paystack webhook signatures.
pub struct PaystackWebhookVerifier {
    /// The Paystack secret key (doubles as the webhook signing key).
    secret: SecretString,
}

impl PaystackWebhookVerifier {
    /// Creates a new verifier with the given secret key.
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// The header value must be the lowercase hex HMAC-SHA512 of the raw
    /// request body.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - Signature verification failed
    /// - `ParseError` - Header is not valid hex, or the body is not valid JSON
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<PaystackEvent, WebhookError> {
        let provided = hex::decode(signature_header)
            .map_err(|_| WebhookError::ParseError("invalid signature hex".to_string()))?;

        let expected = self.compute_signature(payload);

        if !constant_time_compare(&expected, &provided) {
            return Err(WebhookError::InvalidSignature);
        }

        let event: PaystackEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        Ok(event)
    }

    /// Computes the HMAC-SHA512 signature of the payload.
    fn compute_signature(&self, payload: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha512>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes the hex HMAC-SHA512 for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, payload: &str) -> String {
    let mut mac =
        Hmac::<Sha512>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
