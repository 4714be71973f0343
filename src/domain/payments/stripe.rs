//! Stripe webhook signature verification and event normalization.
//!
//! Stripe signs webhooks with a timestamped, multi-part header
//! (`t=<unix>,v1=<hex hmac>`). The HMAC-SHA256 is computed over
//! `"{timestamp}.{raw body}"`, so verification must see the exact bytes the
//! provider sent; re-serializing the JSON first would invalidate every
//! signature.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;
use super::event::{OrderReference, PaymentEvent};

/// Maximum allowed age for webhook events (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future events (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed components from the Stripe-Signature header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// v1 signature (HMAC-SHA256).
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a Stripe-Signature header string.
    ///
    /// Format: `t=<timestamp>,v1=<signature>[,v0=<legacy>]`. Unknown fields
    /// (including v0) are ignored for forward compatibility.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if the header format is invalid.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse()
                            .map_err(|_| WebhookError::ParseError("invalid timestamp".to_string()))?,
                    );
                }
                "v1" => {
                    v1_signature = Some(hex::decode(value).map_err(|_| {
                        WebhookError::ParseError("invalid v1 signature hex".to_string())
                    })?);
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        let v1_signature = v1_signature
            .ok_or_else(|| WebhookError::ParseError("missing v1 signature".to_string()))?;

        Ok(SignatureHeader {
            timestamp,
            v1_signature,
        })
    }
}

/// Raw Stripe webhook event, as delivered.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    #[serde(default)]
    pub livemode: bool,
}

/// Container for event-specific data.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,
}

impl StripeEvent {
    /// Normalize the event into the provider-agnostic shape.
    ///
    /// - `checkout.session.completed` with `payment_status == "paid"` -> Success
    /// - `payment_intent.succeeded` -> Success
    /// - `payment_intent.payment_failed` -> Failure
    /// - everything else (including an unpaid completed session) -> Other
    pub fn normalize(&self) -> Result<PaymentEvent, WebhookError> {
        match self.event_type.as_str() {
            "checkout.session.completed" => {
                let session_id = self.object_str("id")?;
                let payment_status = self
                    .data
                    .object
                    .get("payment_status")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unpaid");

                if payment_status != "paid" {
                    // Async payment methods complete the session before the
                    // charge settles; wait for the follow-up event.
                    return Ok(PaymentEvent::Other {
                        event_id: self.id.clone(),
                        event_type: format!("{} ({})", self.event_type, payment_status),
                    });
                }

                Ok(PaymentEvent::Success {
                    event_id: self.id.clone(),
                    reference: OrderReference::StripeSession(session_id),
                    amount_minor: self.data.object.get("amount_total").and_then(|v| v.as_i64()),
                    raw_status: payment_status.to_string(),
                })
            }
            "payment_intent.succeeded" => Ok(PaymentEvent::Success {
                event_id: self.id.clone(),
                reference: OrderReference::StripePaymentIntent(self.object_str("id")?),
                amount_minor: self
                    .data
                    .object
                    .get("amount_received")
                    .and_then(|v| v.as_i64()),
                raw_status: "succeeded".to_string(),
            }),
            "payment_intent.payment_failed" => Ok(PaymentEvent::Failure {
                event_id: self.id.clone(),
                reference: OrderReference::StripePaymentIntent(self.object_str("id")?),
                raw_status: "payment_failed".to_string(),
            }),
            _ => Ok(PaymentEvent::Other {
                event_id: self.id.clone(),
                event_type: self.event_type.clone(),
            }),
        }
    }

    fn object_str(&self, field: &'static str) -> Result<String, WebhookError> {
        self.data
            .object
            .get(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or(WebhookError::MissingField(field))
    }
}

/// Verifier for Stripe webhook signatures.
pub struct StripeWebhookVerifier {
    /// The webhook signing secret from the Stripe dashboard.
    secret: SecretString,

    /// Reject test-mode events (enforced in production deployments).
    require_livemode: bool,
}

impl StripeWebhookVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: SecretString) -> Self {
        Self {
            secret,
            require_livemode: false,
        }
    }

    /// Reject events with `livemode: false`.
    pub fn with_require_livemode(mut self, require: bool) -> Self {
        self.require_livemode = require;
        self
    }

    /// Verifies the webhook signature and parses the event.
    ///
    /// # Verification Steps
    ///
    /// 1. Parse the signature header
    /// 2. Validate timestamp is within acceptable range
    /// 3. Compute expected signature using HMAC-SHA256 over the raw body
    /// 4. Compare signatures using constant-time comparison
    /// 5. Parse the JSON payload into a StripeEvent
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - Signature verification failed
    /// - `TimestampOutOfRange` - Event is older than 5 minutes
    /// - `InvalidTimestamp` - Event timestamp is in the future
    /// - `ParseError` - Failed to parse header or JSON payload
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        let header = SignatureHeader::parse(signature_header)?;

        self.validate_timestamp(header.timestamp)?;

        let expected_signature = self.compute_signature(header.timestamp, payload);

        if !constant_time_compare(&expected_signature, &header.v1_signature) {
            return Err(WebhookError::InvalidSignature);
        }

        let event: StripeEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        if self.require_livemode && !event.livemode {
            return Err(WebhookError::LivemodeMismatch);
        }

        Ok(event)
    }

    /// Validates that the timestamp is within acceptable bounds.
    fn validate_timestamp(&self, timestamp: i64) -> Result<(), WebhookError> {
        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }

        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }

    /// Computes the HMAC-SHA256 signature for the given timestamp and payload.
    fn compute_signature(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let signed_payload = format!("{}.{}", timestamp, String::from_utf8_lossy(payload));

        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(signed_payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// This prevents timing attacks that could leak information about the expected
/// signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes HMAC-SHA256 for use in test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let signed_payload = format!("{}.{}", timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key");
    mac.update(signed_payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_SECRET: &str = "whsec_test_secret_12345";

    fn verifier() -> StripeWebhookVerifier {
        StripeWebhookVerifier::new(SecretString::new(TEST_SECRET.to_string()))
    }

    // ══════════════════════════════════════════════════════════════
    // SignatureHeader Parsing Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn parse_header_with_v1_only() {
        let signature = "a".repeat(64);
        let header_str = format!("t=1234567890,v1={}", signature);

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_header_ignores_unknown_fields() {
        let signature = "a".repeat(64);
        let header_str = format!("t=1234567890,v1={},v0={},scheme=hmac", signature, "b".repeat(64));

        let header = SignatureHeader::parse(&header_str).unwrap();

        assert_eq!(header.timestamp, 1234567890);
        assert_eq!(header.v1_signature.len(), 32);
    }

    #[test]
    fn parse_header_missing_timestamp_fails() {
        let header_str = format!("v1={}", "a".repeat(64));
        assert!(matches!(
            SignatureHeader::parse(&header_str),
            Err(WebhookError::ParseError(_))
        ));
    }

    #[test]
    fn parse_header_missing_v1_fails() {
        assert!(matches!(
            SignatureHeader::parse("t=1234567890"),
            Err(WebhookError::ParseError(_))
        ));
    }

    #[test]
    fn parse_header_invalid_timestamp_fails() {
        let header_str = format!("t=not_a_number,v1={}", "a".repeat(64));
        assert!(matches!(
            SignatureHeader::parse(&header_str),
            Err(WebhookError::ParseError(_))
        ));
    }

    #[test]
    fn parse_header_invalid_hex_fails() {
        assert!(matches!(
            SignatureHeader::parse("t=1234567890,v1=not_valid_hex"),
            Err(WebhookError::ParseError(_))
        ));
    }

    #[test]
    fn parse_header_no_equals_fails() {
        assert!(matches!(
            SignatureHeader::parse("t1234567890"),
            Err(WebhookError::ParseError(_))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Signature Verification Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_valid_signature() {
        let payload = r#"{"id":"evt_test123","type":"checkout.session.completed","data":{"object":{"id":"cs_1","payment_status":"paid"}},"livemode":false}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let event = verifier().verify_and_parse(payload.as_bytes(), &header).unwrap();

        assert_eq!(event.id, "evt_test123");
    }

    #[test]
    fn verify_invalid_signature_fails() {
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let header = format!("t={},v1={}", timestamp, "a".repeat(64));

        let result = verifier().verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_wrong_secret_fails() {
        let wrong = StripeWebhookVerifier::new(SecretString::new("wrong_secret".to_string()));
        let payload = r#"{"id":"evt_test"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = wrong.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    #[test]
    fn verify_tampered_payload_fails() {
        let original_payload = r#"{"id":"evt_test"}"#;
        let tampered_payload = r#"{"id":"evt_hacked"}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, original_payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = verifier().verify_and_parse(tampered_payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
    }

    proptest! {
        /// Flipping any single byte of the body invalidates the signature.
        #[test]
        fn any_single_byte_mutation_invalidates_signature(index in 0usize..60, flip in 1u8..255) {
            let payload = br#"{"id":"evt_prop","type":"payment_intent.succeeded","data":{}}"#.to_vec();
            prop_assume!(index < payload.len());

            let timestamp = chrono::Utc::now().timestamp();
            let signature = compute_test_signature(
                TEST_SECRET,
                timestamp,
                std::str::from_utf8(&payload).unwrap(),
            );
            let header = format!("t={},v1={}", timestamp, signature);

            let mut mutated = payload.clone();
            mutated[index] ^= flip;

            let result = verifier().verify_and_parse(&mutated, &header);
            prop_assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        }
    }

    // ══════════════════════════════════════════════════════════════
    // Timestamp Validation Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_timestamp_within_range_succeeds() {
        let timestamp = chrono::Utc::now().timestamp() - 120;
        assert!(verifier().validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn verify_timestamp_too_old_fails() {
        let timestamp = chrono::Utc::now().timestamp() - 600;
        assert!(matches!(
            verifier().validate_timestamp(timestamp),
            Err(WebhookError::TimestampOutOfRange)
        ));
    }

    #[test]
    fn verify_timestamp_from_future_with_skew_succeeds() {
        let timestamp = chrono::Utc::now().timestamp() + 30;
        assert!(verifier().validate_timestamp(timestamp).is_ok());
    }

    #[test]
    fn verify_timestamp_from_future_beyond_skew_fails() {
        let timestamp = chrono::Utc::now().timestamp() + 120;
        assert!(matches!(
            verifier().validate_timestamp(timestamp),
            Err(WebhookError::InvalidTimestamp)
        ));
    }

    #[test]
    fn verify_livemode_enforcement_rejects_test_events() {
        let payload = r#"{"id":"evt_t","type":"payment_intent.succeeded","data":{"object":{"id":"pi_1"}},"livemode":false}"#;
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let strict = verifier().with_require_livemode(true);
        let result = strict.verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::LivemodeMismatch)));

        // The default verifier accepts the same event.
        assert!(verifier().verify_and_parse(payload.as_bytes(), &header).is_ok());
    }

    #[test]
    fn verify_invalid_json_fails() {
        let payload = "not valid json";
        let timestamp = chrono::Utc::now().timestamp();
        let signature = compute_test_signature(TEST_SECRET, timestamp, payload);
        let header = format!("t={},v1={}", timestamp, signature);

        let result = verifier().verify_and_parse(payload.as_bytes(), &header);

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
    }

    // ══════════════════════════════════════════════════════════════
    // Normalization Tests
    // ══════════════════════════════════════════════════════════════

    fn event_from(json: &str) -> StripeEvent {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn normalize_paid_checkout_session() {
        let event = event_from(
            r#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_abc","payment_status":"paid","amount_total":5000}}}"#,
        );

        let normalized = event.normalize().unwrap();

        assert_eq!(
            normalized,
            PaymentEvent::Success {
                event_id: "evt_1".to_string(),
                reference: OrderReference::StripeSession("cs_abc".to_string()),
                amount_minor: Some(5000),
                raw_status: "paid".to_string(),
            }
        );
    }

    #[test]
    fn normalize_unpaid_checkout_session_is_other() {
        let event = event_from(
            r#"{"id":"evt_2","type":"checkout.session.completed","data":{"object":{"id":"cs_abc","payment_status":"unpaid"}}}"#,
        );

        let normalized = event.normalize().unwrap();

        assert!(matches!(normalized, PaymentEvent::Other { .. }));
    }

    #[test]
    fn normalize_payment_intent_succeeded() {
        let event = event_from(
            r#"{"id":"evt_3","type":"payment_intent.succeeded","data":{"object":{"id":"pi_xyz","amount_received":12000}}}"#,
        );

        let normalized = event.normalize().unwrap();

        assert_eq!(
            normalized,
            PaymentEvent::Success {
                event_id: "evt_3".to_string(),
                reference: OrderReference::StripePaymentIntent("pi_xyz".to_string()),
                amount_minor: Some(12000),
                raw_status: "succeeded".to_string(),
            }
        );
    }

    #[test]
    fn normalize_payment_intent_failed() {
        let event = event_from(
            r#"{"id":"evt_4","type":"payment_intent.payment_failed","data":{"object":{"id":"pi_xyz"}}}"#,
        );

        let normalized = event.normalize().unwrap();

        assert_eq!(
            normalized,
            PaymentEvent::Failure {
                event_id: "evt_4".to_string(),
                reference: OrderReference::StripePaymentIntent("pi_xyz".to_string()),
                raw_status: "payment_failed".to_string(),
            }
        );
    }

    #[test]
    fn normalize_unknown_event_is_other() {
        let event = event_from(
            r#"{"id":"evt_5","type":"customer.created","data":{"object":{"id":"cus_1"}}}"#,
        );

        let normalized = event.normalize().unwrap();

        assert_eq!(
            normalized,
            PaymentEvent::Other {
                event_id: "evt_5".to_string(),
                event_type: "customer.created".to_string(),
            }
        );
    }

    #[test]
    fn normalize_missing_object_id_fails() {
        let event = event_from(
            r#"{"id":"evt_6","type":"payment_intent.succeeded","data":{"object":{}}}"#,
        );

        assert!(matches!(
            event.normalize(),
            Err(WebhookError::MissingField("id"))
        ));
    }

    // ══════════════════════════════════════════════════════════════
    // Constant Time Comparison Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn constant_time_compare_equal_values() {
        assert!(constant_time_compare(&[1, 2, 3], &[1, 2, 3]));
    }

    #[test]
    fn constant_time_compare_different_values() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 4]));
    }

    #[test]
    fn constant_time_compare_different_lengths() {
        assert!(!constant_time_compare(&[1, 2, 3], &[1, 2, 3, 4]));
    }
}
