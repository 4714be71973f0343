//! Payment provider configuration (Stripe and Paystack)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment configuration for both supported providers.
///
/// A missing webhook secret is a fatal configuration error caught at startup;
/// signature verification is never silently skipped.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Stripe secret API key (sk_test_... or sk_live_...)
    pub stripe_secret_key: SecretString,

    /// Stripe webhook signing secret (whsec_...)
    pub stripe_webhook_secret: SecretString,

    /// Paystack secret key, also the webhook HMAC key (sk_test_... or sk_live_...)
    pub paystack_secret_key: SecretString,

    /// Reject Stripe test-mode events (enforced in production)
    #[serde(default)]
    pub require_livemode: bool,
}

impl PaymentConfig {
    /// Check if using Stripe test mode
    pub fn is_test_mode(&self) -> bool {
        self.stripe_secret_key.expose_secret().starts_with("sk_test_")
    }

    /// Check if using Stripe live mode
    pub fn is_live_mode(&self) -> bool {
        self.stripe_secret_key.expose_secret().starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_secret_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_SECRET_KEY"));
        }
        if self.stripe_webhook_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }
        if self.paystack_secret_key.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYSTACK_SECRET_KEY"));
        }

        // Verify key prefixes for safety
        if !self.stripe_secret_key.expose_secret().starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.expose_secret().starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }
        if !self.paystack_secret_key.expose_secret().starts_with("sk_") {
            return Err(ValidationError::InvalidPaystackKey);
        }

        Ok(())
    }
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            stripe_secret_key: SecretString::new(String::new()),
            stripe_webhook_secret: SecretString::new(String::new()),
            paystack_secret_key: SecretString::new(String::new()),
            require_livemode: false,
        }
    }
}
