//! Payment webhook domain: signature verification, event normalization and
//! reconciliation.

pub mod errors;
pub mod event;
pub mod paystack;
pub mod reconciliation;
pub mod stripe;

pub use errors::WebhookError;
pub use event::{OrderReference, PaymentEvent, PaymentProviderKind};
pub use paystack::{PaystackEvent, PaystackWebhookVerifier};
pub use reconciliation::{GatewayTransaction, ProviderStatus, ReconciliationReport};
pub use stripe::{SignatureHeader, StripeEvent, StripeWebhookVerifier};
