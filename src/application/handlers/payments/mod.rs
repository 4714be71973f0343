//! Payment handlers: webhook processing, status queries, reconciliation.

pub mod get_payment_status;
pub mod process_webhook;
pub mod verify_payment;

#[cfg(test)]
pub(crate) mod testing;

pub use get_payment_status::{GetPaymentStatusHandler, PaymentStatusQuery, PaymentStatusView};
pub use process_webhook::{ProcessWebhookHandler, WebhookOutcome};
pub use verify_payment::{ReconcileError, ReconcilePaymentHandler};
