//! Reconciliation between local order state and provider records.
//!
//! Webhooks can be dropped, delayed, or arrive before the checkout redirect.
//! Reconciliation fetches the authoritative transaction status straight from
//! the provider's API and compares it against the local order, producing a
//! report the verify endpoint can act on.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::order::{Order, PaymentStatus};

/// Transaction status as reported by a provider's verification API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    /// Provider confirms the payment settled.
    Paid,
    /// Provider reports the payment failed or was abandoned.
    Failed,
    /// Payment is still in flight on the provider side.
    Pending,
    /// Provider has no record of the transaction.
    Unknown,
}

/// A transaction record fetched from a provider's verification API.
#[derive(Debug, Clone)]
pub struct GatewayTransaction {
    pub status: ProviderStatus,
    /// Amount in minor units, when the provider reports one.
    pub amount_minor: Option<i64>,
    /// When the provider says the payment settled.
    pub paid_at: Option<DateTime<Utc>>,
    /// Provider's raw status string, kept for logging.
    pub raw_status: String,
}

/// Outcome of comparing an order against the provider's record.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub provider_status: ProviderStatus,
    pub local_status: PaymentStatus,
    /// True when the success webhook already ran for this order.
    pub already_processed: bool,
    /// True when the provider and local views disagree in a way that needs
    /// action (provider paid but order not completed, or the reverse).
    pub mismatch: bool,
    /// True when the provider paid, the order has not completed, and the
    /// success transition should be applied now.
    pub should_confirm: bool,
}

impl ReconciliationReport {
    /// Compare local order state against the provider's record.
    pub fn compare(order: &Order, transaction: &GatewayTransaction) -> Self {
        let provider_paid = transaction.status == ProviderStatus::Paid;
        let locally_completed = order.payment_status == PaymentStatus::Completed;

        let mismatch = provider_paid != locally_completed;
        let should_confirm = provider_paid && !order.webhook_processed;

        ReconciliationReport {
            provider_status: transaction.status.clone(),
            local_status: order.payment_status,
            already_processed: order.webhook_processed,
            mismatch,
            should_confirm,
        }
    }
}
