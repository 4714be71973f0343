//! HTTP DTOs for the payment endpoints.
//!
//! These types define the JSON response structure for webhook acknowledgments
//! and payment status queries. They are the boundary between HTTP and the
//! application layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::application::handlers::payments::PaymentStatusView;
use crate::domain::order::{FulfillmentStatus, PaymentStatus};
use crate::domain::payments::{ProviderStatus, ReconciliationReport};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Query parameters for the payment status endpoint.
///
/// Exactly one of `order_id` or `reference` must be provided; `reference` is
/// the human-readable order number shown to the customer.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentStatusParams {
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub reference: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgment returned to webhook providers.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,

    /// Present (and true) only when the event was a duplicate delivery.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate: Option<bool>,
}

impl WebhookAckResponse {
    pub fn received() -> Self {
        Self {
            received: true,
            duplicate: None,
        }
    }

    pub fn duplicate() -> Self {
        Self {
            received: true,
            duplicate: Some(true),
        }
    }
}

/// Payment status for a single order.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusResponse {
    pub order_id: Uuid,
    pub order_number: String,
    pub payment_status: PaymentStatus,
    pub status: FulfillmentStatus,
    pub webhook_processed: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub total_minor: i64,
    pub currency: String,
}

impl From<PaymentStatusView> for PaymentStatusResponse {
    fn from(view: PaymentStatusView) -> Self {
        Self {
            order_id: view.order_id,
            order_number: view.order_number,
            payment_status: view.payment_status,
            status: view.status,
            webhook_processed: view.webhook_processed,
            paid_at: view.paid_at,
            total_minor: view.total_minor,
            currency: view.currency,
        }
    }
}

/// Result of comparing an order against its payment provider.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationResponse {
    pub provider_status: ProviderStatus,
    pub local_status: PaymentStatus,
    pub already_processed: bool,
    pub mismatch: bool,
}

impl From<ReconciliationReport> for ReconciliationResponse {
    fn from(report: ReconciliationReport) -> Self {
        Self {
            provider_status: report.provider_status,
            local_status: report.local_status,
            already_processed: report.already_processed,
            mismatch: report.mismatch,
        }
    }
}

/// Standard error response body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
