//! HTTP handlers for webhook intake and payment queries.
//!
//! The webhook handlers read the raw body bytes before any JSON parsing:
//! both providers sign the exact payload they send, so verification has to
//! run against untouched bytes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::warn;
use uuid::Uuid;

use crate::application::handlers::payments::{
    GetPaymentStatusHandler, PaymentStatusQuery, ProcessWebhookHandler, ReconcileError,
    ReconcilePaymentHandler, WebhookOutcome,
};
use crate::domain::payments::{
    PaystackWebhookVerifier, StripeWebhookVerifier, WebhookError,
};
use crate::ports::{GatewayError, NotificationSender, OrderRepository, PaymentGateway};

use super::dto::{
    ErrorResponse, PaymentStatusParams, PaymentStatusResponse, ReconciliationResponse,
    WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared state for the payment routes.
///
/// Cloned per request; all dependencies are Arc-wrapped.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub stripe_verifier: Arc<StripeWebhookVerifier>,
    pub paystack_verifier: Arc<PaystackWebhookVerifier>,
    pub stripe_gateway: Arc<dyn PaymentGateway>,
    pub paystack_gateway: Arc<dyn PaymentGateway>,
    pub notifications: Arc<dyn NotificationSender>,
}

impl PaymentsAppState {
    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(self.orders.clone(), self.notifications.clone())
    }

    pub fn status_handler(&self) -> GetPaymentStatusHandler {
        GetPaymentStatusHandler::new(self.orders.clone())
    }

    pub fn reconcile_handler(&self) -> ReconcilePaymentHandler {
        ReconcilePaymentHandler::new(
            self.orders.clone(),
            self.stripe_gateway.clone(),
            self.paystack_gateway.clone(),
            self.notifications.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/stripe
pub async fn handle_stripe_webhook(
    State(state): State<PaymentsAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let signature = headers
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    let event = state.stripe_verifier.verify_and_parse(&body, signature)?;
    let normalized = event.normalize()?;

    let outcome = state.webhook_handler().handle(normalized).await?;
    Ok(ack(outcome))
}

/// POST /api/webhooks/paystack
pub async fn handle_paystack_webhook(
    State(state): State<PaymentsAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let signature = headers
        .get("x-paystack-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(WebhookError::MissingSignature)?;

    let event = state.paystack_verifier.verify_and_parse(&body, signature)?;
    let normalized = event.normalize()?;

    let outcome = state.webhook_handler().handle(normalized).await?;
    Ok(ack(outcome))
}

fn ack(outcome: WebhookOutcome) -> (StatusCode, Json<WebhookAckResponse>) {
    let body = match outcome {
        WebhookOutcome::Duplicate => WebhookAckResponse::duplicate(),
        WebhookOutcome::Applied | WebhookOutcome::Ignored => WebhookAckResponse::received(),
    };
    (StatusCode::OK, Json(body))
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/payments/status?order_id=... | ?reference=...
pub async fn get_payment_status(
    State(state): State<PaymentsAppState>,
    Query(params): Query<PaymentStatusParams>,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let query = match (params.order_id, params.reference) {
        (Some(id), None) => PaymentStatusQuery::OrderId(id),
        (None, Some(reference)) => PaymentStatusQuery::Reference(reference),
        _ => return Err(PaymentsApiError::BadQuery),
    };

    let view = state.status_handler().handle(query).await?;
    Ok(Json(PaymentStatusResponse::from(view)))
}

/// GET /api/payments/:id/reconcile
pub async fn reconcile_payment(
    State(state): State<PaymentsAppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let report = state.reconcile_handler().check(order_id).await?;
    Ok(Json(ReconciliationResponse::from(report)))
}

/// POST /api/payments/:id/verify
pub async fn verify_payment(
    State(state): State<PaymentsAppState>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, PaymentsApiError> {
    let report = state.reconcile_handler().confirm(order_id).await?;
    Ok(Json(ReconciliationResponse::from(report)))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type converting processing errors to HTTP responses.
pub enum PaymentsApiError {
    Webhook(WebhookError),
    Reconcile(ReconcileError),
    /// Status query with neither or both identifiers.
    BadQuery,
}

impl From<WebhookError> for PaymentsApiError {
    fn from(err: WebhookError) -> Self {
        Self::Webhook(err)
    }
}

impl From<ReconcileError> for PaymentsApiError {
    fn from(err: ReconcileError) -> Self {
        Self::Reconcile(err)
    }
}

impl IntoResponse for PaymentsApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            PaymentsApiError::Webhook(err) => {
                if matches!(err, WebhookError::Database(_)) {
                    warn!(error = %err, "webhook processing failed");
                }
                (webhook_status(err), webhook_code(err), err.to_string())
            }
            PaymentsApiError::Reconcile(err) => match err {
                ReconcileError::OrderNotFound => {
                    (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND", err.to_string())
                }
                ReconcileError::NoReference => {
                    (StatusCode::BAD_REQUEST, "NO_PAYMENT_REFERENCE", err.to_string())
                }
                ReconcileError::Gateway(GatewayError::NotFound) => (
                    StatusCode::NOT_FOUND,
                    "TRANSACTION_NOT_FOUND",
                    err.to_string(),
                ),
                ReconcileError::Gateway(_) => {
                    warn!(error = %err, "provider verification failed");
                    (StatusCode::BAD_GATEWAY, "GATEWAY_ERROR", err.to_string())
                }
                ReconcileError::Database(_) => {
                    warn!(error = %err, "reconciliation persistence failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "DATABASE_ERROR",
                        err.to_string(),
                    )
                }
            },
            PaymentsApiError::BadQuery => (
                StatusCode::BAD_REQUEST,
                "INVALID_QUERY",
                "provide exactly one of order_id or reference".to_string(),
            ),
        };

        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}

fn webhook_status(err: &WebhookError) -> StatusCode {
    err.status_code()
}

fn webhook_code(err: &WebhookError) -> &'static str {
    match err {
        WebhookError::MissingSignature => "MISSING_SIGNATURE",
        WebhookError::InvalidSignature => "INVALID_SIGNATURE",
        WebhookError::TimestampOutOfRange | WebhookError::InvalidTimestamp => "INVALID_TIMESTAMP",
        WebhookError::ParseError(_) => "PARSE_ERROR",
        WebhookError::MissingField(_) => "MISSING_FIELD",
        WebhookError::LivemodeMismatch => "LIVEMODE_MISMATCH",
        WebhookError::OrderNotFound => "ORDER_NOT_FOUND",
        WebhookError::Database(_) => "DATABASE_ERROR",
    }
}
