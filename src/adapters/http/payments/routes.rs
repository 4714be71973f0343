//! Axum router configuration for payment endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    get_payment_status, handle_paystack_webhook, handle_stripe_webhook, health,
    reconcile_payment, verify_payment, PaymentsAppState,
};

/// Webhook intake routes.
///
/// No authentication middleware applies here; authenticity comes from the
/// per-provider signature verification inside each handler.
///
/// # Routes
/// - `POST /stripe` - Stripe webhook intake
/// - `POST /paystack` - Paystack webhook intake
pub fn webhook_routes() -> Router<PaymentsAppState> {
    Router::new()
        .route("/stripe", post(handle_stripe_webhook))
        .route("/paystack", post(handle_paystack_webhook))
}

/// Storefront-facing payment query routes.
///
/// # Routes
/// - `GET /status` - Payment status by order id or order number
/// - `GET /:id/reconcile` - Compare local state against the provider
/// - `POST /:id/verify` - Verify with the provider and confirm a missed payment
pub fn payment_routes() -> Router<PaymentsAppState> {
    Router::new()
        .route("/status", get(get_payment_status))
        .route("/:id/reconcile", get(reconcile_payment))
        .route("/:id/verify", post(verify_payment))
}

/// Complete API router, suitable for serving directly.
pub fn api_router(state: PaymentsAppState) -> Router {
    Router::new()
        .nest("/api/webhooks", webhook_routes())
        .nest("/api/payments", payment_routes())
        .route("/health", get(health))
        .with_state(state)
}
