//! ReconcilePaymentHandler - verifies an order against the provider of record.
//!
//! The read path (`check`) reports drift between local state and the
//! provider. The write path (`confirm`) additionally applies the success
//! transition when the provider says paid but the webhook never landed,
//! through the same compare-and-set as the webhook flow.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::order::Order;
use crate::domain::payments::{
    GatewayTransaction, OrderReference, ReconciliationReport, WebhookError,
};
use crate::ports::{GatewayError, NotificationSender, OrderRepository, PaidOutcome, PaymentGateway};

/// Errors from the reconciliation flow.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The order id matched nothing.
    #[error("order not found")]
    OrderNotFound,

    /// The order carries no payment reference to verify against.
    #[error("order has no payment reference")]
    NoReference,

    /// Provider verification call failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Local persistence failed.
    #[error("database error: {0}")]
    Database(String),
}

impl From<WebhookError> for ReconcileError {
    fn from(e: WebhookError) -> Self {
        match e {
            WebhookError::OrderNotFound => ReconcileError::OrderNotFound,
            other => ReconcileError::Database(other.to_string()),
        }
    }
}

/// Handler for on-demand payment verification and reconciliation.
pub struct ReconcilePaymentHandler {
    orders: Arc<dyn OrderRepository>,
    stripe: Arc<dyn PaymentGateway>,
    paystack: Arc<dyn PaymentGateway>,
    notifications: Arc<dyn NotificationSender>,
}

impl ReconcilePaymentHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        stripe: Arc<dyn PaymentGateway>,
        paystack: Arc<dyn PaymentGateway>,
        notifications: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            orders,
            stripe,
            paystack,
            notifications,
        }
    }

    /// Read-only comparison of the order against the provider's record.
    pub async fn check(&self, order_id: Uuid) -> Result<ReconciliationReport, ReconcileError> {
        let order = self.orders.find_by_id(order_id).await?;
        let report = self.compare(&order).await?;

        if report.mismatch {
            warn!(
                order_id = %order.id,
                local = ?report.local_status,
                provider = ?report.provider_status,
                "reconciliation mismatch"
            );
        }

        Ok(report)
    }

    /// Verify against the provider and apply the success transition if the
    /// provider confirms a payment the webhook never delivered.
    pub async fn confirm(&self, order_id: Uuid) -> Result<ReconciliationReport, ReconcileError> {
        let order = self.orders.find_by_id(order_id).await?;
        let transaction = self.fetch_transaction(&order).await?;
        let report = ReconciliationReport::compare(&order, &transaction);

        if !report.should_confirm {
            return Ok(report);
        }

        let (outcome, order) = self.orders.mark_paid(order.id, Utc::now()).await?;

        match outcome {
            PaidOutcome::Applied => {
                info!(
                    order_id = %order.id,
                    order_number = %order.order_number,
                    "payment confirmed via reconciliation"
                );

                let notifications = Arc::clone(&self.notifications);
                tokio::spawn(async move {
                    if let Err(e) = notifications.send_order_confirmation(&order).await {
                        warn!(order_id = %order.id, error = %e, "order confirmation email failed");
                    }
                });
            }
            PaidOutcome::AlreadyProcessed => {
                // The webhook raced us between compare and confirm. Same end
                // state, nothing more to do.
                info!(order_id = %order.id, "webhook applied first, reconciliation is a no-op");
            }
        }

        // Re-read the committed row and rebuild the report against the
        // provider answer we already acted on. A second provider call here
        // could fail and mask a transition that has already committed.
        let order = self.orders.find_by_id(order_id).await?;
        let mut report = ReconciliationReport::compare(&order, &transaction);
        report.should_confirm = false;
        Ok(report)
    }

    async fn compare(&self, order: &Order) -> Result<ReconciliationReport, ReconcileError> {
        let transaction = self.fetch_transaction(order).await?;
        Ok(ReconciliationReport::compare(order, &transaction))
    }

    async fn fetch_transaction(&self, order: &Order) -> Result<GatewayTransaction, ReconcileError> {
        let reference = payment_reference(order).ok_or(ReconcileError::NoReference)?;

        let gateway = match reference {
            OrderReference::StripeSession(_) | OrderReference::StripePaymentIntent(_) => {
                &self.stripe
            }
            OrderReference::PaystackReference(_) => &self.paystack,
        };

        Ok(gateway.verify_transaction(&reference).await?)
    }
}

/// Pick the verification reference for an order, preferring the payment
/// intent when both Stripe identifiers exist.
fn payment_reference(order: &Order) -> Option<OrderReference> {
    if let Some(pi) = &order.stripe_payment_intent_id {
        return Some(OrderReference::StripePaymentIntent(pi.clone()));
    }
    if let Some(cs) = &order.stripe_session_id {
        return Some(OrderReference::StripeSession(cs.clone()));
    }
    order
        .paystack_reference
        .as_ref()
        .map(|r| OrderReference::PaystackReference(r.clone()))
}
