//! ProcessWebhookHandler - applies a normalized payment event to its order.
//!
//! Runs after signature verification: locate the order the event references,
//! apply the idempotent state transition, then kick off the confirmation
//! notification outside the request path.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::domain::payments::{PaymentEvent, WebhookError};
use crate::ports::{FailedOutcome, NotificationSender, OrderRepository, PaidOutcome};

/// Result of processing a verified payment event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// Transition applied; the order changed state.
    Applied,
    /// Duplicate delivery; the order had already processed this outcome.
    Duplicate,
    /// Authentic event this service takes no action on.
    Ignored,
}

/// Handler for verified, normalized webhook events.
pub struct ProcessWebhookHandler {
    orders: Arc<dyn OrderRepository>,
    notifications: Arc<dyn NotificationSender>,
}

impl ProcessWebhookHandler {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        notifications: Arc<dyn NotificationSender>,
    ) -> Self {
        Self {
            orders,
            notifications,
        }
    }

    /// Apply a normalized event to the order it references.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` when the reference matches no order
    /// - `Database` when the lookup or transition fails
    pub async fn handle(&self, event: PaymentEvent) -> Result<WebhookOutcome, WebhookError> {
        match event {
            PaymentEvent::Success {
                event_id,
                reference,
                amount_minor,
                raw_status,
            } => {
                let order = self.orders.find_by_reference(&reference).await?;

                if let Some(amount) = amount_minor {
                    if amount != order.total_minor {
                        // Settled amount disagrees with the order total. The
                        // payment still stands, so apply it, but loudly.
                        warn!(
                            event_id = %event_id,
                            order_id = %order.id,
                            order_total = order.total_minor,
                            paid_amount = amount,
                            "webhook amount does not match order total"
                        );
                    }
                }

                let (outcome, order) = self.orders.mark_paid(order.id, Utc::now()).await?;

                match outcome {
                    PaidOutcome::Applied => {
                        info!(
                            event_id = %event_id,
                            order_id = %order.id,
                            order_number = %order.order_number,
                            reference = %reference,
                            raw_status = %raw_status,
                            "payment confirmed"
                        );

                        // Fire and forget: notification failure must never
                        // turn a processed webhook into a provider retry.
                        let notifications = Arc::clone(&self.notifications);
                        tokio::spawn(async move {
                            if let Err(e) = notifications.send_order_confirmation(&order).await {
                                warn!(
                                    order_id = %order.id,
                                    error = %e,
                                    "order confirmation email failed"
                                );
                            }
                        });

                        Ok(WebhookOutcome::Applied)
                    }
                    PaidOutcome::AlreadyProcessed => {
                        info!(
                            event_id = %event_id,
                            order_id = %order.id,
                            "duplicate success webhook ignored"
                        );
                        Ok(WebhookOutcome::Duplicate)
                    }
                }
            }

            PaymentEvent::Failure {
                event_id,
                reference,
                raw_status,
            } => {
                let order = self.orders.find_by_reference(&reference).await?;
                let (outcome, order) = self.orders.mark_failed(order.id, Utc::now()).await?;

                match outcome {
                    FailedOutcome::Applied => {
                        info!(
                            event_id = %event_id,
                            order_id = %order.id,
                            reference = %reference,
                            raw_status = %raw_status,
                            "payment failed, order cancelled"
                        );
                        Ok(WebhookOutcome::Applied)
                    }
                    FailedOutcome::SupersededByCompletion => {
                        warn!(
                            event_id = %event_id,
                            order_id = %order.id,
                            "failure event for completed order ignored"
                        );
                        Ok(WebhookOutcome::Duplicate)
                    }
                }
            }

            PaymentEvent::Other {
                event_id,
                event_type,
            } => {
                info!(event_id = %event_id, event_type = %event_type, "event acknowledged, no action");
                Ok(WebhookOutcome::Ignored)
            }
        }
    }
}
