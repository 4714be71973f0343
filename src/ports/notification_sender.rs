//! Notification port for post-payment customer messaging.
//!
//! Confirmation email is a side effect of a successful payment, never part of
//! the webhook transaction: callers spawn it after the state transition
//! commits and only log failures.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::order::Order;

/// Errors from sending a notification.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The delivery service rejected the request.
    #[error("delivery rejected: {0}")]
    Rejected(String),

    /// Transport failure reaching the delivery service.
    #[error("delivery request failed: {0}")]
    Request(String),
}

/// Port for sending order-related notifications to customers.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send the order confirmation for a freshly paid order.
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), NotificationError>;
}
