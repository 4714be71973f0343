//! Order repository port.
//!
//! Defines the contract for locating orders by payment reference and for
//! applying payment-state transitions. Implementations must make the
//! transitions conditional at the storage level so concurrent duplicate
//! deliveries of the same event apply at most once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::order::Order;
use crate::domain::payments::{OrderReference, WebhookError};

/// Result of attempting the payment-success transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaidOutcome {
    /// The transition ran and this caller won the race.
    Applied,
    /// Another delivery already processed the webhook for this order.
    AlreadyProcessed,
}

/// Result of attempting the payment-failure transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailedOutcome {
    /// The order was marked failed and cancelled.
    Applied,
    /// The order had already completed; failure events never downgrade it.
    SupersededByCompletion,
}

/// Repository port for order lookup and payment-state persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Locate the order a payment reference belongs to.
    ///
    /// Each reference variant maps to one column. If multiple orders match
    /// (a data problem upstream), implementations must log the anomaly and
    /// return the oldest order so processing stays deterministic.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if no order carries the reference
    /// - `Database` on query failure
    async fn find_by_reference(&self, reference: &OrderReference) -> Result<Order, WebhookError>;

    /// Fetch an order by its internal id.
    async fn find_by_id(&self, id: Uuid) -> Result<Order, WebhookError>;

    /// Fetch an order by its human-readable order number.
    async fn find_by_order_number(&self, order_number: &str) -> Result<Order, WebhookError>;

    /// Apply the payment-success transition as a compare-and-set.
    ///
    /// Must only update rows where `webhook_processed` is still false, and
    /// report `AlreadyProcessed` when the guard filtered the row out. The
    /// returned order reflects the row after the call either way.
    async fn mark_paid(
        &self,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<(PaidOutcome, Order), WebhookError>;

    /// Apply the payment-failure transition.
    ///
    /// Must only update rows whose payment has not completed, and report
    /// `SupersededByCompletion` when the guard filtered the row out.
    async fn mark_failed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(FailedOutcome, Order), WebhookError>;
}
