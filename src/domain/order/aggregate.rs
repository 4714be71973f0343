//! The Order aggregate and its payment state machine.
//!
//! Orders are created by the checkout flow before any webhook arrives. Once
//! payment events start flowing, the reconciliation logic in this crate is the
//! only writer of payment state. The aggregate methods here express the legal
//! transitions; the database adapter enforces the same rules as conditional
//! updates so concurrent duplicate deliveries apply at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::status::{FulfillmentStatus, PaymentStatus};

/// Errors from illegal payment-state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// Success event for an order whose webhook was already processed.
    #[error("order already processed")]
    AlreadyProcessed,

    /// Failure event arriving after the order completed. Provider anomaly,
    /// observed but never applied.
    #[error("failure event after completed payment")]
    FailureAfterCompletion,
}

/// An order as seen by the payment reconciliation flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Internal order id.
    pub id: Uuid,

    /// Human-readable order number (e.g. "ORD-00012345").
    pub order_number: String,

    /// Customer email, target of the confirmation notification.
    pub customer_email: String,

    /// Order total in the currency's minor unit.
    pub total_minor: i64,

    /// ISO currency code.
    pub currency: String,

    /// Stripe checkout session id (cs_...), if paid via Stripe Checkout.
    pub stripe_session_id: Option<String>,

    /// Stripe payment intent id (pi_...), if paid via PaymentIntents.
    pub stripe_payment_intent_id: Option<String>,

    /// Paystack transaction reference, if paid via Paystack.
    pub paystack_reference: Option<String>,

    pub payment_status: PaymentStatus,
    pub status: FulfillmentStatus,

    /// Idempotency guard: true once a success webhook has been applied.
    pub webhook_processed: bool,

    /// Set when the success transition is applied, null until then.
    pub paid_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Whether a payment-success event may still be applied.
    pub fn can_apply_success(&self) -> bool {
        !self.webhook_processed
    }

    /// Apply the payment-success transition.
    ///
    /// Sets `payment_status = Completed`, `status = Processing`,
    /// `webhook_processed = true` and stamps `paid_at`. Returns
    /// `TransitionError::AlreadyProcessed` on a duplicate delivery.
    pub fn apply_success(&mut self, paid_at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.webhook_processed {
            return Err(TransitionError::AlreadyProcessed);
        }
        self.payment_status = PaymentStatus::Completed;
        self.status = FulfillmentStatus::Processing;
        self.webhook_processed = true;
        self.paid_at = Some(paid_at);
        self.updated_at = paid_at;
        Ok(())
    }

    /// Apply the payment-failure transition.
    ///
    /// Not guarded by `webhook_processed` (a failure can arrive with no prior
    /// success), but a completed order is never downgraded.
    pub fn apply_failure(&mut self, at: DateTime<Utc>) -> Result<(), TransitionError> {
        if self.payment_status == PaymentStatus::Completed {
            return Err(TransitionError::FailureAfterCompletion);
        }
        self.payment_status = PaymentStatus::Failed;
        self.status = FulfillmentStatus::Cancelled;
        self.updated_at = at;
        Ok(())
    }

    /// Invariant check: a processed webhook implies a settled payment status.
    pub fn is_consistent(&self) -> bool {
        !self.webhook_processed || self.payment_status != PaymentStatus::Pending
    }
}

#[cfg(test)]
pub(crate) fn test_order(reference: &str) -> Order {
    let now = Utc::now();
    Order {
        id: Uuid::new_v4(),
        order_number: "ORD-00000001".to_string(),
        customer_email: "buyer@example.com".to_string(),
        total_minor: 125_000,
        currency: "NGN".to_string(),
        stripe_session_id: None,
        stripe_payment_intent_id: None,
        paystack_reference: Some(reference.to_string()),
        payment_status: PaymentStatus::Pending,
        status: FulfillmentStatus::Pending,
        webhook_processed: false,
        paid_at: None,
        created_at: now,
        updated_at: now,
    }
}
