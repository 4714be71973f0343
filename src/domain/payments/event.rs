//! Provider-agnostic payment events.
//!
//! Both providers deliver loosely-typed JSON with their own field names. Each
//! provider module normalizes its payload into [`PaymentEvent`] before any
//! order logic runs, so the state transition never branches on provider shape.

use std::fmt;

/// The payment provider an event originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentProviderKind {
    Stripe,
    Paystack,
}

impl fmt::Display for PaymentProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentProviderKind::Stripe => write!(f, "stripe"),
            PaymentProviderKind::Paystack => write!(f, "paystack"),
        }
    }
}

/// Correlation identifier mapping an inbound event to a local order.
///
/// Exactly one variant applies per provider event; each maps to its own
/// indexed column on the orders table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderReference {
    /// Stripe checkout session id (cs_...).
    StripeSession(String),
    /// Stripe payment intent id (pi_...).
    StripePaymentIntent(String),
    /// Paystack transaction reference.
    PaystackReference(String),
}

impl OrderReference {
    pub fn provider(&self) -> PaymentProviderKind {
        match self {
            OrderReference::StripeSession(_) | OrderReference::StripePaymentIntent(_) => {
                PaymentProviderKind::Stripe
            }
            OrderReference::PaystackReference(_) => PaymentProviderKind::Paystack,
        }
    }

    pub fn value(&self) -> &str {
        match self {
            OrderReference::StripeSession(v)
            | OrderReference::StripePaymentIntent(v)
            | OrderReference::PaystackReference(v) => v,
        }
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider(), self.value())
    }
}

/// A verified webhook payload normalized to the fields the transition needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    /// Payment confirmed by the provider.
    Success {
        /// Provider event id (evt_... for Stripe; synthesized for Paystack).
        event_id: String,
        reference: OrderReference,
        /// Amount in minor units, when the provider reports one.
        amount_minor: Option<i64>,
        /// Provider's raw status string, kept for logging.
        raw_status: String,
    },

    /// Payment failed.
    Failure {
        event_id: String,
        reference: OrderReference,
        raw_status: String,
    },

    /// Authentic event this service does not act on.
    Other {
        event_id: String,
        event_type: String,
    },
}

impl PaymentEvent {
    pub fn event_id(&self) -> &str {
        match self {
            PaymentEvent::Success { event_id, .. }
            | PaymentEvent::Failure { event_id, .. }
            | PaymentEvent::Other { event_id, .. } => event_id,
        }
    }

    /// The correlation reference, when the event carries one.
    pub fn reference(&self) -> Option<&OrderReference> {
        match self {
            PaymentEvent::Success { reference, .. } | PaymentEvent::Failure { reference, .. } => {
                Some(reference)
            }
            PaymentEvent::Other { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_knows_its_provider() {
        let session = OrderReference::StripeSession("cs_123".to_string());
        let intent = OrderReference::StripePaymentIntent("pi_123".to_string());
        let paystack = OrderReference::PaystackReference("REF-100".to_string());

        assert_eq!(session.provider(), PaymentProviderKind::Stripe);
        assert_eq!(intent.provider(), PaymentProviderKind::Stripe);
        assert_eq!(paystack.provider(), PaymentProviderKind::Paystack);
    }

    #[test]
    fn reference_display_includes_provider() {
        let reference = OrderReference::PaystackReference("REF-100".to_string());
        assert_eq!(reference.to_string(), "paystack:REF-100");
    }

    #[test]
    fn event_exposes_id_and_reference() {
        let event = PaymentEvent::Success {
            event_id: "evt_1".to_string(),
            reference: OrderReference::StripeSession("cs_1".to_string()),
            amount_minor: Some(5000),
            raw_status: "paid".to_string(),
        };

        assert_eq!(event.event_id(), "evt_1");
        assert_eq!(event.reference().unwrap().value(), "cs_1");
    }

    #[test]
    fn other_event_has_no_reference() {
        let event = PaymentEvent::Other {
            event_id: "evt_2".to_string(),
            event_type: "customer.created".to_string(),
        };
        assert!(event.reference().is_none());
    }
}
