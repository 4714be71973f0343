//! In-memory port implementations shared by the payment handler tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::order::{Order, PaymentStatus};
use crate::domain::payments::{
    GatewayTransaction, OrderReference, PaymentEvent, ProviderStatus, WebhookError,
};
use crate::ports::{
    FailedOutcome, GatewayError, NotificationError, NotificationSender, OrderRepository,
    PaidOutcome, PaymentGateway,
};

pub fn success_event(reference: &str) -> PaymentEvent {
    PaymentEvent::Success {
        event_id: format!("evt_{}", reference),
        reference: OrderReference::PaystackReference(reference.to_string()),
        amount_minor: Some(125_000),
        raw_status: "success".to_string(),
    }
}

/// Order store backed by a mutex-guarded map, applying the same conditional
/// transitions the real adapter performs in SQL.
#[derive(Default)]
pub struct InMemoryOrders {
    orders: Mutex<HashMap<Uuid, Order>>,
}

impl InMemoryOrders {
    pub fn with_order(order: Order) -> Self {
        let store = Self::default();
        store.orders.lock().unwrap().insert(order.id, order);
        store
    }

    pub fn get(&self, id: Uuid) -> Option<Order> {
        self.orders.lock().unwrap().get(&id).cloned()
    }

    pub fn get_by_reference(&self, reference: &str) -> Option<Order> {
        self.orders
            .lock()
            .unwrap()
            .values()
            .find(|o| {
                o.paystack_reference.as_deref() == Some(reference)
                    || o.stripe_session_id.as_deref() == Some(reference)
                    || o.stripe_payment_intent_id.as_deref() == Some(reference)
            })
            .cloned()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn find_by_reference(&self, reference: &OrderReference) -> Result<Order, WebhookError> {
        self.get_by_reference(reference.value())
            .ok_or(WebhookError::OrderNotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Order, WebhookError> {
        self.get(id).ok_or(WebhookError::OrderNotFound)
    }

    async fn find_by_order_number(&self, order_number: &str) -> Result<Order, WebhookError> {
        self.orders
            .lock()
            .unwrap()
            .values()
            .find(|o| o.order_number == order_number)
            .cloned()
            .ok_or(WebhookError::OrderNotFound)
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<(PaidOutcome, Order), WebhookError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&id).ok_or(WebhookError::OrderNotFound)?;

        if order.webhook_processed {
            return Ok((PaidOutcome::AlreadyProcessed, order.clone()));
        }
        order
            .apply_success(paid_at)
            .map_err(|e| WebhookError::Database(e.to_string()))?;
        Ok((PaidOutcome::Applied, order.clone()))
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(FailedOutcome, Order), WebhookError> {
        let mut orders = self.orders.lock().unwrap();
        let order = orders.get_mut(&id).ok_or(WebhookError::OrderNotFound)?;

        if order.payment_status == PaymentStatus::Completed {
            return Ok((FailedOutcome::SupersededByCompletion, order.clone()));
        }
        order
            .apply_failure(at)
            .map_err(|e| WebhookError::Database(e.to_string()))?;
        Ok((FailedOutcome::Applied, order.clone()))
    }
}

/// Notification sender that records recipients instead of sending.
#[derive(Default)]
pub struct RecordingSender {
    pub sent_to: Mutex<Vec<String>>,
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), NotificationError> {
        self.sent_to
            .lock()
            .unwrap()
            .push(order.customer_email.clone());
        Ok(())
    }
}

/// Gateway stub returning a fixed provider status.
pub struct FixedGateway {
    pub status: ProviderStatus,
}

/// Gateway stub that answers once, then fails as if the provider went down.
pub struct OneShotGateway {
    pub status: ProviderStatus,
    pub calls: Mutex<usize>,
}

impl OneShotGateway {
    pub fn paid() -> Self {
        Self {
            status: ProviderStatus::Paid,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl PaymentGateway for OneShotGateway {
    async fn verify_transaction(
        &self,
        _reference: &OrderReference,
    ) -> Result<GatewayTransaction, GatewayError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls > 1 {
            return Err(GatewayError::Request("provider unreachable".to_string()));
        }
        Ok(GatewayTransaction {
            status: self.status.clone(),
            amount_minor: Some(125_000),
            paid_at: Some(Utc::now()),
            raw_status: "stub".to_string(),
        })
    }
}

#[async_trait]
impl PaymentGateway for FixedGateway {
    async fn verify_transaction(
        &self,
        _reference: &OrderReference,
    ) -> Result<GatewayTransaction, GatewayError> {
        Ok(GatewayTransaction {
            status: self.status.clone(),
            amount_minor: Some(125_000),
            paid_at: Some(Utc::now()),
            raw_status: "stub".to_string(),
        })
    }
}
