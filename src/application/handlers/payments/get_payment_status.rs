//! GetPaymentStatusHandler - read-side lookup of an order's payment state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::{FulfillmentStatus, Order, PaymentStatus};
use crate::domain::payments::{OrderReference, WebhookError};
use crate::ports::OrderRepository;

/// How the caller identifies the order.
#[derive(Debug, Clone)]
pub enum PaymentStatusQuery {
    OrderId(Uuid),
    /// Order number or any provider correlation reference.
    Reference(String),
}

/// Payment state view returned to the storefront.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentStatusView {
    pub order_id: Uuid,
    pub order_number: String,
    pub payment_status: PaymentStatus,
    pub status: FulfillmentStatus,
    pub webhook_processed: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub total_minor: i64,
    pub currency: String,
}

impl From<Order> for PaymentStatusView {
    fn from(order: Order) -> Self {
        PaymentStatusView {
            order_id: order.id,
            order_number: order.order_number,
            payment_status: order.payment_status,
            status: order.status,
            webhook_processed: order.webhook_processed,
            paid_at: order.paid_at,
            total_minor: order.total_minor,
            currency: order.currency,
        }
    }
}

/// Handler for payment status queries.
pub struct GetPaymentStatusHandler {
    orders: Arc<dyn OrderRepository>,
}

impl GetPaymentStatusHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(
        &self,
        query: PaymentStatusQuery,
    ) -> Result<PaymentStatusView, WebhookError> {
        let order = match query {
            PaymentStatusQuery::OrderId(id) => self.orders.find_by_id(id).await?,
            PaymentStatusQuery::Reference(value) => self.find_by_any_reference(&value).await?,
        };
        Ok(order.into())
    }

    /// A customer-facing reference can be the order number or any provider
    /// correlation id; try each in turn.
    async fn find_by_any_reference(&self, value: &str) -> Result<Order, WebhookError> {
        match self.orders.find_by_order_number(value).await {
            Err(WebhookError::OrderNotFound) => {}
            other => return other,
        }

        let candidates = [
            OrderReference::StripeSession(value.to_string()),
            OrderReference::StripePaymentIntent(value.to_string()),
            OrderReference::PaystackReference(value.to_string()),
        ];
        for reference in candidates {
            match self.orders.find_by_reference(&reference).await {
                Err(WebhookError::OrderNotFound) => continue,
                other => return other,
            }
        }

        Err(WebhookError::OrderNotFound)
    }
}
