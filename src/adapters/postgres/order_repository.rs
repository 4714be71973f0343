//! PostgreSQL implementation of OrderRepository.
//!
//! The payment transitions are written as conditional UPDATEs so the
//! idempotency guard lives in the database, not in application memory. Two
//! concurrent deliveries of the same success event race on
//! `webhook_processed = FALSE` and exactly one row update wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::domain::order::{FulfillmentStatus, Order, PaymentStatus};
use crate::domain::payments::{OrderReference, WebhookError};
use crate::ports::{FailedOutcome, OrderRepository, PaidOutcome};

const ORDER_COLUMNS: &str = "id, order_number, customer_email, total_minor, currency, \
     stripe_session_id, stripe_payment_intent_id, paystack_reference, \
     payment_status, status, webhook_processed, paid_at, created_at, updated_at";

/// PostgreSQL implementation of the OrderRepository port.
pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn reference_column(reference: &OrderReference) -> &'static str {
        match reference {
            OrderReference::StripeSession(_) => "stripe_session_id",
            OrderReference::StripePaymentIntent(_) => "stripe_payment_intent_id",
            OrderReference::PaystackReference(_) => "paystack_reference",
        }
    }
}

/// Database row representation of an order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    order_number: String,
    customer_email: String,
    total_minor: i64,
    currency: String,
    stripe_session_id: Option<String>,
    stripe_payment_intent_id: Option<String>,
    paystack_reference: Option<String>,
    payment_status: String,
    status: String,
    webhook_processed: bool,
    paid_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = WebhookError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let payment_status = PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
            WebhookError::Database(format!("invalid payment_status value: {}", row.payment_status))
        })?;
        let status = FulfillmentStatus::parse(&row.status).ok_or_else(|| {
            WebhookError::Database(format!("invalid status value: {}", row.status))
        })?;

        Ok(Order {
            id: row.id,
            order_number: row.order_number,
            customer_email: row.customer_email,
            total_minor: row.total_minor,
            currency: row.currency,
            stripe_session_id: row.stripe_session_id,
            stripe_payment_intent_id: row.stripe_payment_intent_id,
            paystack_reference: row.paystack_reference,
            payment_status,
            status,
            webhook_processed: row.webhook_processed,
            paid_at: row.paid_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn db_error(e: sqlx::Error) -> WebhookError {
    WebhookError::Database(e.to_string())
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_reference(&self, reference: &OrderReference) -> Result<Order, WebhookError> {
        let column = Self::reference_column(reference);
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE {column} = $1 ORDER BY created_at ASC"
        );

        let rows: Vec<OrderRow> = sqlx::query_as(&query)
            .bind(reference.value())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        if rows.len() > 1 {
            // Reference columns carry unique indexes; more than one match
            // means upstream data damage. Oldest order wins deterministically.
            warn!(
                reference = %reference,
                matches = rows.len(),
                "multiple orders share one payment reference"
            );
        }

        rows.into_iter()
            .next()
            .ok_or(WebhookError::OrderNotFound)?
            .try_into()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Order, WebhookError> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.ok_or(WebhookError::OrderNotFound)?.try_into()
    }

    async fn find_by_order_number(&self, order_number: &str) -> Result<Order, WebhookError> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = $1");

        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        row.ok_or(WebhookError::OrderNotFound)?.try_into()
    }

    async fn mark_paid(
        &self,
        id: Uuid,
        paid_at: DateTime<Utc>,
    ) -> Result<(PaidOutcome, Order), WebhookError> {
        let query = format!(
            "UPDATE orders
             SET payment_status = 'completed',
                 status = 'processing',
                 webhook_processed = TRUE,
                 paid_at = $2,
                 updated_at = $2
             WHERE id = $1 AND webhook_processed = FALSE
             RETURNING {ORDER_COLUMNS}"
        );

        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(paid_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => Ok((PaidOutcome::Applied, row.try_into()?)),
            None => {
                // Guard filtered the row out, or the order vanished.
                let order = self.find_by_id(id).await?;
                Ok((PaidOutcome::AlreadyProcessed, order))
            }
        }
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(FailedOutcome, Order), WebhookError> {
        let query = format!(
            "UPDATE orders
             SET payment_status = 'failed',
                 status = 'cancelled',
                 updated_at = $2
             WHERE id = $1 AND payment_status <> 'completed'
             RETURNING {ORDER_COLUMNS}"
        );

        let row: Option<OrderRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(at)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;

        match row {
            Some(row) => Ok((FailedOutcome::Applied, row.try_into()?)),
            None => {
                let order = self.find_by_id(id).await?;
                Ok((FailedOutcome::SupersededByCompletion, order))
            }
        }
    }
}
