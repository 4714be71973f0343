//! Resend implementation of NotificationSender.
//!
//! Sends order confirmation emails through the Resend API. Callers spawn this
//! off the webhook path, so every failure here surfaces only as a log line.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::EmailConfig;
use crate::domain::order::Order;
use crate::ports::{NotificationError, NotificationSender};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

/// Email sender backed by the Resend API.
pub struct ResendNotificationSender {
    api_key: SecretString,
    from_header: String,
    api_url: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ResendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResendEmailResponse {
    id: String,
}

impl ResendNotificationSender {
    pub fn new(config: &EmailConfig) -> Self {
        Self {
            api_key: SecretString::new(config.resend_api_key.clone()),
            from_header: config.from_header(),
            api_url: RESEND_API_URL.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Point the sender at a custom API URL (for testing).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    fn confirmation_body(order: &Order) -> String {
        let amount = format_minor(order.total_minor, &order.currency);
        format!(
            "Thank you for your order!\n\n\
             Order {} is confirmed and your payment of {} has been received.\n\
             We are preparing your items for shipment and will email you again \
             once they are on the way.\n\n\
             Order number: {}\n",
            order.order_number, amount, order.order_number
        )
    }
}

/// Render a minor-unit amount as "1,250.00 NGN" style text.
fn format_minor(total_minor: i64, currency: &str) -> String {
    let major = total_minor / 100;
    let minor = (total_minor % 100).abs();
    format!("{}.{:02} {}", major, minor, currency)
}

#[async_trait]
impl NotificationSender for ResendNotificationSender {
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), NotificationError> {
        let request = ResendEmailRequest {
            from: &self.from_header,
            to: [order.customer_email.as_str()],
            subject: format!("Order {} confirmed", order.order_number),
            text: Self::confirmation_body(order),
        };

        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected(format!(
                "Resend API error {}: {}",
                status, body
            )));
        }

        let sent: ResendEmailResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::Request(e.to_string()))?;

        tracing::debug!(
            order_id = %order.id,
            email_id = %sent.id,
            "order confirmation email sent"
        );
        Ok(())
    }
}
