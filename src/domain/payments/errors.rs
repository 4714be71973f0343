//! Webhook error taxonomy.
//!
//! Each variant maps to an HTTP status that controls the provider's retry
//! behavior: 2xx acknowledges, 4xx stops retries, 5xx triggers a redelivery.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature header absent from the request.
    #[error("Missing signature header")]
    MissingSignature,

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Stripe event timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// Test-mode event delivered while livemode enforcement is on.
    #[error("Test-mode event rejected")]
    LivemodeMismatch,

    /// Event references no known order. Terminal for the event: logged and
    /// acknowledged, since a provider retry cannot make the order appear.
    #[error("No order matches reference")]
    OrderNotFound,

    /// Persistence failure; the transition may not have applied, so the
    /// provider must retry.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Authenticity and malformed-payload failures: no retry benefit.
            WebhookError::MissingSignature
            | WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingField(_)
            | WebhookError::LivemodeMismatch => StatusCode::BAD_REQUEST,

            // Unmatched reference: acknowledged with 404 so the provider stops.
            WebhookError::OrderNotFound => StatusCode::NOT_FOUND,

            // The update did not definitely apply; the provider retries.
            WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authenticity_errors_return_bad_request() {
        assert_eq!(
            WebhookError::MissingSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::InvalidTimestamp.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn parse_errors_return_bad_request() {
        assert_eq!(
            WebhookError::ParseError("bad json".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WebhookError::MissingField("reference").status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn order_not_found_returns_not_found() {
        assert_eq!(
            WebhookError::OrderNotFound.status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn database_error_returns_internal_error() {
        assert_eq!(
            WebhookError::Database("connection lost".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn only_database_errors_are_retryable() {
        assert!(WebhookError::Database("timeout".to_string()).is_retryable());
        assert!(!WebhookError::InvalidSignature.is_retryable());
        assert!(!WebhookError::OrderNotFound.is_retryable());
        assert!(!WebhookError::ParseError("x".to_string()).is_retryable());
        assert!(!WebhookError::MissingSignature.is_retryable());
    }

    #[test]
    fn errors_display_correctly() {
        assert_eq!(
            WebhookError::InvalidSignature.to_string(),
            "Invalid signature"
        );
        assert_eq!(
            WebhookError::MissingField("reference").to_string(),
            "Missing field: reference"
        );
        assert_eq!(
            WebhookError::OrderNotFound.to_string(),
            "No order matches reference"
        );
    }
}
