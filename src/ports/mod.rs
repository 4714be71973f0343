//! Ports: trait contracts between the application core and its adapters.

pub mod notification_sender;
pub mod order_repository;
pub mod payment_gateway;

pub use notification_sender::{NotificationError, NotificationSender};
pub use order_repository::{FailedOutcome, OrderRepository, PaidOutcome};
pub use payment_gateway::{GatewayError, PaymentGateway};
