//! Stripe adapters.

pub mod gateway;

pub use gateway::{StripeGateway, StripeGatewayConfig};
