//! Paystack adapters.

pub mod gateway;

pub use gateway::{PaystackGateway, PaystackGatewayConfig};
