//! HTTP adapter for payment endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::PaymentsAppState;
pub use routes::{api_router, payment_routes, webhook_routes};
