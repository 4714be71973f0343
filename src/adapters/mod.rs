//! Adapters: concrete implementations of the port traits.

pub mod email;
pub mod http;
pub mod paystack;
pub mod postgres;
pub mod stripe;
