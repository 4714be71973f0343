//! Storefront payment webhook reconciliation service.
//!
//! Receives payment webhooks from Stripe and Paystack, verifies their
//! signatures against the raw request bytes, and applies an idempotent
//! payment-state transition to the matching order. A reconciliation fallback
//! queries the providers' verification APIs directly for orders whose webhook
//! never arrived.
//!
//! # Architecture
//!
//! - `domain` - pure logic: verifiers, event normalization, the order state
//!   machine, reconciliation comparison
//! - `ports` - trait contracts between the core and the outside world
//! - `application` - command/query handlers orchestrating domain and ports
//! - `adapters` - Postgres, Stripe, Paystack, Resend and Axum implementations
//! - `config` - environment-driven typed configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
