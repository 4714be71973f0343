//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations through the
//! port traits.

pub mod payments;
