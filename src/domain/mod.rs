//! Domain layer: pure business logic with no I/O.
//!
//! Everything here is synchronous and side-effect free. Signature
//! verification, event normalization, the order state machine and
//! reconciliation comparison all live in this layer so they can be tested
//! without a database or network.

pub mod order;
pub mod payments;
