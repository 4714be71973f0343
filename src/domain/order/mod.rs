//! Order aggregate - payment and fulfillment state for a storefront order.

mod aggregate;
mod status;

pub use aggregate::{Order, TransitionError};
pub use status::{FulfillmentStatus, PaymentStatus};

#[cfg(test)]
pub(crate) use aggregate::test_order;
