//! Application layer: the order flow state machine, the payment verification
//! process and the checkout service that ties them to the adapters.
//!
//! The payment verification process runs as an actor-like `tokio` task fed
//! through channels; everything else is mutated from the caller's task.

pub mod checkout;
pub mod order_flow;
pub mod verification;
