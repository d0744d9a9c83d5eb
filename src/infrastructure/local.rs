use crate::domain::order::{OrderId, OrderSubmission};
use crate::domain::ports::OrderSink;
use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use tracing::debug;

/// Stand-in for a real order backend.
///
/// Accepts every submission without storing it and makes up a random numeric
/// order id below one million. Swap it for a real [`OrderSink`] once one
/// exists.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalOrderSink;

impl LocalOrderSink {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl OrderSink for LocalOrderSink {
    async fn submit(&self, submission: &OrderSubmission) -> Result<OrderId> {
        let id: u32 = rand::thread_rng().gen_range(0..1_000_000);
        debug!(reference = %submission.txn_id, id, "Order id generated locally");
        Ok(OrderId(id.to_string()))
    }
}
