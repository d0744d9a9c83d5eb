use crate::domain::file::AnalysisSuggestion;
use crate::domain::order::{OrderId, OrderSubmission};
use crate::domain::ports::{DocumentAnalyzer, OrderSink};
use crate::error::{PrintShopError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory order sink.
///
/// Keeps every submission it accepts and numbers orders sequentially
/// (`ORD-000001`, `ORD-000002`, ...). Clones share the same storage.
#[derive(Default, Clone)]
pub struct InMemoryOrderSink {
    orders: Arc<RwLock<Vec<(OrderId, OrderSubmission)>>>,
}

impl InMemoryOrderSink {
    /// Creates a new, empty in-memory order sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All accepted orders, oldest first.
    pub async fn orders(&self) -> Vec<(OrderId, OrderSubmission)> {
        self.orders.read().await.clone()
    }

    pub async fn get(&self, order_id: &OrderId) -> Option<OrderSubmission> {
        let orders = self.orders.read().await;
        orders
            .iter()
            .find(|(id, _)| id == order_id)
            .map(|(_, submission)| submission.clone())
    }
}

#[async_trait]
impl OrderSink for InMemoryOrderSink {
    async fn submit(&self, submission: &OrderSubmission) -> Result<OrderId> {
        let mut orders = self.orders.write().await;
        let order_id = OrderId(format!("ORD-{:06}", orders.len() + 1));
        orders.push((order_id.clone(), submission.clone()));
        Ok(order_id)
    }
}

/// An analyzer with canned answers per content type.
///
/// Useful offline and in tests. Content types without an answer get no
/// suggestion; a failing analyzer errors on every request.
#[derive(Default, Clone)]
pub struct StaticAnalyzer {
    suggestions: HashMap<String, AnalysisSuggestion>,
    fail: bool,
}

impl StaticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_suggestion(mut self, mime_type: impl Into<String>, suggestion: AnalysisSuggestion) -> Self {
        self.suggestions.insert(mime_type.into(), suggestion);
        self
    }
}

#[async_trait]
impl DocumentAnalyzer for StaticAnalyzer {
    async fn analyze(&self, _content: &[u8], mime_type: &str) -> Result<Option<AnalysisSuggestion>> {
        if self.fail {
            return Err(PrintShopError::Analysis("analyzer offline".to_string()));
        }
        Ok(self.suggestions.get(mime_type).cloned())
    }
}
