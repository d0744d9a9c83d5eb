use super::file::AnalysisSuggestion;
use super::order::{OrderId, OrderSubmission};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Looks at a document and suggests how to print it.
///
/// Advisory only: callers treat any error as "no suggestion".
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, content: &[u8], mime_type: &str) -> Result<Option<AnalysisSuggestion>>;
}

/// Accepts placed orders and assigns them an identifier.
#[async_trait]
pub trait OrderSink: Send + Sync {
    async fn submit(&self, submission: &OrderSubmission) -> Result<OrderId>;
}

pub type SharedAnalyzer = Arc<dyn DocumentAnalyzer>;
pub type OrderSinkBox = Box<dyn OrderSink>;
