use crate::domain::file::AnalysisSuggestion;
use crate::domain::ports::DocumentAnalyzer;
use crate::error::{PrintShopError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisRequest<'a> {
    mime_type: &'a str,
    data: String,
}

/// Calls a remote document-analysis service over HTTP.
///
/// Sends `{"mimeType": .., "data": <base64>}` as a JSON POST and expects a
/// JSON object with optional `suggestedPaper`, `suggestedColor` and
/// `summary` fields. An empty body or `null` means no suggestion.
#[derive(Debug, Clone)]
pub struct HttpDocumentAnalyzer {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpDocumentAnalyzer {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            PrintShopError::Config(format!("Invalid analysis endpoint '{endpoint}': {e}"))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(PrintShopError::Config(format!(
                "Unsupported analysis endpoint scheme: {}",
                endpoint.scheme()
            )));
        }
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl DocumentAnalyzer for HttpDocumentAnalyzer {
    async fn analyze(&self, content: &[u8], mime_type: &str) -> Result<Option<AnalysisSuggestion>> {
        let request = AnalysisRequest {
            mime_type,
            data: BASE64.encode(content),
        };
        let body = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        debug!(bytes = body.len(), "Analysis response received");

        if body.trim().is_empty() {
            return Ok(None);
        }
        let suggestion: Option<AnalysisSuggestion> = serde_json::from_str(&body)?;
        Ok(suggestion.filter(|s| !s.is_empty()))
    }
}
