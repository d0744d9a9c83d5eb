use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identifies an uploaded file within one order session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file-{}", self.0)
    }
}

/// Print advice returned by a document analyzer. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSuggestion {
    pub suggested_paper: Option<String>,
    pub suggested_color: Option<String>,
    pub summary: Option<String>,
}

impl AnalysisSuggestion {
    pub fn is_empty(&self) -> bool {
        self.suggested_paper.is_none() && self.suggested_color.is_none() && self.summary.is_none()
    }

    /// One-line advice shown to the customer and stored with the order.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        if let Some(summary) = &self.summary {
            text.push_str(&format!("Detected: {summary}. "));
        }
        if let Some(paper) = &self.suggested_paper {
            text.push_str(&format!("Suggest: {paper}. "));
        }
        if let Some(color) = &self.suggested_color {
            text.push_str(&format!("Print in: {color}. "));
        }
        text.trim_end().to_string()
    }
}

/// A document the customer has added to the order.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    id: FileId,
    name: String,
    content_type: String,
    preview: Option<String>,
    content: Arc<[u8]>,
    analysis: Option<AnalysisSuggestion>,
}

impl UploadedFile {
    pub(crate) fn new(id: FileId, name: String, content_type: String, content: Vec<u8>) -> Self {
        let preview = content_type
            .starts_with("image/")
            .then(|| format!("data:{content_type};base64,{}", BASE64.encode(&content)));
        Self {
            id,
            name,
            content_type,
            preview,
            content: content.into(),
            analysis: None,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Inline preview for images, `None` for other documents.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    /// Shared handle to the raw bytes.
    pub fn content(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }

    pub fn analysis(&self) -> Option<&AnalysisSuggestion> {
        self.analysis.as_ref()
    }

    pub fn analysis_text(&self) -> Option<String> {
        self.analysis.as_ref().map(AnalysisSuggestion::to_text)
    }

    pub(crate) fn set_analysis(&mut self, suggestion: AnalysisSuggestion) {
        self.analysis = Some(suggestion);
    }

    pub fn metadata(&self) -> FileMetadata {
        FileMetadata {
            name: self.name.clone(),
            size: self.size(),
            analysis: self.analysis_text(),
        }
    }
}

/// The part of an uploaded file that is kept with a placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub name: String,
    pub size: u64,
    pub analysis: Option<String>,
}
