use crate::domain::settings::PrintSettings;
use crate::error::{PrintShopError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// An order described as JSON, for running the flow from the command line.
///
/// ```json
/// {
///   "settings": { "copies": 2, "colorMode": "color" },
///   "files": [{ "path": "thesis.pdf" }, { "path": "cover.png" }]
/// }
/// ```
///
/// Relative file paths are resolved against the request file's directory.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderRequest {
    pub settings: PrintSettings,
    pub files: Vec<FileSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileSpec {
    pub path: PathBuf,
    pub content_type: Option<String>,
}

/// A file read from disk, ready to add to an order.
#[derive(Debug, Clone)]
pub struct LoadedFile {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

impl OrderRequest {
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let mut request: Self = serde_json::from_str(&text)?;
        if let Some(dir) = path.parent() {
            for file in &mut request.files {
                if file.path.is_relative() {
                    file.path = dir.join(&file.path);
                }
            }
        }
        Ok(request)
    }

    /// Reads every listed file.
    pub fn load_files(&self) -> Result<Vec<LoadedFile>> {
        self.files.iter().map(FileSpec::load).collect()
    }
}

impl FileSpec {
    pub fn load(&self) -> Result<LoadedFile> {
        let name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                PrintShopError::Config(format!("Not a file path: {}", self.path.display()))
            })?
            .to_string();
        let content = std::fs::read(&self.path)?;
        let content_type = self
            .content_type
            .clone()
            .unwrap_or_else(|| guess_content_type(&self.path).to_string());
        Ok(LoadedFile {
            name,
            content_type,
            content,
        })
    }
}

fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("txt") => "text/plain",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}
