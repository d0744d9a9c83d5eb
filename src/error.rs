use crate::domain::verification::VerificationStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrintShopError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Document analysis failed: {0}")]
    Analysis(String),
    #[error("Order submission failed: {0}")]
    Submission(String),
    #[error(transparent)]
    Verification(#[from] VerificationError),
}

/// Failures reported by the payment verification process.
///
/// None of these change the session state; the user can simply retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Please enter a valid 12-digit reference number")]
    InvalidReference,
    #[error("Session is {0} and no longer accepts this action")]
    NotAccepting(VerificationStatus),
    #[error("Verification process has shut down")]
    ProcessClosed,
}

pub type Result<T> = std::result::Result<T, PrintShopError>;
