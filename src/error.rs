//! Error type for provider and media-cache I/O.
//!
//! Application layers (config loading, the ingest pipeline, the CLI) use
//! `anyhow`; everything that talks to Instagram or the credential exchange
//! returns [`HarnessError`] so callers can match on HTTP status.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HarnessError>;

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Credential exchange failed: {0}")]
    Auth(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for HarnessError {
    fn from(err: reqwest::Error) -> Self {
        // Request URLs can carry an access token in the query string.
        HarnessError::Network(err.without_url().to_string())
    }
}

impl From<serde_json::Error> for HarnessError {
    fn from(err: serde_json::Error) -> Self {
        HarnessError::Parse(err.to_string())
    }
}
