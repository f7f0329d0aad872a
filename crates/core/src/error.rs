use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::provider::ProviderKind;

/// Why a single provider could not produce a summary.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{what} not configured")]
    NotConfigured { what: &'static str },

    #[error("settings unavailable: {0}")]
    Settings(#[from] SettingsError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid API response: {reason}")]
    InvalidResponse { reason: String },

    #[error(
        "Ollama rejected the request origin (HTTP 403). Restart it with OLLAMA_ORIGINS=\"*\" so this client is allowed"
    )]
    LocalCors,

    #[error("model '{model}' is not installed in Ollama (HTTP 404). Run `ollama pull {model}` first")]
    LocalModelMissing { model: String },
}

/// One entry of the aggregate cascade failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFailure {
    pub provider: ProviderKind,
    pub error: String,
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.error)
    }
}

/// Errors that reach the caller of the summary pipeline.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("No AI provider is configured. Add an API key or a local model URL to your settings")]
    NotConfigured,

    #[error("All providers failed: {}", join_failures(.0))]
    AllProvidersFailed(Vec<ProviderFailure>),
}

impl SummaryError {
    /// True when the UI should send the user to the settings page.
    pub fn needs_setup(&self) -> bool {
        matches!(self, SummaryError::NotConfigured)
    }
}

fn join_failures(failures: &[ProviderFailure]) -> String {
    failures
        .iter()
        .map(ProviderFailure::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Internal failure of one transcript or metadata extraction method.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid caption URL: {url}")]
    InvalidUrl { url: String },

    #[error("HTTP {status} from {endpoint}")]
    Status { endpoint: &'static str, status: u16 },

    #[error("no caption tracks listed")]
    NoCaptionTracks,

    #[error("caption payload contained no text")]
    EmptyCaptions,

    #[error("no caption URL found in the watch page")]
    NoCaptionUrl,

    #[error("no video details in the player response")]
    NoVideoDetails,
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid store key: {key}")]
    InvalidKey { key: String },
}

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings from {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SummaryError>;
