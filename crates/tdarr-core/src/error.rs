//! Shared error type across tdarr crates.

use thiserror::Error;

use crate::upstream::Endpoint;

/// Shared result type.
pub type Result<T> = std::result::Result<T, ExporterError>;

/// Unified error type used by core and exporter.
#[derive(Debug, Error)]
pub enum ExporterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("internal: {0}")]
    Internal(String),
}

/// A failed upstream fetch. Never fatal: the cycle is skipped and retried.
#[derive(Debug, Error)]
#[error("fetch {endpoint} failed: {failure}")]
pub struct FetchError {
    pub endpoint: Endpoint,
    pub failure: FetchFailure,
}

impl FetchError {
    pub fn new(endpoint: Endpoint, failure: FetchFailure) -> Self {
        Self { endpoint, failure }
    }
}

/// Why a fetch failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    /// Connect, timeout, or body read failure.
    #[error("transport: {0}")]
    Transport(String),
    /// Non-2xx response.
    #[error("unexpected status {0}")]
    Status(u16),
    /// Malformed JSON or unexpected shape.
    #[error("malformed body: {0}")]
    Decode(String),
    /// `cruddb` returned `[]`.
    #[error("statistics array is empty")]
    EmptyStatistics,
}

impl FetchFailure {
    /// Stable code used as a metric label and log field.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchFailure::Transport(_) => "transport",
            FetchFailure::Status(_) => "status",
            FetchFailure::Decode(_) => "decode",
            FetchFailure::EmptyStatistics => "empty_statistics",
        }
    }
}

/// Startup configuration errors. Fatal: the process exits before serving.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got {value:?}")]
    InvalidValue {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("read config file {path} failed: {reason}")]
    Read { path: String, reason: String },
    #[error("invalid yaml: {0}")]
    Yaml(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}
