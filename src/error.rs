//! Error types for fertility-insight

use thiserror::Error;

/// Errors that can occur while reading inputs or encoding results.
///
/// The estimator itself is total and never returns one of these; they come from
/// the edges (wearable files, profile JSON, configuration).
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Failed to parse wearable data: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Unsupported wearable format: {0}")]
    UnsupportedFormat(String),

    #[error("No data rows found: {0}")]
    EmptyData(String),

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
