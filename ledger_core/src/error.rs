//! Error types for the ledger_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ledger_core operations
///
/// Absent history is deliberately not represented here: "no previous
/// session" is an `Option::None` at every layer, not an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed input, rejected before any storage attempt
    #[error("Validation error: {0}")]
    Validation(String),

    /// Attempted update or delete of a persisted entry
    #[error("Immutability violation: {0}")]
    Immutability(String),

    /// Underlying storage failure that survived bounded retry
    #[error("Storage error: {0}")]
    Storage(String),
}
