//! Error type shared by every `lgc_core` operation.
//!
//! Import problems at the row level never become errors; they are skipped
//! during extraction. What remains here is I/O, encoding, configuration and
//! store failures.

use std::io;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A stored record or config value could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Record store refused a fetch or upsert
    #[error("Store error: {0}")]
    Store(String),

    /// Manually entered data that cannot be recorded
    #[error("Invalid input: {0}")]
    Input(String),

    /// A bounded value outside its allowed range
    #[error("{field} value {value} outside {range}")]
    OutOfRange {
        field: &'static str,
        value: String,
        range: String,
    },
}
