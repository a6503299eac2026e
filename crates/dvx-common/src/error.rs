//! Error types shared across the DVX workspace

use thiserror::Error;

/// Result type alias for DVX operations
pub type Result<T> = std::result::Result<T, DvxError>;

/// Main error type for shared DVX operations
#[derive(Error, Debug)]
pub enum DvxError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid date '{value}': expected YYYY-MM-DD")]
    InvalidDate { value: String },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Invalid reporting frequency: {0}")]
    InvalidFrequency(String),

    #[error("Invalid dataset spec '{0}': expected 'id' or 'id:frequency'")]
    InvalidDatasetSpec(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DvxError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid-date error
    pub fn invalid_date(value: impl Into<String>) -> Self {
        Self::InvalidDate {
            value: value.into(),
        }
    }
}
