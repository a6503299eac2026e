//! Error types for the warehouse API client

use dvx_common::types::ImportSummary;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error type for warehouse API operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// Transport-level failure (connection, timeout, TLS)
    #[error("Network request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream instance answered with a non-success status and no
    /// usable import report
    #[error("Upstream error (HTTP {status}): {message}")]
    Upstream { status: u16, message: String },

    /// The destination rejected a submission but its error body still
    /// carried an import report; the salvaged summary keeps the conflict
    /// detail for the caller
    #[error("Import rejected (HTTP {status}): {summary_line}")]
    Rejected {
        status: u16,
        summary_line: String,
        summary: ImportSummary,
    },

    /// Staging file I/O failed
    #[error("Staging file error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// Create an upstream error
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Create a rejected-submission error carrying the salvaged report
    pub fn rejected(status: u16, summary: ImportSummary) -> Self {
        Self::Rejected {
            status,
            summary_line: format!("{} ({} conflicts)", summary.counts, summary.conflicts.len()),
            summary,
        }
    }

    /// The salvaged import report, when this error carries one.
    pub fn salvaged_summary(&self) -> Option<&ImportSummary> {
        match self {
            Self::Rejected { summary, .. } => Some(summary),
            _ => None,
        }
    }
}
