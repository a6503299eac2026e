//! Error taxonomy of the transfer pipeline
//!
//! Only `Config` is fatal to a run; the other variants are local to one unit
//! of work (or one batch) and are folded into outcomes by the orchestrator.

use dvx_client::ClientError;
use dvx_common::DvxError;
use thiserror::Error;

/// Result type alias for transfer operations
pub type Result<T> = std::result::Result<T, TransferError>;

/// Error type for the transfer pipeline
#[derive(Error, Debug)]
pub enum TransferError {
    /// Invalid run configuration; aborts before any network call
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catalog query (org units, dataset membership) failed
    #[error("Catalog query failed: {0}")]
    Upstream(#[source] ClientError),

    /// Extraction of one unit's records failed
    #[error("Fetch failed: {0}")]
    Fetch(#[source] ClientError),

    /// A staged payload was structurally unreadable
    #[error("Payload unreadable: {0}")]
    Parse(String),

    /// The destination rejected a batch
    #[error("Submission failed: {0}")]
    Submit(#[source] ClientError),
}

impl TransferError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Whether this error aborts the whole run
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

impl From<DvxError> for TransferError {
    /// Shared validation errors (dates, frequencies, dataset specs) all
    /// surface as configuration errors.
    fn from(err: DvxError) -> Self {
        Self::Config(err.to_string())
    }
}
