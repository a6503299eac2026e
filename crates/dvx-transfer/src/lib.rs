//! DVX Transfer Library
//!
//! The transfer pipeline: org-unit and dataset discovery, chunked
//! extraction, normalization, batched load, and result aggregation between
//! two warehouse instances.
//!
//! # Pipeline
//!
//! For each unit of work (an org unit paired with a dataset scope):
//!
//! 1. **Fetch** the scoped records from the source, staged to disk
//! 2. **Parse** the staged payload row by row (CSV or JSON)
//! 3. **Normalize** each raw record, dropping invalid ones
//! 4. **Batch** and submit, one batch at a time, to the destination
//!
//! Units run under a bounded-concurrency pool; per-unit failures are
//! isolated and reported in the final [`outcome::TransferSummary`].
//!
//! # Example
//!
//! ```no_run
//! use dvx_transfer::{config::TransferConfig, orchestrator::Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = TransferConfig::from_env()?;
//!     let summary = Orchestrator::new(config)?.run().await?;
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod error;
pub mod normalize;
pub mod orchestrator;
pub mod outcome;
pub mod processor;
pub mod progress;

pub use error::{Result, TransferError};
