//! DVX Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the DVX workspace.
//!
//! # Overview
//!
//! This crate provides common functionality used across all DVX workspace
//! members:
//!
//! - **Types**: the canonical data-value record and catalog types shared by
//!   the API client and the transfer pipeline
//! - **Periods**: reporting-frequency handling and date-range validation
//! - **Error Handling**: shared error and result types
//! - **Logging**: tracing subscriber configuration and initialization
//!
//! # Example
//!
//! ```no_run
//! use dvx_common::period::{validate_date_range, periods_in_range};
//! use dvx_common::types::ReportingFrequency;
//!
//! fn plan() -> dvx_common::Result<()> {
//!     let (start, end) = validate_date_range("2024-01-01", "2024-06-30")?;
//!     let periods = periods_in_range(ReportingFrequency::Monthly, start, end);
//!     assert_eq!(periods.len(), 6);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod period;
pub mod types;

// Re-export commonly used types
pub use error::{DvxError, Result};
