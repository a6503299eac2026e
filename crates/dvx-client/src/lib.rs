//! DVX warehouse API client
//!
//! Authenticated HTTP accessor for a data-warehouse instance: catalog
//! queries (organisation units, dataset membership), record extraction
//! streamed to a staging file, and batch submission with import-report
//! salvage on the failure path.
//!
//! # Example
//!
//! ```no_run
//! use dvx_client::{ApiClient, OrgUnitFilter};
//!
//! #[tokio::main]
//! async fn main() -> dvx_client::Result<()> {
//!     let client = ApiClient::new(
//!         "https://play.dhis2.org/demo".to_string(),
//!         "admin".to_string(),
//!         "district".to_string(),
//!     )?;
//!
//!     let units = client
//!         .list_org_units(&OrgUnitFilter::at_level(3))
//!         .await?;
//!     println!("{} org units", units.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod endpoints;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::{ClientError, Result};
pub use types::{
    DatasetMembership, ExtractionMode, ImportStrategy, OrgUnitFilter, PayloadFormat, RecordScope,
    StagedPayload, SubmitOptions, TimeWindow,
};
