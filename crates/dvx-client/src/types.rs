//! API request and response types
//!
//! Matches the warehouse API's wire structure.

use chrono::NaiveDate;
use dvx_common::types::{ImportSummary, OrgUnit};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tempfile::NamedTempFile;

// ============================================================================
// Catalog envelopes
// ============================================================================

/// Envelope of a `GET /api/organisationUnits` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnitsEnvelope {
    #[serde(default)]
    pub organisation_units: Vec<OrgUnit>,
}

/// One dataset entry of a `GET /api/dataSets` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetEntry {
    pub id: String,

    #[serde(default)]
    pub period_type: Option<String>,

    #[serde(default)]
    pub data_set_elements: Vec<DataSetElement>,

    #[serde(default)]
    pub organisation_units: Vec<OrgUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetElement {
    pub data_element: ElementRef,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementRef {
    pub id: String,
}

/// Envelope of a `GET /api/dataSets` response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSetsEnvelope {
    #[serde(default)]
    pub data_sets: Vec<DataSetEntry>,
}

/// Resolved membership of a dataset group: the element ids records are
/// allowed to carry, and the org units the datasets are assigned to.
///
/// Extraction endpoints may return a superset of the requested datasets'
/// elements; filtering against `data_elements` keeps foreign records out.
#[derive(Debug, Clone, Default)]
pub struct DatasetMembership {
    pub data_elements: HashSet<String>,
    pub organisation_units: Vec<OrgUnit>,
}

impl DatasetMembership {
    pub fn permits(&self, data_element: &str) -> bool {
        self.data_elements.is_empty() || self.data_elements.contains(data_element)
    }
}

/// Subset of `GET /api/system/info`, used as a connectivity probe
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub instance_name: Option<String>,
}

// ============================================================================
// Import envelope
// ============================================================================

/// Envelope of a `POST /api/dataValueSets` response.
///
/// The import report arrives under a nested `response` key; error bodies may
/// carry the same shape, which is why the field is optional here and probed
/// on both paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportEnvelope {
    #[serde(default)]
    pub response: Option<ImportSummary>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Request parameters
// ============================================================================

/// Catalog filter for organisation units
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgUnitFilter {
    /// Restrict to one hierarchy level
    pub level: Option<u32>,

    /// Restrict to an explicit name allow-list
    pub names: Vec<String>,
}

impl OrgUnitFilter {
    pub fn at_level(level: u32) -> Self {
        Self {
            level: Some(level),
            ..Default::default()
        }
    }

    pub fn by_names(names: Vec<String>) -> Self {
        Self {
            names,
            ..Default::default()
        }
    }
}

/// Merge mode of the destination import endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImportStrategy {
    /// Insert new values and update existing ones (idempotent re-submission)
    #[default]
    NewAndUpdates,
    New,
    Updates,
}

impl ImportStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStrategy::NewAndUpdates => "NEW_AND_UPDATES",
            ImportStrategy::New => "NEW",
            ImportStrategy::Updates => "UPDATES",
        }
    }
}

impl std::str::FromStr for ImportStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "NEW_AND_UPDATES" => Ok(ImportStrategy::NewAndUpdates),
            "NEW" => Ok(ImportStrategy::New),
            "UPDATES" => Ok(ImportStrategy::Updates),
            _ => Err(format!("Invalid import strategy: {s}")),
        }
    }
}

/// Options applied to each batch submission
#[derive(Debug, Clone, Default)]
pub struct SubmitOptions {
    pub strategy: ImportStrategy,

    /// Fire-and-forget import: the destination acknowledges without a
    /// synchronous import report
    pub async_import: bool,

    /// Validate without persisting
    pub dry_run: bool,

    pub skip_audit: bool,

    /// Identifier scheme of the submitted references (e.g. `UID`, `CODE`),
    /// when the destination should not assume its default
    pub id_scheme: Option<String>,
}

/// Time scope of one extraction call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeWindow {
    /// Inclusive date range, rendered as `startDate`/`endDate`
    DateRange { start: NaiveDate, end: NaiveDate },

    /// Explicit ISO period identifiers, rendered as repeated `period`
    Periods(Vec<String>),
}

/// Scope of one extraction call: which datasets, which org unit, which time
/// window
#[derive(Debug, Clone)]
pub struct RecordScope {
    pub dataset_ids: Vec<String>,
    pub org_unit: String,
    pub window: TimeWindow,

    /// Include the org unit's subtree in the extraction
    pub children: bool,
}

/// Negotiated payload encoding of an extraction response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayloadFormat {
    #[default]
    Csv,
    Json,
}

impl PayloadFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            PayloadFormat::Csv => "csv",
            PayloadFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for PayloadFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(PayloadFormat::Csv),
            "json" => Ok(PayloadFormat::Json),
            _ => Err(format!("Invalid payload format: {s}")),
        }
    }
}

/// How records are extracted from the source instance.
///
/// The extraction strategies are one polymorphic capability behind
/// `ApiClient::fetch_records`; every variant yields the same staged payload
/// contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMode {
    /// `GET /api/dataValueSets` in the given encoding
    DataValueSets { format: PayloadFormat },

    /// A predefined parameterized SQL view, always CSV with short-code
    /// headers (`dx,pe,ou,co,ao,value`)
    SqlView { view_id: String },
}

impl Default for ExtractionMode {
    fn default() -> Self {
        ExtractionMode::DataValueSets {
            format: PayloadFormat::Csv,
        }
    }
}

// ============================================================================
// Staged payload
// ============================================================================

/// A downloaded extraction payload, staged on disk.
///
/// The backing temp file has a collision-resistant name and is removed when
/// this value drops, on every exit path.
#[derive(Debug)]
pub struct StagedPayload {
    file: NamedTempFile,
    format: PayloadFormat,
    bytes: u64,
}

impl StagedPayload {
    pub fn new(file: NamedTempFile, format: PayloadFormat, bytes: u64) -> Self {
        Self {
            file,
            format,
            bytes,
        }
    }

    pub fn format(&self) -> PayloadFormat {
        self.format
    }

    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn path(&self) -> &std::path::Path {
        self.file.path()
    }

    /// Reopen the staged file for reading from the start.
    pub fn open(&self) -> std::io::Result<std::fs::File> {
        self.file.reopen()
    }
}
