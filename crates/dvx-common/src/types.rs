//! Common types used across DVX
//!
//! The canonical record shape, catalog types, and import-report types shared
//! by the API client and the transfer pipeline.

use crate::error::DvxError;
use serde::{Deserialize, Serialize};

/// Reference to another org unit (parent or child), projected down to its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgUnitRef {
    pub id: String,
}

/// An organisation unit: a node in the location/administrative hierarchy.
///
/// Fetched once per run from the catalog and treated as read-only afterwards.
/// The `children` projection is only used to decide leaf status when the run
/// is scoped to childless units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrgUnit {
    /// Stable catalog identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Depth in the hierarchy (1 = root)
    #[serde(default)]
    pub level: u32,

    /// Parent reference, absent for root units
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<OrgUnitRef>,

    /// Child references, empty for leaf units
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OrgUnitRef>,
}

impl OrgUnit {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent.as_ref().map(|p| p.id.as_str())
    }
}

impl std::fmt::Display for OrgUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Reporting frequency class of a dataset.
///
/// Selects the shape of ISO period identifiers when extraction is
/// period-based rather than date-range based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportingFrequency {
    #[default]
    Monthly,
    Quarterly,
}

impl std::str::FromStr for ReportingFrequency {
    type Err = DvxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monthly" | "month" => Ok(ReportingFrequency::Monthly),
            "quarterly" | "quarter" => Ok(ReportingFrequency::Quarterly),
            _ => Err(DvxError::InvalidFrequency(s.to_string())),
        }
    }
}

impl std::fmt::Display for ReportingFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportingFrequency::Monthly => write!(f, "monthly"),
            ReportingFrequency::Quarterly => write!(f, "quarterly"),
        }
    }
}

/// A dataset to transfer, paired with its reporting frequency.
///
/// The dataset→frequency table is explicit run configuration; it is never
/// inferred from global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSpec {
    pub id: String,
    pub frequency: ReportingFrequency,
}

impl DatasetSpec {
    pub fn new(id: impl Into<String>, frequency: ReportingFrequency) -> Self {
        Self {
            id: id.into(),
            frequency,
        }
    }
}

impl std::str::FromStr for DatasetSpec {
    type Err = DvxError;

    /// Parse an `id` or `id:frequency` pair (e.g. `BfMAe6Itzgt:quarterly`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DvxError::InvalidDatasetSpec(s.to_string()));
        }

        match s.split_once(':') {
            None => Ok(Self::new(s, ReportingFrequency::default())),
            Some((id, freq)) => {
                if id.trim().is_empty() {
                    return Err(DvxError::InvalidDatasetSpec(s.to_string()));
                }
                Ok(Self::new(id.trim(), freq.trim().parse()?))
            },
        }
    }
}

/// A canonical data value record.
///
/// All six mandatory fields are non-empty after trimming; optional metadata
/// fields are carried through untouched when present. Serialized field names
/// match the warehouse API's camelCase wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValue {
    pub data_element: String,
    pub period: String,
    pub org_unit: String,
    pub category_option_combo: String,
    pub attribute_option_combo: String,
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stored_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followup: Option<bool>,
}

/// Counts section of an import report.
///
/// Addition is associative, so per-batch and per-unit counts can be folded
/// into run totals in any completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImportCounts {
    #[serde(default)]
    pub imported: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub ignored: u64,
    #[serde(default)]
    pub deleted: u64,
}

impl ImportCounts {
    pub fn total(&self) -> u64 {
        self.imported + self.updated + self.ignored + self.deleted
    }
}

impl std::ops::AddAssign for ImportCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.imported += rhs.imported;
        self.updated += rhs.updated;
        self.ignored += rhs.ignored;
        self.deleted += rhs.deleted;
    }
}

impl std::ops::Add for ImportCounts {
    type Output = ImportCounts;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl std::fmt::Display for ImportCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "imported={} updated={} ignored={} deleted={}",
            self.imported, self.updated, self.ignored, self.deleted
        )
    }
}

/// A per-record rejection detail from the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    /// Identifier of the rejected object
    #[serde(default)]
    pub object: String,

    /// Human-readable rejection reason
    #[serde(default)]
    pub value: String,
}

/// The destination's structured response to one submitted batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSummary {
    #[serde(flatten)]
    pub counts: ImportCounts,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<Conflict>,

    /// Overall status string reported by the destination, when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ImportSummary {
    /// Fold another summary into this one, keeping conflict detail.
    pub fn merge(&mut self, other: ImportSummary) {
        self.counts += other.counts;
        self.conflicts.extend(other.conflicts);
    }
}
