//! Run configuration
//!
//! A transfer is fully described by a [`TransferConfig`]: endpoints,
//! dataset table, org-unit scope, date range, batching and concurrency
//! factors, and the extraction/normalization policies. Configuration comes
//! from environment variables (optionally via a `.env` file) with CLI
//! overrides applied on top; `validate()` is the fail-fast gate that runs
//! before any network call.

use crate::error::{Result, TransferError};
use crate::normalize::ValuePolicy;
use chrono::NaiveDate;
use dvx_client::{ExtractionMode, ImportStrategy, PayloadFormat};
use dvx_common::period::validate_date_range;
use dvx_common::types::DatasetSpec;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Default number of records per submitted batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default number of units of work in flight.
pub const DEFAULT_CONCURRENCY: usize = 3;

/// One side of the transfer: where to connect and as whom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// How work units are enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// One extraction per org unit covering all configured datasets,
    /// scoped by date range
    #[default]
    PerOrgUnit,

    /// One extraction per (org unit, dataset) pair, scoped by the dataset's
    /// reporting periods
    PerDataset,
}

impl std::str::FromStr for TransferMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "per-org-unit" | "org-unit" => Ok(TransferMode::PerOrgUnit),
            "per-dataset" | "dataset" => Ok(TransferMode::PerDataset),
            _ => Err(format!("Invalid transfer mode: {s}")),
        }
    }
}

/// Full description of one transfer run
#[derive(Debug, Clone)]
pub struct TransferConfig {
    pub source: EndpointConfig,
    pub destination: EndpointConfig,

    /// Datasets to transfer with their reporting frequencies
    pub datasets: Vec<DatasetSpec>,

    /// Restrict org units to one hierarchy level
    pub org_unit_level: Option<u32>,

    /// Restrict org units to a name allow-list
    pub org_unit_names: Vec<String>,

    /// Restrict org units to childless leaves
    pub leaf_only: bool,

    /// Inclusive ISO date range of the transfer
    pub start_date: String,
    pub end_date: String,

    pub batch_size: usize,
    pub concurrency: usize,

    pub mode: TransferMode,
    pub extraction: ExtractionMode,
    pub value_policy: ValuePolicy,
    pub strategy: ImportStrategy,

    /// Identifier scheme the destination should resolve references under
    pub id_scheme: Option<String>,

    /// Fire-and-forget imports (no synchronous import report)
    pub async_import: bool,

    /// Validate on the destination without persisting
    pub dry_run: bool,

    /// Extract each org unit's subtree, not just the unit itself
    pub include_children: bool,
}

impl TransferConfig {
    /// Load configuration from `DVX_*` environment variables.
    ///
    /// Mandatory: both endpoints (`DVX_SOURCE_URL`, `DVX_SOURCE_USER`,
    /// `DVX_SOURCE_PASSWORD` and the `DVX_DEST_*` mirror), `DVX_DATASETS`
    /// (comma-separated `id` or `id:frequency` entries), `DVX_START_DATE`
    /// and `DVX_END_DATE`. Everything else has a default.
    pub fn from_env() -> Result<Self> {
        let datasets = required("DVX_DATASETS")?
            .split(',')
            .filter(|s| !s.trim().is_empty())
            .map(|s| s.parse::<DatasetSpec>().map_err(TransferError::from))
            .collect::<Result<Vec<_>>>()?;

        let extraction = match optional("DVX_SQL_VIEW") {
            Some(view_id) => ExtractionMode::SqlView { view_id },
            None => ExtractionMode::DataValueSets {
                format: parse_or_default::<PayloadFormat>("DVX_FORMAT")?,
            },
        };

        Ok(Self {
            source: EndpointConfig {
                base_url: required("DVX_SOURCE_URL")?,
                username: required("DVX_SOURCE_USER")?,
                password: required("DVX_SOURCE_PASSWORD")?,
            },
            destination: EndpointConfig {
                base_url: required("DVX_DEST_URL")?,
                username: required("DVX_DEST_USER")?,
                password: required("DVX_DEST_PASSWORD")?,
            },
            datasets,
            org_unit_level: parse_optional("DVX_ORG_UNIT_LEVEL")?,
            org_unit_names: optional("DVX_ORG_UNITS")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            leaf_only: flag("DVX_LEAF_ONLY"),
            start_date: required("DVX_START_DATE")?,
            end_date: required("DVX_END_DATE")?,
            batch_size: parse_optional("DVX_BATCH_SIZE")?.unwrap_or(DEFAULT_BATCH_SIZE),
            concurrency: parse_optional("DVX_CONCURRENCY")?.unwrap_or(DEFAULT_CONCURRENCY),
            mode: parse_or_default("DVX_MODE")?,
            extraction,
            value_policy: parse_or_default("DVX_VALUE_POLICY")?,
            strategy: parse_or_default("DVX_STRATEGY")?,
            id_scheme: optional("DVX_ID_SCHEME"),
            async_import: flag("DVX_ASYNC"),
            dry_run: flag("DVX_DRY_RUN"),
            include_children: flag("DVX_INCLUDE_CHILDREN"),
        })
    }

    /// Fail-fast validation; returns the parsed date range.
    ///
    /// Must pass before any network call is issued.
    pub fn validate(&self) -> Result<(NaiveDate, NaiveDate)> {
        if self.source.base_url.trim().is_empty() {
            return Err(TransferError::config("source base URL is empty"));
        }
        if self.destination.base_url.trim().is_empty() {
            return Err(TransferError::config("destination base URL is empty"));
        }
        if self.datasets.is_empty() {
            return Err(TransferError::config("no datasets configured"));
        }
        if self.batch_size == 0 {
            return Err(TransferError::config("batch size must be positive"));
        }
        if self.concurrency == 0 {
            return Err(TransferError::config("concurrency must be positive"));
        }

        let range = validate_date_range(&self.start_date, &self.end_date)?;
        Ok(range)
    }

    pub fn dataset_ids(&self) -> Vec<String> {
        self.datasets.iter().map(|d| d.id.clone()).collect()
    }
}

fn required(name: &str) -> Result<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| TransferError::config(format!("{name} is not set")))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn flag(name: &str) -> bool {
    optional(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parse_optional<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|e| TransferError::config(format!("{name}: {e}"))),
    }
}

fn parse_or_default<T>(name: &str) -> Result<T>
where
    T: std::str::FromStr + Default,
    T::Err: std::fmt::Display,
{
    Ok(parse_optional(name)?.unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod tests_support {
    use super::*;

    /// A valid baseline configuration for unit tests.
    pub(crate) fn base_config() -> TransferConfig {
        TransferConfig {
            source: EndpointConfig {
                base_url: "http://source:8080".to_string(),
                username: "admin".to_string(),
                password: "district".to_string(),
            },
            destination: EndpointConfig {
                base_url: "http://dest:8080".to_string(),
                username: "admin".to_string(),
                password: "district".to_string(),
            },
            datasets: vec!["BfMAe6Itzgt".parse().unwrap()],
            org_unit_level: Some(3),
            org_unit_names: vec![],
            leaf_only: false,
            start_date: "2024-01-01".to_string(),
            end_date: "2024-06-30".to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            mode: TransferMode::default(),
            extraction: ExtractionMode::default(),
            value_policy: ValuePolicy::default(),
            strategy: ImportStrategy::default(),
            id_scheme: None,
            async_import: false,
            dry_run: false,
            include_children: false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::tests_support::base_config;
    use super::*;

    #[test]
    fn test_validate_accepts_well_formed_config() {
        let (start, end) = base_config().validate().unwrap();
        assert_eq!(start.to_string(), "2024-01-01");
        assert_eq!(end.to_string(), "2024-06-30");
    }

    #[test]
    fn test_validate_rejects_malformed_date() {
        let mut config = base_config();
        config.start_date = "2024-13-01".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("2024-13-01"));
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let mut config = base_config();
        config.start_date = "2024-07-01".to_string();
        config.end_date = "2024-01-01".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_degenerate_factors() {
        let mut config = base_config();
        config.batch_size = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = base_config();
        config.datasets.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_env_round_trip() {
        let vars = [
            ("DVX_SOURCE_URL", "http://source:8080"),
            ("DVX_SOURCE_USER", "admin"),
            ("DVX_SOURCE_PASSWORD", "district"),
            ("DVX_DEST_URL", "http://dest:8080"),
            ("DVX_DEST_USER", "admin"),
            ("DVX_DEST_PASSWORD", "district"),
            ("DVX_DATASETS", "BfMAe6Itzgt, QX4ZTUbOt3a:quarterly"),
            ("DVX_START_DATE", "2024-01-01"),
            ("DVX_END_DATE", "2024-06-30"),
            ("DVX_BATCH_SIZE", "250"),
            ("DVX_MODE", "per-dataset"),
            ("DVX_VALUE_POLICY", "truncate"),
            ("DVX_LEAF_ONLY", "true"),
        ];
        for (name, value) in vars {
            std::env::set_var(name, value);
        }

        let config = TransferConfig::from_env().unwrap();
        for (name, _) in vars {
            std::env::remove_var(name);
        }

        assert_eq!(config.datasets.len(), 2);
        assert_eq!(config.datasets[1].id, "QX4ZTUbOt3a");
        assert_eq!(config.batch_size, 250);
        assert_eq!(config.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.mode, TransferMode::PerDataset);
        assert_eq!(config.value_policy, ValuePolicy::TruncateIntegral);
        assert!(config.leaf_only);
        assert!(!config.dry_run);
        config.validate().unwrap();
    }

    #[test]
    fn test_transfer_mode_parsing() {
        assert_eq!(
            "per-dataset".parse::<TransferMode>().unwrap(),
            TransferMode::PerDataset
        );
        assert_eq!(
            "PER_ORG_UNIT".parse::<TransferMode>().unwrap(),
            TransferMode::PerOrgUnit
        );
        assert!("broadcast".parse::<TransferMode>().is_err());
    }
}
