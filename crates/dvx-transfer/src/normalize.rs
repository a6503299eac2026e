//! Record normalization
//!
//! Converts one raw extraction row into a canonical [`DataValue`], or drops
//! it. A record survives when all six mandatory fields are present and
//! non-blank after trimming; anything else is excluded silently and counted
//! by the caller. Malformed rows are routine in large extractions and must
//! never abort a transfer.
//!
//! Two header schemes exist in the wild: the long lower-case names of the
//! data-value export (`dataelement,period,orgunit,...`) and the short codes
//! of SQL-view extractions (`dx,pe,ou,value,co,ao`). Both resolve to the same
//! [`HeaderMap`].

use crate::error::{Result, TransferError};
use dvx_common::types::DataValue;

/// Policy applied to the `value` field after trimming.
///
/// Some feeds carry integral measures serialized as floats ("12.0"); the
/// truncating policy reduces those to their integer part. It is an explicit
/// opt-in and never the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValuePolicy {
    #[default]
    Preserve,
    TruncateIntegral,
}

impl std::str::FromStr for ValuePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "preserve" | "raw" => Ok(ValuePolicy::Preserve),
            "truncate" | "integral" => Ok(ValuePolicy::TruncateIntegral),
            _ => Err(format!("Invalid value policy: {s}")),
        }
    }
}

/// Column positions of one payload's header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    data_element: usize,
    period: usize,
    org_unit: usize,
    category_option_combo: usize,
    attribute_option_combo: usize,
    value: usize,
    stored_by: Option<usize>,
    last_updated: Option<usize>,
    comment: Option<usize>,
    followup: Option<usize>,
}

impl HeaderMap {
    /// Resolve the header row of a staged CSV payload.
    ///
    /// Fails with a parse error when the mandatory columns cannot be found
    /// under either scheme; the payload is then structurally unreadable.
    pub fn from_headers(headers: &csv::StringRecord) -> Result<Self> {
        let position = |names: &[&str]| -> Option<usize> {
            headers
                .iter()
                .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
        };

        let mandatory = |names: &[&str]| -> Result<usize> {
            position(names).ok_or_else(|| {
                TransferError::parse(format!(
                    "missing mandatory column {:?} in header {:?}",
                    names[0], headers
                ))
            })
        };

        Ok(Self {
            data_element: mandatory(&["dataelement", "dx"])?,
            period: mandatory(&["period", "pe"])?,
            org_unit: mandatory(&["orgunit", "ou"])?,
            category_option_combo: mandatory(&["categoryoptioncombo", "co"])?,
            attribute_option_combo: mandatory(&["attributeoptioncombo", "ao"])?,
            value: mandatory(&["value"])?,
            stored_by: position(&["storedby"]),
            last_updated: position(&["lastupdated"]),
            comment: position(&["comment"]),
            followup: position(&["followup"]),
        })
    }

    /// Normalize one CSV row. `None` means the row is dropped.
    pub fn normalize_row(&self, row: &csv::StringRecord, policy: ValuePolicy) -> Option<DataValue> {
        let field = |idx: usize| row.get(idx).map(str::trim).filter(|s| !s.is_empty());
        let optional =
            |idx: Option<usize>| idx.and_then(|i| field(i)).map(ToString::to_string);

        Some(DataValue {
            data_element: field(self.data_element)?.to_string(),
            period: field(self.period)?.to_string(),
            org_unit: field(self.org_unit)?.to_string(),
            category_option_combo: field(self.category_option_combo)?.to_string(),
            attribute_option_combo: field(self.attribute_option_combo)?.to_string(),
            value: apply_value_policy(field(self.value)?, policy),
            stored_by: optional(self.stored_by),
            last_updated: optional(self.last_updated),
            comment: optional(self.comment),
            followup: self
                .followup
                .and_then(|i| field(i))
                .and_then(|s| s.parse().ok()),
        })
    }
}

/// Normalize one JSON record from a data-value export.
///
/// JSON payloads already carry canonical camelCase names; the validity
/// predicate is the same as for CSV rows.
pub fn normalize_json(record: &serde_json::Value, policy: ValuePolicy) -> Option<DataValue> {
    let field = |name: &str| {
        record
            .get(name)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    };

    Some(DataValue {
        data_element: field("dataElement")?.to_string(),
        period: field("period")?.to_string(),
        org_unit: field("orgUnit")?.to_string(),
        category_option_combo: field("categoryOptionCombo")?.to_string(),
        attribute_option_combo: field("attributeOptionCombo")?.to_string(),
        value: apply_value_policy(field("value")?, policy),
        stored_by: field("storedBy").map(ToString::to_string),
        last_updated: field("lastUpdated").map(ToString::to_string),
        comment: field("comment").map(ToString::to_string),
        followup: record.get("followup").and_then(|v| v.as_bool()),
    })
}

/// Apply the value policy to an already-trimmed value.
fn apply_value_policy(value: &str, policy: ValuePolicy) -> String {
    match policy {
        ValuePolicy::Preserve => value.to_string(),
        ValuePolicy::TruncateIntegral => match value.parse::<f64>() {
            Ok(parsed) if value.contains('.') && parsed.is_finite() => {
                format!("{}", parsed.trunc() as i64)
            },
            _ => value.to_string(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const LONG_HEADER: &[&str] = &[
        "dataelement",
        "period",
        "orgunit",
        "categoryoptioncombo",
        "attributeoptioncombo",
        "value",
        "storedby",
        "lastupdated",
        "comment",
        "followup",
    ];

    fn header(fields: &[&str]) -> HeaderMap {
        HeaderMap::from_headers(&csv::StringRecord::from(fields.to_vec())).unwrap()
    }

    fn row(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    #[test]
    fn test_long_header_scheme() {
        let map = header(LONG_HEADER);
        let value = map
            .normalize_row(
                &row(&[
                    "FTRrcoaog83",
                    "202401",
                    "O6uvpzGd5pu",
                    "HllvX50cXC0",
                    "HllvX50cXC0",
                    " 12 ",
                    "admin",
                    "2024-02-01",
                    "",
                    "false",
                ]),
                ValuePolicy::Preserve,
            )
            .unwrap();

        assert_eq!(value.data_element, "FTRrcoaog83");
        assert_eq!(value.value, "12");
        assert_eq!(value.stored_by.as_deref(), Some("admin"));
        assert_eq!(value.comment, None);
        assert_eq!(value.followup, Some(false));
    }

    #[test]
    fn test_short_header_scheme() {
        let map = header(&["dx", "pe", "ou", "co", "ao", "value"]);
        let value = map
            .normalize_row(
                &row(&["FTRrcoaog83", "2024Q1", "O6uvpzGd5pu", "a", "b", "7"]),
                ValuePolicy::Preserve,
            )
            .unwrap();

        assert_eq!(value.period, "2024Q1");
        assert_eq!(value.value, "7");
        assert_eq!(value.stored_by, None);
    }

    #[test]
    fn test_unknown_header_scheme_is_a_parse_error() {
        let headers = csv::StringRecord::from(vec!["element", "time", "place", "count"]);
        assert!(HeaderMap::from_headers(&headers).is_err());
    }

    #[test]
    fn test_blank_mandatory_field_drops_row() {
        let map = header(&["dx", "pe", "ou", "co", "ao", "value"]);

        // Each mandatory field blank (or whitespace) in turn
        for blank in 0..6 {
            let mut fields = vec!["FTRrcoaog83", "202401", "O6uvpzGd5pu", "a", "b", "5"];
            fields[blank] = "   ";
            assert!(
                map.normalize_row(&row(&fields), ValuePolicy::Preserve).is_none(),
                "blank field {blank} should drop the row"
            );
        }
    }

    #[test]
    fn test_short_row_drops_instead_of_panicking() {
        let map = header(LONG_HEADER);
        assert!(map
            .normalize_row(&row(&["FTRrcoaog83", "202401"]), ValuePolicy::Preserve)
            .is_none());
    }

    #[test]
    fn test_truncate_policy() {
        assert_eq!(apply_value_policy("12.7", ValuePolicy::TruncateIntegral), "12");
        assert_eq!(apply_value_policy("12.0", ValuePolicy::TruncateIntegral), "12");
        assert_eq!(apply_value_policy("-3.9", ValuePolicy::TruncateIntegral), "-3");
        // Already integral or non-numeric values pass through
        assert_eq!(apply_value_policy("12", ValuePolicy::TruncateIntegral), "12");
        assert_eq!(
            apply_value_policy("positive", ValuePolicy::TruncateIntegral),
            "positive"
        );
        // Default policy never rewrites
        assert_eq!(apply_value_policy("12.7", ValuePolicy::Preserve), "12.7");
    }

    #[test]
    fn test_normalize_json() {
        let record = serde_json::json!({
            "dataElement": "FTRrcoaog83",
            "period": "202401",
            "orgUnit": "O6uvpzGd5pu",
            "categoryOptionCombo": "HllvX50cXC0",
            "attributeOptionCombo": "HllvX50cXC0",
            "value": " 9.5 ",
            "storedBy": "admin",
            "followup": true
        });

        let value = normalize_json(&record, ValuePolicy::Preserve).unwrap();
        assert_eq!(value.value, "9.5");
        assert_eq!(value.followup, Some(true));

        let truncated = normalize_json(&record, ValuePolicy::TruncateIntegral).unwrap();
        assert_eq!(truncated.value, "9");
    }

    #[test]
    fn test_normalize_json_missing_field_drops() {
        let record = serde_json::json!({
            "dataElement": "FTRrcoaog83",
            "period": "202401",
            "value": "9"
        });
        assert!(normalize_json(&record, ValuePolicy::Preserve).is_none());
    }
}
