//! Reporting periods and date-range validation
//!
//! The warehouse API accepts either a `startDate`/`endDate` pair or explicit
//! ISO period identifiers (`YYYYMM` for monthly data, `YYYYQn` for quarterly).
//! This module validates operator-supplied date ranges before any network
//! call is issued and expands a range into the period identifiers a dataset's
//! reporting frequency requires.

use crate::error::{DvxError, Result};
use crate::types::ReportingFrequency;
use chrono::{Datelike, NaiveDate};

/// Parse a single `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| DvxError::invalid_date(value.trim()))
}

/// Validate a date range: both ends well-formed and `start <= end`.
///
/// This is the fail-fast gate for the whole run; callers must not issue any
/// network call before it passes.
pub fn validate_date_range(start: &str, end: &str) -> Result<(NaiveDate, NaiveDate)> {
    let start_date = parse_date(start)?;
    let end_date = parse_date(end)?;

    if start_date > end_date {
        return Err(DvxError::InvalidDateRange {
            start: start_date.to_string(),
            end: end_date.to_string(),
        });
    }

    Ok((start_date, end_date))
}

/// Expand a date range into the ISO period identifiers of the given
/// reporting frequency, in chronological order.
///
/// Any period overlapping the range is included, so a range starting
/// mid-month still covers that month.
pub fn periods_in_range(
    frequency: ReportingFrequency,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<String> {
    let mut periods = Vec::new();
    let mut year = start.year();
    let mut month = start.month();

    while (year, month) <= (end.year(), end.month()) {
        let period = match frequency {
            ReportingFrequency::Monthly => format!("{year}{month:02}"),
            ReportingFrequency::Quarterly => format!("{year}Q{}", quarter_of(month)),
        };
        if periods.last() != Some(&period) {
            periods.push(period);
        }

        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }

    periods
}

fn quarter_of(month: u32) -> u32 {
    (month - 1) / 3 + 1
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_rejects_malformed_input() {
        assert!(parse_date("2024-01-01").is_ok());
        assert!(parse_date(" 2024-01-01 ").is_ok());
        assert!(parse_date("2024-13-01").is_err());
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("01/02/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_validate_date_range_ordering() {
        assert!(validate_date_range("2024-01-01", "2024-01-01").is_ok());
        assert!(validate_date_range("2024-01-01", "2024-12-31").is_ok());

        let err = validate_date_range("2024-06-01", "2024-01-01").unwrap_err();
        assert!(matches!(err, DvxError::InvalidDateRange { .. }));
    }

    #[test]
    fn test_monthly_periods() {
        let (start, end) = validate_date_range("2023-11-15", "2024-02-03").unwrap();
        let periods = periods_in_range(ReportingFrequency::Monthly, start, end);
        assert_eq!(periods, vec!["202311", "202312", "202401", "202402"]);
    }

    #[test]
    fn test_quarterly_periods_deduplicate_within_quarter() {
        let (start, end) = validate_date_range("2024-01-01", "2024-08-31").unwrap();
        let periods = periods_in_range(ReportingFrequency::Quarterly, start, end);
        assert_eq!(periods, vec!["2024Q1", "2024Q2", "2024Q3"]);
    }

    #[test]
    fn test_single_day_range_yields_one_period() {
        let (start, end) = validate_date_range("2024-05-10", "2024-05-10").unwrap();
        assert_eq!(
            periods_in_range(ReportingFrequency::Monthly, start, end),
            vec!["202405"]
        );
        assert_eq!(
            periods_in_range(ReportingFrequency::Quarterly, start, end),
            vec!["2024Q2"]
        );
    }
}
