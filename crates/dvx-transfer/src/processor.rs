//! Unit-of-work processor
//!
//! Drives one (org unit × dataset scope) pair through
//! `FETCHING → PARSING → (BATCHING ⇄ SUBMITTING)* → DONE | FAILED`.
//!
//! Parsing is pull-based: a completed batch is submitted before any further
//! input is decoded, so memory is bounded by one batch plus the reader's
//! buffer no matter how large the staged payload is. A failed batch is
//! recorded and the unit moves on to the next one; only fetch and structural
//! parse failures stop a unit.

use crate::batch::batches;
use crate::error::{Result, TransferError};
use crate::normalize::{normalize_json, HeaderMap, ValuePolicy};
use crate::outcome::{UnitOutcome, UnitReport};
use dvx_client::{
    ApiClient, DatasetMembership, ExtractionMode, PayloadFormat, RecordScope, StagedPayload,
    SubmitOptions, TimeWindow,
};
use dvx_common::types::{DataValue, DatasetSpec, OrgUnit};
use std::cell::{Cell, RefCell};
use tracing::{debug, warn};

/// One unit of work: an org unit, the datasets extracted for it, and the
/// time window of the extraction.
#[derive(Debug, Clone)]
pub struct WorkUnit {
    pub org_unit: OrgUnit,
    pub datasets: Vec<DatasetSpec>,
    pub window: TimeWindow,
}

impl WorkUnit {
    /// Display label used in logs and the run summary.
    pub fn label(&self) -> String {
        match self.datasets.as_slice() {
            [single] => format!("{} / {}", self.org_unit, single.id),
            _ => self.org_unit.to_string(),
        }
    }

    fn scope(&self, include_children: bool) -> RecordScope {
        RecordScope {
            dataset_ids: self.datasets.iter().map(|d| d.id.clone()).collect(),
            org_unit: self.org_unit.id.clone(),
            window: self.window.clone(),
            children: include_children,
        }
    }
}

/// Read-only context shared by all units of one run
pub struct UnitContext<'a> {
    pub source: &'a ApiClient,
    pub destination: &'a ApiClient,

    /// Permitted data elements; records outside it are dropped
    pub membership: &'a DatasetMembership,

    pub extraction: &'a ExtractionMode,
    pub submit_options: &'a SubmitOptions,
    pub batch_size: usize,
    pub value_policy: ValuePolicy,
    pub include_children: bool,
}

/// Process one unit of work to completion.
///
/// Never propagates an error: every failure mode ends up inside the returned
/// outcome so sibling units are unaffected.
pub async fn process_unit(ctx: &UnitContext<'_>, unit: &WorkUnit) -> UnitOutcome {
    let label = unit.label();
    debug!(unit = %label, "Processing unit of work");

    let result = run_unit(ctx, unit).await;
    match &result {
        Ok(report) => debug!(
            unit = %label,
            counts = %report.counts,
            read = report.records_read,
            dropped = report.records_dropped,
            "Unit of work complete"
        ),
        Err(err) => warn!(unit = %label, error = %err, "Unit of work failed"),
    }

    UnitOutcome {
        label,
        org_unit_id: unit.org_unit.id.clone(),
        result,
    }
}

async fn run_unit(ctx: &UnitContext<'_>, unit: &WorkUnit) -> Result<UnitReport> {
    // The staged payload is a temp file; dropping it at any exit out of this
    // function removes the file.
    let payload = ctx
        .source
        .fetch_records(&unit.scope(ctx.include_children), ctx.extraction)
        .await
        .map_err(TransferError::Fetch)?;

    match payload.format() {
        PayloadFormat::Csv => drain_csv(ctx, &payload).await,
        PayloadFormat::Json => drain_json(ctx, &payload).await,
    }
}

/// Stream a staged CSV payload through normalize → batch → submit.
async fn drain_csv(ctx: &UnitContext<'_>, payload: &StagedPayload) -> Result<UnitReport> {
    let mut report = UnitReport::default();

    // An empty body means the scope simply has no records
    if payload.bytes() == 0 {
        return Ok(report);
    }

    let file = payload
        .open()
        .map_err(|e| TransferError::parse(format!("cannot reopen staged payload: {e}")))?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| TransferError::parse(format!("unreadable CSV header: {e}")))?
        .clone();
    let header_map = HeaderMap::from_headers(&headers)?;

    let read = Cell::new(0u64);
    let dropped = Cell::new(0u64);
    let row_error: RefCell<Option<csv::Error>> = RefCell::new(None);

    {
        // A decode error ends the stream; the cell is checked before any
        // batch it may have truncated is submitted.
        let rows = reader.into_records().map_while(|row| match row {
            Ok(row) => Some(row),
            Err(err) => {
                *row_error.borrow_mut() = Some(err);
                None
            },
        });
        let values = rows.filter_map(|row| {
            read.set(read.get() + 1);
            match header_map.normalize_row(&row, ctx.value_policy) {
                Some(value) if ctx.membership.permits(&value.data_element) => Some(value),
                _ => {
                    dropped.set(dropped.get() + 1);
                    None
                },
            }
        });

        for batch in batches(values, ctx.batch_size) {
            if row_error.borrow().is_some() {
                break;
            }
            submit(ctx, &mut report, batch).await;
        }
    }

    if let Some(err) = row_error.into_inner() {
        return Err(TransferError::parse(format!(
            "CSV decode failed after {} records: {err}",
            read.get()
        )));
    }

    report.records_read = read.get();
    report.records_dropped = dropped.get();
    Ok(report)
}

#[derive(serde::Deserialize)]
struct JsonPayload {
    #[serde(default, rename = "dataValues")]
    data_values: Vec<serde_json::Value>,
}

/// Decode a staged JSON payload and run it through the same batch ⇄ submit
/// alternation.
async fn drain_json(ctx: &UnitContext<'_>, payload: &StagedPayload) -> Result<UnitReport> {
    let mut report = UnitReport::default();

    if payload.bytes() == 0 {
        return Ok(report);
    }

    let file = payload
        .open()
        .map_err(|e| TransferError::parse(format!("cannot reopen staged payload: {e}")))?;
    let parsed: JsonPayload = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| TransferError::parse(format!("JSON decode failed: {e}")))?;

    report.records_read = parsed.data_values.len() as u64;

    let dropped = Cell::new(0u64);
    {
        let values = parsed.data_values.iter().filter_map(|record| {
            match normalize_json(record, ctx.value_policy) {
                Some(value) if ctx.membership.permits(&value.data_element) => Some(value),
                _ => {
                    dropped.set(dropped.get() + 1);
                    None
                },
            }
        });

        for batch in batches(values, ctx.batch_size) {
            submit(ctx, &mut report, batch).await;
        }
    }

    report.records_dropped = dropped.get();
    Ok(report)
}

/// Submit one batch and fold its result into the unit report.
///
/// A rejected batch contributes its salvaged counts and conflicts (when the
/// destination's error body carried a report) and a failure entry; the unit
/// continues with the next batch either way.
async fn submit(ctx: &UnitContext<'_>, report: &mut UnitReport, batch: Vec<DataValue>) {
    let records = batch.len();
    report.batches_submitted += 1;

    match ctx
        .destination
        .submit_batch(&batch, ctx.submit_options)
        .await
    {
        Ok(summary) => {
            report.counts += summary.counts;
            report.conflicts.extend(summary.conflicts);
        },
        Err(err) => {
            if let Some(salvaged) = err.salvaged_summary() {
                report.counts += salvaged.counts;
                report.conflicts.extend(salvaged.conflicts.iter().cloned());
            }
            warn!(records, error = %err, "Batch submission failed");
            report.batch_failures.push(err.to_string());
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn org_unit(id: &str, name: &str) -> OrgUnit {
        OrgUnit {
            id: id.to_string(),
            name: name.to_string(),
            level: 2,
            parent: None,
            children: vec![],
        }
    }

    #[test]
    fn test_unit_labels() {
        let single = WorkUnit {
            org_unit: org_unit("O6uvpzGd5pu", "Bo"),
            datasets: vec!["BfMAe6Itzgt".parse().unwrap()],
            window: TimeWindow::Periods(vec!["202401".to_string()]),
        };
        assert_eq!(single.label(), "Bo (O6uvpzGd5pu) / BfMAe6Itzgt");

        let multi = WorkUnit {
            datasets: vec![
                "BfMAe6Itzgt".parse().unwrap(),
                "QX4ZTUbOt3a".parse().unwrap(),
            ],
            ..single
        };
        assert_eq!(multi.label(), "Bo (O6uvpzGd5pu)");
    }

    #[test]
    fn test_scope_carries_all_dataset_ids() {
        let unit = WorkUnit {
            org_unit: org_unit("O6uvpzGd5pu", "Bo"),
            datasets: vec![
                "BfMAe6Itzgt".parse().unwrap(),
                "QX4ZTUbOt3a".parse().unwrap(),
            ],
            window: TimeWindow::Periods(vec!["202401".to_string()]),
        };

        let scope = unit.scope(true);
        assert_eq!(scope.dataset_ids, vec!["BfMAe6Itzgt", "QX4ZTUbOt3a"]);
        assert_eq!(scope.org_unit, "O6uvpzGd5pu");
        assert!(scope.children);
    }
}
