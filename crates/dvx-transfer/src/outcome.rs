//! Per-unit outcomes and the run summary
//!
//! Each unit of work produces one [`UnitOutcome`]; the orchestrator folds
//! them into a [`TransferSummary`] as they complete. Folding is associative,
//! so completion order never changes the totals.

use crate::error::TransferError;
use dvx_common::types::{Conflict, ImportCounts};
use std::time::Duration;

/// Result of the batches submitted for one unit of work
#[derive(Debug, Clone, Default)]
pub struct UnitReport {
    /// Summed destination counts across this unit's batches
    pub counts: ImportCounts,

    /// Conflict details returned by the destination, including those
    /// salvaged from rejected batches
    pub conflicts: Vec<Conflict>,

    /// Raw records decoded from the staged payload
    pub records_read: u64,

    /// Records excluded before submission (invalid or foreign to the
    /// requested datasets); a tolerance counter, not an error
    pub records_dropped: u64,

    /// Batches submitted, including rejected ones
    pub batches_submitted: u64,

    /// Per-batch submission failures; the unit keeps going past these
    pub batch_failures: Vec<String>,
}

impl UnitReport {
    pub fn is_clean(&self) -> bool {
        self.batch_failures.is_empty() && self.conflicts.is_empty()
    }
}

/// Outcome of one unit of work: a report, or the error that stopped it
#[derive(Debug)]
pub struct UnitOutcome {
    /// Display label, e.g. `Bo (O6uvpzGd5pu)`
    pub label: String,

    /// Org unit id of this unit of work
    pub org_unit_id: String,

    pub result: Result<UnitReport, TransferError>,
}

/// A failed unit as reported in the summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUnit {
    pub label: String,
    pub message: String,
}

/// Aggregate of a whole run
#[derive(Debug, Default)]
pub struct TransferSummary {
    /// Run-wide sum of destination counts
    pub totals: ImportCounts,

    /// Units enumerated for this run
    pub units_total: usize,

    pub units_succeeded: usize,
    pub units_failed: usize,

    /// Units never admitted because the run was cancelled
    pub units_skipped: usize,

    pub records_read: u64,
    pub records_dropped: u64,
    pub batches_submitted: u64,

    /// Total conflict details across all units
    pub conflicts: u64,

    /// Every failed unit, individually inspectable
    pub failed: Vec<FailedUnit>,

    pub elapsed: Duration,

    /// All per-unit outcomes, in completion order
    pub outcomes: Vec<UnitOutcome>,
}

impl TransferSummary {
    pub fn new(units_total: usize) -> Self {
        Self {
            units_total,
            ..Default::default()
        }
    }

    /// Fold one completed unit into the run totals.
    pub fn absorb(&mut self, outcome: UnitOutcome) {
        match &outcome.result {
            Ok(report) => {
                self.units_succeeded += 1;
                self.totals += report.counts;
                self.records_read += report.records_read;
                self.records_dropped += report.records_dropped;
                self.batches_submitted += report.batches_submitted;
                self.conflicts += report.conflicts.len() as u64;
            },
            Err(err) => {
                self.units_failed += 1;
                self.failed.push(FailedUnit {
                    label: outcome.label.clone(),
                    message: err.to_string(),
                });
            },
        }
        self.outcomes.push(outcome);
    }

    pub fn skip(&mut self) {
        self.units_skipped += 1;
    }

    /// The outcome recorded for a given org unit, if any.
    pub fn outcome_for(&self, org_unit_id: &str) -> Option<&UnitOutcome> {
        self.outcomes.iter().find(|o| o.org_unit_id == org_unit_id)
    }
}

impl std::fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Transfer complete in {:.1?}: {} units ({} ok, {} failed, {} skipped)",
            self.elapsed, self.units_total, self.units_succeeded, self.units_failed,
            self.units_skipped
        )?;
        writeln!(
            f,
            "  {} | read={} dropped={} batches={} conflicts={}",
            self.totals, self.records_read, self.records_dropped, self.batches_submitted,
            self.conflicts
        )?;
        for unit in &self.failed {
            writeln!(f, "  FAILED {}: {}", unit.label, unit.message)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::TransferError;

    fn ok_outcome(id: &str, imported: u64) -> UnitOutcome {
        UnitOutcome {
            label: format!("Unit {id}"),
            org_unit_id: id.to_string(),
            result: Ok(UnitReport {
                counts: ImportCounts {
                    imported,
                    ..Default::default()
                },
                records_read: imported,
                batches_submitted: 1,
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_absorb_accumulates_totals() {
        let mut summary = TransferSummary::new(3);
        summary.absorb(ok_outcome("a", 5));
        summary.absorb(ok_outcome("b", 7));
        summary.absorb(UnitOutcome {
            label: "Unit c".to_string(),
            org_unit_id: "c".to_string(),
            result: Err(TransferError::parse("truncated payload")),
        });

        assert_eq!(summary.units_total, 3);
        assert_eq!(summary.units_succeeded, 2);
        assert_eq!(summary.units_failed, 1);
        assert_eq!(summary.totals.imported, 12);
        assert_eq!(summary.batches_submitted, 2);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].label, "Unit c");
        assert!(summary.failed[0].message.contains("truncated payload"));
    }

    #[test]
    fn test_absorb_is_order_independent() {
        let mut forward = TransferSummary::new(2);
        forward.absorb(ok_outcome("a", 5));
        forward.absorb(ok_outcome("b", 7));

        let mut reverse = TransferSummary::new(2);
        reverse.absorb(ok_outcome("b", 7));
        reverse.absorb(ok_outcome("a", 5));

        assert_eq!(forward.totals, reverse.totals);
        assert_eq!(forward.units_succeeded, reverse.units_succeeded);
    }

    #[test]
    fn test_outcome_lookup() {
        let mut summary = TransferSummary::new(1);
        summary.absorb(ok_outcome("a", 1));
        assert!(summary.outcome_for("a").is_some());
        assert!(summary.outcome_for("zz").is_none());
    }
}
