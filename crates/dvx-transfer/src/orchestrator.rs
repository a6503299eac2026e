//! Transfer orchestrator
//!
//! Resolves the run scope (org units, dataset membership), enumerates units
//! of work, executes them under bounded concurrency, and folds outcomes into
//! the run summary. Errors local to one unit never abort the run; only
//! configuration errors are fatal, and those surface before any network
//! call.

use crate::config::{TransferConfig, TransferMode};
use crate::error::{Result, TransferError};
use crate::outcome::TransferSummary;
use crate::processor::{process_unit, UnitContext, WorkUnit};
use crate::progress;
use chrono::NaiveDate;
use dvx_client::{ApiClient, OrgUnitFilter, SubmitOptions, TimeWindow};
use dvx_common::period::periods_in_range;
use dvx_common::types::OrgUnit;
use futures::StreamExt;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Drives one transfer run end to end
pub struct Orchestrator {
    config: TransferConfig,
    source: ApiClient,
    destination: ApiClient,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(config: TransferConfig) -> Result<Self> {
        let source = ApiClient::new(
            config.source.base_url.clone(),
            config.source.username.clone(),
            config.source.password.clone(),
        )
        .map_err(|e| TransferError::config(format!("source client: {e}")))?;

        let destination = ApiClient::new(
            config.destination.base_url.clone(),
            config.destination.username.clone(),
            config.destination.password.clone(),
        )
        .map_err(|e| TransferError::config(format!("destination client: {e}")))?;

        Ok(Self {
            config,
            source,
            destination,
            cancel: CancellationToken::new(),
        })
    }

    /// Token that stops admission of new units of work when cancelled.
    /// In-flight units finish (or fail) cleanly.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the run and return its summary.
    pub async fn run(&self) -> Result<TransferSummary> {
        let started = Instant::now();

        // Fail-fast gate: nothing touches the network before this passes
        let (start, end) = self.config.validate()?;

        let filter = OrgUnitFilter {
            level: self.config.org_unit_level,
            names: self.config.org_unit_names.clone(),
        };
        let mut org_units = self
            .source
            .list_org_units(&filter)
            .await
            .map_err(TransferError::Upstream)?;
        if self.config.leaf_only {
            org_units.retain(OrgUnit::is_leaf);
        }
        info!(units = org_units.len(), "Resolved org-unit scope");

        let membership = self
            .source
            .list_dataset_elements(&self.config.dataset_ids())
            .await
            .map_err(TransferError::Upstream)?;
        info!(
            elements = membership.data_elements.len(),
            "Resolved dataset membership"
        );

        let units = build_work_units(&self.config, org_units, start, end);
        if units.is_empty() {
            warn!("No units of work in scope");
        }

        let submit_options = SubmitOptions {
            strategy: self.config.strategy,
            async_import: self.config.async_import,
            dry_run: self.config.dry_run,
            skip_audit: false,
            id_scheme: self.config.id_scheme.clone(),
        };
        let ctx = UnitContext {
            source: &self.source,
            destination: &self.destination,
            membership: &membership,
            extraction: &self.config.extraction,
            submit_options: &submit_options,
            batch_size: self.config.batch_size,
            value_policy: self.config.value_policy,
            include_children: self.config.include_children,
        };

        let bar = progress::unit_progress(units.len() as u64);
        let mut summary = TransferSummary::new(units.len());

        // Bounded worker pool: at most `concurrency` units in flight; the
        // next unit is admitted only when one completes. Outcomes are folded
        // serially on this task, so aggregate counters never expose partial
        // updates.
        let mut results = futures::stream::iter(units.iter().map(|unit| {
            let ctx = &ctx;
            let cancel = &self.cancel;
            async move {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(process_unit(ctx, unit).await)
            }
        }))
        .buffer_unordered(self.config.concurrency);

        while let Some(completed) = results.next().await {
            bar.inc(1);
            match completed {
                Some(outcome) => summary.absorb(outcome),
                None => summary.skip(),
            }
        }

        bar.finish_and_clear();
        summary.elapsed = started.elapsed();

        info!(
            imported = summary.totals.imported,
            updated = summary.totals.updated,
            ignored = summary.totals.ignored,
            deleted = summary.totals.deleted,
            units_failed = summary.units_failed,
            units_skipped = summary.units_skipped,
            elapsed = ?summary.elapsed,
            "Transfer finished"
        );

        Ok(summary)
    }
}

/// Enumerate the run's units of work.
///
/// `PerOrgUnit` issues one extraction per org unit covering every configured
/// dataset over the date range. `PerDataset` issues one extraction per
/// (org unit, dataset) pair, scoped by the dataset's reporting periods.
fn build_work_units(
    config: &TransferConfig,
    org_units: Vec<OrgUnit>,
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<WorkUnit> {
    match config.mode {
        TransferMode::PerOrgUnit => org_units
            .into_iter()
            .map(|org_unit| WorkUnit {
                org_unit,
                datasets: config.datasets.clone(),
                window: TimeWindow::DateRange { start, end },
            })
            .collect(),
        TransferMode::PerDataset => {
            let mut units = Vec::with_capacity(org_units.len() * config.datasets.len());
            for dataset in &config.datasets {
                let window = TimeWindow::Periods(periods_in_range(dataset.frequency, start, end));
                for org_unit in &org_units {
                    units.push(WorkUnit {
                        org_unit: org_unit.clone(),
                        datasets: vec![dataset.clone()],
                        window: window.clone(),
                    });
                }
            }
            units
        },
    }
}
