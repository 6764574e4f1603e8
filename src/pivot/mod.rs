//! Analysis pipeline with one module per stage.
//!
//! Runs the stages in order for a single request: filtering, optional
//! automation scoping, failure classification, aggregation, heat-map
//! ranking, column ordering and the ranked breakdowns. Each stage consumes
//! the previous stage's output and produces a new value; the loaded
//! dataset is only borrowed.

pub mod aggregate;
pub mod breakdown;
pub mod classify;
pub mod columns;
pub mod filter;
pub mod heatmap;
pub mod summary;

#[cfg(test)]
pub mod tests;

use self::breakdown::FailureBreakdown;
use self::summary::{PhantomResults, PivotSummary, StatusBreakdown};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::models::{ColumnKey, Dataset, FailureMode, FilterSelection, PivotKind, PivotTable, Record};
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

/// Everything a renderer needs for one analysis request
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub failure_mode: FailureMode,
    pub pivot_kind: PivotKind,
    /// Ranked pivot with station cells already in column order
    pub pivot: PivotTable,
    /// Stations by descending total, then Grand Total
    pub columns: Vec<ColumnKey>,
    pub summary: PivotSummary,
    pub status: StatusBreakdown,
    pub phantom_results: PhantomResults,
    /// Top-N lists, error rates and repeated failures over the filtered records
    pub breakdown: FailureBreakdown,
    /// Records in the loaded table
    pub rows_in: usize,
    /// Records remaining after filters and scoping
    pub rows_filtered: usize,
    /// Records that entered aggregation
    pub failures: usize,
    /// Rows dropped at load time for missing required cells
    pub skipped_records: usize,
    pub processing_time_ms: u64,
}

impl AnalysisReport {
    /// True when nothing survived filtering and classification
    pub fn is_empty(&self) -> bool {
        self.pivot.is_empty()
    }
}

/// Stateless runner for the analysis stages
#[derive(Debug, Clone, Default)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage for one filter selection
    pub fn run(&self, dataset: &Dataset, selection: &FilterSelection) -> Result<AnalysisReport> {
        let start_time = Instant::now();
        self.config.validate()?;

        let mut filtered = filter::apply_filters(dataset, selection)?;
        if self.config.automation_only {
            filtered = filter::automation_scope(filtered, &self.config.automation_operators)?;
        }

        let status = StatusBreakdown::from_records(&filtered);
        let phantom_results = PhantomResults::from_records(&filtered);
        let breakdown = FailureBreakdown::from_records(&filtered, &self.config.breakdown);

        let candidates = self.select_candidates(&filtered);
        let pivot = aggregate::aggregate(&candidates, self.config.pivot_kind, self.config.row_order);
        let pivot = heatmap::rank(pivot, &self.config.highlight);
        let column_order = columns::order_columns(&pivot);
        let pivot = columns::apply_column_order(pivot, &column_order);
        let summary = PivotSummary::from_table(&pivot);

        if pivot.is_empty() {
            info!("No data for the current selection");
        }

        let report = AnalysisReport {
            failure_mode: self.config.failure_mode,
            pivot_kind: self.config.pivot_kind,
            pivot,
            columns: column_order,
            summary,
            status,
            phantom_results,
            breakdown,
            rows_in: dataset.len(),
            rows_filtered: filtered.len(),
            failures: candidates.len(),
            skipped_records: dataset.skipped_records(),
            processing_time_ms: start_time.elapsed().as_millis() as u64,
        };

        debug!(
            "Analysis complete: {} in, {} filtered, {} aggregated, total {}",
            report.rows_in, report.rows_filtered, report.failures, report.summary.total_failures
        );
        Ok(report)
    }

    /// Records that enter aggregation for the configured pivot kind
    fn select_candidates<'a>(&self, records: &[&'a Record]) -> Vec<&'a Record> {
        match self.config.pivot_kind {
            PivotKind::Failure => classify::classify(records, self.config.failure_mode),
            PivotKind::ErrorCode => records
                .iter()
                .copied()
                .filter(|r| r.has_error_details())
                .collect(),
        }
    }
}
