//! Summary statistics and data-quality diagnostics.

use crate::constants::status;
use crate::models::{PivotTable, Record};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Location and value of one model-row cell
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellRef {
    pub group: String,
    pub model: String,
    pub station: String,
    pub count: u64,
}

/// Headline figures of a pivot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PivotSummary {
    /// Highest individual model cell; first in row-major order on ties
    pub highest_cell: Option<CellRef>,
    /// Group with the largest Grand Total
    pub highest_group: Option<(String, u64)>,
    /// Model with the largest total across all groups
    pub highest_model: Option<(String, u64)>,
    /// Station totals in column order
    pub station_totals: Vec<(String, u64)>,
    /// Sum of every model cell
    pub total_failures: u64,
}

impl PivotSummary {
    pub fn from_table(table: &PivotTable) -> Self {
        let mut highest_cell: Option<CellRef> = None;
        let mut model_totals: Vec<(String, u64)> = Vec::new();

        for group in &table.groups {
            for row in &group.models {
                match model_totals.iter_mut().find(|(m, _)| *m == row.label) {
                    Some((_, total)) => *total += row.grand_total,
                    None => model_totals.push((row.label.clone(), row.grand_total)),
                }

                for (station, count) in table.stations.iter().zip(row.counts()) {
                    let better = highest_cell.as_ref().is_none_or(|best| count > best.count);
                    if count > 0 && better {
                        highest_cell = Some(CellRef {
                            group: group.key.clone(),
                            model: row.label.clone(),
                            station: station.clone(),
                            count,
                        });
                    }
                }
            }
        }

        let highest_group = table
            .groups
            .iter()
            .map(|g| (g.key.clone(), g.grand_total()))
            .reduce(|best, next| if next.1 > best.1 { next } else { best });

        let highest_model = model_totals
            .into_iter()
            .reduce(|best, next| if next.1 > best.1 { next } else { best });

        let station_totals = table
            .stations
            .iter()
            .cloned()
            .zip(table.station_totals())
            .collect();

        Self {
            highest_cell,
            highest_group,
            highest_model,
            station_totals,
            total_failures: table.grand_total(),
        }
    }
}

/// Distribution of `Overall status` values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusBreakdown {
    pub total: usize,
    pub success: usize,
    pub failure: usize,
    pub error: usize,
    pub other: usize,
    pub success_rate: f64,
    pub failure_rate: f64,
}

impl StatusBreakdown {
    pub fn from_records(records: &[&Record]) -> Self {
        let mut breakdown = Self {
            total: records.len(),
            ..Default::default()
        };
        for record in records {
            match record.overall_status.as_str() {
                status::SUCCESS => breakdown.success += 1,
                status::FAILURE => breakdown.failure += 1,
                status::ERROR => breakdown.error += 1,
                _ => breakdown.other += 1,
            }
        }
        if breakdown.total > 0 {
            let total = breakdown.total as f64;
            breakdown.success_rate = breakdown.success as f64 / total * 100.0;
            breakdown.failure_rate = breakdown.failure as f64 / total * 100.0;
        }
        breakdown
    }
}

/// Records that carry a failure reason without `FAILURE` status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhantomResults {
    pub count: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_station: BTreeMap<String, usize>,
}

impl PhantomResults {
    pub fn from_records(records: &[&Record]) -> Self {
        let mut phantoms = Self::default();
        for record in records
            .iter()
            .filter(|r| r.has_result_fail() && r.overall_status != status::FAILURE)
        {
            phantoms.count += 1;
            *phantoms
                .by_status
                .entry(record.overall_status.clone())
                .or_default() += 1;
            *phantoms
                .by_station
                .entry(record.station_id.clone())
                .or_default() += 1;
        }

        if phantoms.count > 0 {
            warn!(
                "{} records with result_FAIL but not FAILURE status: {:?}",
                phantoms.count, phantoms.by_status
            );
            for (station, count) in &phantoms.by_station {
                warn!("  {}: {} phantom results", station, count);
            }
        }
        phantoms
    }
}
