//! Pivot aggregation: test case → model rows by station columns.
//!
//! Counts records per `(group, model, station)`, derives a Total row per
//! group and a Grand Total per row. Group keys are taken verbatim, so a
//! compound `result_FAIL` such as `"Camera Pictures,Camera Flash"` stays
//! one group. Stations are laid out in discovery order; the column orderer
//! reorders them afterwards.

use crate::config::RowOrder;
use crate::constants::{BLANK_PLACEHOLDER, TOTAL_ROW_LABEL};
use crate::models::{PivotGroup, PivotKind, PivotRow, PivotTable, Record, RowKind};
use std::cmp::Reverse;
use std::collections::HashMap;
use tracing::{debug, info};

/// Counts for one group while records are being folded in
#[derive(Debug, Default)]
struct GroupAccumulator {
    key: String,
    models: Vec<(String, Vec<u64>)>,
    model_index: HashMap<String, usize>,
}

impl GroupAccumulator {
    fn new(key: String) -> Self {
        Self {
            key,
            ..Default::default()
        }
    }

    fn add(&mut self, model: &str, station: usize) {
        let index = match self.model_index.get(model) {
            Some(&index) => index,
            None => {
                self.models.push((model.to_string(), Vec::new()));
                self.model_index
                    .insert(model.to_string(), self.models.len() - 1);
                self.models.len() - 1
            }
        };
        let counts = &mut self.models[index].1;
        if counts.len() <= station {
            counts.resize(station + 1, 0);
        }
        counts[station] += 1;
    }

    fn finish(self, station_count: usize, order: RowOrder) -> PivotGroup {
        let mut models: Vec<PivotRow> = self
            .models
            .into_iter()
            .map(|(model, mut counts)| {
                counts.resize(station_count, 0);
                PivotRow::new(model, RowKind::Model, counts)
            })
            .collect();

        if order == RowOrder::TotalDescending {
            models.sort_by_key(|row| Reverse(row.grand_total));
        }

        let mut totals = vec![0u64; station_count];
        for row in &models {
            for (total, count) in totals.iter_mut().zip(row.counts()) {
                *total += count;
            }
        }

        PivotGroup {
            key: self.key,
            models,
            total: PivotRow::new(TOTAL_ROW_LABEL, RowKind::Total, totals),
        }
    }
}

/// Outer grouping key of a record for the given pivot kind
pub fn group_key(record: &Record, kind: PivotKind) -> String {
    match kind {
        PivotKind::Failure if record.has_result_fail() => record.result_fail.clone(),
        PivotKind::Failure => BLANK_PLACEHOLDER.to_string(),
        PivotKind::ErrorCode => record.error_key(),
    }
}

/// Build the pivot table from records that already passed classification
pub fn aggregate(records: &[&Record], kind: PivotKind, order: RowOrder) -> PivotTable {
    if records.is_empty() {
        debug!("No records to aggregate; returning empty pivot");
        return PivotTable::empty(kind);
    }

    let mut stations: Vec<String> = Vec::new();
    let mut station_index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupAccumulator> = Vec::new();
    let mut group_index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let station = *station_index
            .entry(record.station_id.as_str())
            .or_insert_with(|| {
                stations.push(record.station_id.clone());
                stations.len() - 1
            });

        let key = group_key(record, kind);
        let group = match group_index.get(&key) {
            Some(&index) => index,
            None => {
                groups.push(GroupAccumulator::new(key.clone()));
                group_index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };

        groups[group].add(&record.model, station);
    }

    let station_count = stations.len();
    let mut groups: Vec<PivotGroup> = groups
        .into_iter()
        .map(|group| group.finish(station_count, order))
        .collect();

    if order == RowOrder::TotalDescending {
        groups.sort_by_key(|group| Reverse(group.grand_total()));
    }

    let table = PivotTable {
        kind,
        stations,
        groups,
    };

    info!(
        "Created pivot with {} groups, {} model rows, {} stations",
        table.groups.len(),
        table.groups.iter().map(|g| g.models.len()).sum::<usize>(),
        table.stations.len()
    );
    table
}
