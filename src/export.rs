//! Pivot export to CSV
//!
//! Flattens a ranked pivot into a polars `DataFrame` with one row per model
//! row and per Total row, then writes it with the polars CSV writer. The
//! frame columns follow the rendered grid: group key, model, stations in
//! column order, Grand Total.

use crate::constants::{ERROR_CODE_HEADER, GRAND_TOTAL_LABEL, TEST_CASE_HEADER, columns};
use crate::error::Result;
use crate::models::{PivotKind, PivotTable};
use polars::prelude::{Column, CsvWriter, DataFrame, SerWriter};
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Header of the outer grouping column for a pivot kind
pub fn group_header(kind: PivotKind) -> &'static str {
    match kind {
        PivotKind::Failure => TEST_CASE_HEADER,
        PivotKind::ErrorCode => ERROR_CODE_HEADER,
    }
}

/// Station column headers, renamed where a station id collides with a
/// fixed header such as `Model` or `Grand Total`
pub fn station_headers(table: &PivotTable) -> Vec<String> {
    let reserved = [group_header(table.kind), columns::MODEL, GRAND_TOTAL_LABEL];
    let mut taken: HashSet<String> = reserved
        .iter()
        .copied()
        .chain(table.stations.iter().map(String::as_str))
        .map(str::to_string)
        .collect();

    table
        .stations
        .iter()
        .map(|station| {
            if !reserved.contains(&station.as_str()) {
                return station.clone();
            }
            let mut header = format!("{} (station)", station);
            let mut n = 2;
            while taken.contains(&header) {
                header = format!("{} (station {})", station, n);
                n += 1;
            }
            warn!("Station '{}' exported as column '{}'", station, header);
            taken.insert(header.clone());
            header
        })
        .collect()
}

/// Build the flat frame for a pivot
pub fn pivot_to_frame(table: &PivotTable) -> Result<DataFrame> {
    let mut keys: Vec<String> = Vec::new();
    let mut labels: Vec<String> = Vec::new();
    let mut station_counts: Vec<Vec<u64>> = vec![Vec::new(); table.stations.len()];
    let mut grand_totals: Vec<u64> = Vec::new();

    for group in &table.groups {
        for row in group.rows() {
            keys.push(group.key.clone());
            labels.push(row.label.clone());
            for (counts, count) in station_counts.iter_mut().zip(row.counts()) {
                counts.push(count);
            }
            grand_totals.push(row.grand_total);
        }
    }

    let mut frame_columns = Vec::with_capacity(table.stations.len() + 3);
    frame_columns.push(Column::new(group_header(table.kind).into(), keys));
    frame_columns.push(Column::new(columns::MODEL.into(), labels));
    for (header, counts) in station_headers(table).into_iter().zip(station_counts) {
        frame_columns.push(Column::new(header.into(), counts));
    }
    frame_columns.push(Column::new(GRAND_TOTAL_LABEL.into(), grand_totals));

    let frame = DataFrame::new(frame_columns)?;
    debug!("Export frame shape: {:?}", frame.shape());
    Ok(frame)
}

/// Writes pivots to a CSV file
#[derive(Debug, Clone)]
pub struct PivotExporter {
    output_path: PathBuf,
}

impl PivotExporter {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Write the pivot and return the number of data rows written
    pub fn write_csv(&self, table: &PivotTable) -> Result<usize> {
        let mut frame = pivot_to_frame(table)?;

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = File::create(&self.output_path)?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut frame)?;

        info!(
            "Exported {} pivot rows to {}",
            frame.height(),
            self.output_path.display()
        );
        Ok(frame.height())
    }
}
