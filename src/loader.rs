//! Test-run CSV loading and record extraction.
//!
//! Reads an export with polars (every column as text, lossy UTF-8),
//! checks the required headers and converts rows into [`Record`]s.
//! Rows missing a required cell are skipped and counted rather than
//! failing the load.

use crate::config::LoaderConfig;
use crate::constants::{REQUIRED_COLUMNS, columns};
use crate::error::{PivotError, Result};
use crate::models::{Dataset, Record};
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Load a test-run CSV export into a [`Dataset`]
pub fn load_csv(path: &Path, config: &LoaderConfig) -> Result<Dataset> {
    TableLoader::new(config.clone()).load(path)
}

/// CSV loader for test-run exports
#[derive(Debug, Clone, Default)]
pub struct TableLoader {
    config: LoaderConfig,
}

impl TableLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// Read the file and extract records
    pub fn load(&self, path: &Path) -> Result<Dataset> {
        if !path.exists() {
            return Err(PivotError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let frame = self.read_frame(path)?;

        if let Some(limit) = self.config.max_rows {
            if frame.height() > limit {
                return Err(PivotError::RowLimitExceeded {
                    path: path.to_path_buf(),
                    limit,
                });
            }
        }

        let dataset = dataset_from_frame(&frame, path)?;
        info!(
            "Loaded {} records from {} ({} skipped)",
            dataset.len(),
            path.display(),
            dataset.skipped_records()
        );
        Ok(dataset)
    }

    fn read_frame(&self, path: &Path) -> Result<DataFrame> {
        // One extra row lets the ceiling check see an overflow without
        // reading the whole file.
        let n_rows = self.config.max_rows.map(|limit| limit.saturating_add(1));
        let separator = self.config.delimiter;

        let frame = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .with_n_rows(n_rows)
            .map_parse_options(|opts| {
                opts.with_separator(separator)
                    .with_encoding(CsvEncoding::LossyUtf8)
                    .with_truncate_ragged_lines(true)
            })
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        debug!(
            "Read {} rows x {} columns from {}",
            frame.height(),
            frame.width(),
            path.display()
        );
        Ok(frame)
    }
}

/// Convert a text-typed frame into records
pub fn dataset_from_frame(frame: &DataFrame, path: &Path) -> Result<Dataset> {
    let headers: Vec<String> = frame
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(PivotError::MissingColumn {
                path: path.to_path_buf(),
                column: required.to_string(),
            });
        }
    }

    let mut cells: BTreeMap<&str, Vec<Option<String>>> = BTreeMap::new();
    for header in &headers {
        let series = frame
            .column(header)?
            .as_materialized_series()
            .cast(&DataType::String)?;
        let values = series
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_owned))
            .collect();
        cells.insert(header.as_str(), values);
    }

    let mut records = Vec::with_capacity(frame.height());
    let mut skipped = 0usize;

    for row in 0..frame.height() {
        let cell = |column: &str| -> Option<String> {
            cells
                .get(column)
                .and_then(|values| values[row].clone())
                .filter(|v| !v.trim().is_empty())
        };

        let (Some(operator), Some(status), Some(station), Some(model)) = (
            cell(columns::OPERATOR),
            cell(columns::OVERALL_STATUS),
            cell(columns::STATION_ID),
            cell(columns::MODEL),
        ) else {
            skipped += 1;
            continue;
        };

        let mut record = Record::new(
            operator,
            status,
            cell(columns::RESULT_FAIL).unwrap_or_default(),
            station,
            model,
        );
        record.source = cell(columns::SOURCE);
        record.error_code = cell(columns::ERROR_CODE);
        record.error_message = cell(columns::ERROR_MESSAGE);

        for header in &headers {
            if is_interpreted(header) {
                continue;
            }
            if let Some(value) = cell(header) {
                record.extra.insert(header.clone(), value);
            }
        }

        records.push(record);
    }

    if skipped > 0 {
        warn!(
            "Skipped {} malformed rows in {} (missing {})",
            skipped,
            path.display(),
            REQUIRED_COLUMNS.join(" / ")
        );
    }

    Ok(Dataset::new(headers, records, skipped))
}

fn is_interpreted(header: &str) -> bool {
    matches!(
        header,
        columns::OPERATOR
            | columns::OVERALL_STATUS
            | columns::RESULT_FAIL
            | columns::STATION_ID
            | columns::MODEL
            | columns::SOURCE
            | columns::ERROR_CODE
            | columns::ERROR_MESSAGE
    )
}
