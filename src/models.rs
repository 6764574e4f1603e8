//! Core data structures and types for pivot analysis.
//!
//! Defines test-run records, the loaded dataset, filter selections,
//! failure-counting modes and the pivot table produced by the pipeline.

use crate::constants::{
    ALL_SENTINEL, BLANK_PLACEHOLDER, COLUMN_ALIASES, GRAND_TOTAL_LABEL, REQUIRED_COLUMNS, columns,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// One row of a test-run export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub operator: String,
    pub overall_status: String,
    /// Failure reason(s), possibly comma-joined; always treated as one key
    pub result_fail: String,
    pub station_id: String,
    pub model: String,
    pub source: Option<String>,
    pub error_code: Option<String>,
    pub error_message: Option<String>,
    /// Cells of columns the analysis does not interpret
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl Record {
    pub fn new(
        operator: impl Into<String>,
        overall_status: impl Into<String>,
        result_fail: impl Into<String>,
        station_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            operator: operator.into(),
            overall_status: overall_status.into(),
            result_fail: result_fail.into(),
            station_id: station_id.into(),
            model: model.into(),
            source: None,
            error_code: None,
            error_message: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_error(mut self, code: impl Into<String>, message: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self.error_message = Some(message.into());
        self
    }

    pub fn with_extra(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(column.into(), value.into());
        self
    }

    /// Look up a cell by its header name
    pub fn value(&self, column: &str) -> Option<&str> {
        match column {
            columns::OPERATOR => Some(&self.operator),
            columns::OVERALL_STATUS => Some(&self.overall_status),
            columns::RESULT_FAIL => Some(&self.result_fail),
            columns::STATION_ID => Some(&self.station_id),
            columns::MODEL => Some(&self.model),
            columns::SOURCE => self.source.as_deref(),
            columns::ERROR_CODE => self.error_code.as_deref(),
            columns::ERROR_MESSAGE => self.error_message.as_deref(),
            other => self.extra.get(other).map(String::as_str),
        }
    }

    /// Whether the record carries a non-blank failure reason
    pub fn has_result_fail(&self) -> bool {
        !self.result_fail.trim().is_empty()
    }

    /// Whether every required cell holds a non-blank value
    pub fn has_required_fields(&self) -> bool {
        REQUIRED_COLUMNS
            .iter()
            .all(|column| self.value(column).is_some_and(|v| !v.trim().is_empty()))
    }

    /// Whether either error field is non-blank
    pub fn has_error_details(&self) -> bool {
        let filled = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        filled(&self.error_code) || filled(&self.error_message)
    }

    /// Group key used by the error-code pivot
    pub fn error_key(&self) -> String {
        let part = |v: &Option<String>| match v.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => BLANK_PLACEHOLDER.to_string(),
        };
        format!("{} - {}", part(&self.error_code), part(&self.error_message))
    }
}

/// A decoded table: header list, records and the count of rows skipped
/// because required cells were missing.
///
/// The dataset is never mutated after construction; every analysis
/// borrows it read-only.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<Record>,
    skipped_records: usize,
}

impl Dataset {
    /// Records missing a required cell are dropped and added to the
    /// skipped count
    pub fn new(columns: Vec<String>, records: Vec<Record>, skipped_records: usize) -> Self {
        let before = records.len();
        let records: Vec<Record> = records
            .into_iter()
            .filter(Record::has_required_fields)
            .collect();
        let malformed = before - records.len();
        if malformed > 0 {
            debug!("Dropped {} records with blank required cells", malformed);
        }

        Self {
            columns,
            records,
            skipped_records: skipped_records + malformed,
        }
    }

    /// Build a dataset from in-process records, deriving the header list
    /// from the standard columns plus any pass-through columns.
    pub fn from_records(records: Vec<Record>) -> Self {
        let (records, malformed): (Vec<Record>, Vec<Record>) =
            records.into_iter().partition(Record::has_required_fields);

        let mut headers: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        headers.push(columns::RESULT_FAIL.to_string());
        for optional in [columns::SOURCE, columns::ERROR_CODE, columns::ERROR_MESSAGE] {
            if records.iter().any(|r| r.value(optional).is_some()) {
                headers.push(optional.to_string());
            }
        }
        let extras: BTreeSet<&String> = records.iter().flat_map(|r| r.extra.keys()).collect();
        headers.extend(extras.into_iter().cloned());

        Self::new(headers, records, malformed.len())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Resolve a filter key (header name or snake-case alias) to a header
    /// present in this dataset
    pub fn resolve_column(&self, key: &str) -> Option<&str> {
        if let Some(found) = self.columns.iter().find(|c| c.as_str() == key) {
            return Some(found);
        }
        let header = COLUMN_ALIASES
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(key))
            .map(|(_, header)| *header)?;
        self.columns
            .iter()
            .find(|c| c.as_str() == header)
            .map(String::as_str)
    }
}

/// Failure-counting semantics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureMode {
    /// Only `FAILURE` records count
    #[default]
    Pure,
    /// `FAILURE` records plus `ERROR` records that carry a failure reason
    Comprehensive,
}

impl FailureMode {
    pub fn label(&self) -> &'static str {
        match self {
            FailureMode::Pure => "Pure Failures",
            FailureMode::Comprehensive => "Comprehensive",
        }
    }
}

/// Accepted values for one filter column
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterValue {
    /// No constraint
    #[default]
    All,
    /// Record passes if its value is any of these
    AnyOf(BTreeSet<String>),
}

impl FilterValue {
    /// Build from one or more selected values. An empty selection or one
    /// containing `All` means no constraint.
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() || values.contains(ALL_SENTINEL) {
            FilterValue::All
        } else {
            FilterValue::AnyOf(values)
        }
    }

    pub fn single(value: impl Into<String>) -> Self {
        Self::from_values([value.into()])
    }

    pub fn is_active(&self) -> bool {
        matches!(self, FilterValue::AnyOf(_))
    }

    pub fn accepts(&self, value: Option<&str>) -> bool {
        match self {
            FilterValue::All => true,
            FilterValue::AnyOf(values) => value.is_some_and(|v| values.contains(v)),
        }
    }
}

/// Request-scoped filter choices keyed by column name or alias
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    filters: BTreeMap<String, FilterValue>,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: FilterValue) -> Self {
        self.insert(column, value);
        self
    }

    pub fn with_values<I, S>(self, column: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(column, FilterValue::from_values(values))
    }

    pub fn insert(&mut self, column: impl Into<String>, value: FilterValue) {
        self.filters.insert(column.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// True when no filter constrains any column
    pub fn is_unconstrained(&self) -> bool {
        self.filters.values().all(|v| !v.is_active())
    }
}

/// Heat-map classification of a pivot cell, ordered by display precedence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    None,
    Yellow,
    Orange,
    Red,
}

/// Outer grouping key of a pivot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PivotKind {
    /// Group by the verbatim `result_FAIL` string
    #[default]
    Failure,
    /// Group by `error_code - error_message`
    ErrorCode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotCell {
    pub count: u64,
    pub tier: Tier,
}

impl PivotCell {
    pub fn new(count: u64) -> Self {
        Self {
            count,
            tier: Tier::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Model,
    Total,
}

/// One pivot row: station cells in column order plus the derived
/// horizontal sum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotRow {
    pub label: String,
    pub kind: RowKind,
    pub cells: Vec<PivotCell>,
    pub grand_total: u64,
}

impl PivotRow {
    /// Build a row, deriving the Grand Total from the station cells
    pub fn new(label: impl Into<String>, kind: RowKind, counts: Vec<u64>) -> Self {
        let grand_total = counts.iter().sum();
        Self {
            label: label.into(),
            kind,
            cells: counts.into_iter().map(PivotCell::new).collect(),
            grand_total,
        }
    }

    pub fn counts(&self) -> impl Iterator<Item = u64> + '_ {
        self.cells.iter().map(|c| c.count)
    }
}

/// A test-case group: its model rows followed by the Total row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotGroup {
    pub key: String,
    pub models: Vec<PivotRow>,
    pub total: PivotRow,
}

impl PivotGroup {
    /// Model rows then the Total row, in display order
    pub fn rows(&self) -> impl Iterator<Item = &PivotRow> {
        self.models.iter().chain(std::iter::once(&self.total))
    }

    pub fn grand_total(&self) -> u64 {
        self.total.grand_total
    }
}

/// Column of the rendered grid
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum ColumnKey {
    Station(String),
    GrandTotal,
}

impl ColumnKey {
    pub fn label(&self) -> &str {
        match self {
            ColumnKey::Station(name) => name,
            ColumnKey::GrandTotal => GRAND_TOTAL_LABEL,
        }
    }
}

/// Hierarchical pivot: groups of model rows by station columns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotTable {
    pub kind: PivotKind,
    pub stations: Vec<String>,
    pub groups: Vec<PivotGroup>,
}

impl PivotTable {
    pub fn empty(kind: PivotKind) -> Self {
        Self {
            kind,
            stations: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Per-station totals over model rows; Grand Total is not a station
    pub fn station_totals(&self) -> Vec<u64> {
        let mut totals = vec![0u64; self.stations.len()];
        for row in self.groups.iter().flat_map(|g| g.models.iter()) {
            for (total, count) in totals.iter_mut().zip(row.counts()) {
                *total += count;
            }
        }
        totals
    }

    /// Sum of every model cell
    pub fn grand_total(&self) -> u64 {
        self.groups.iter().map(PivotGroup::grand_total).sum()
    }

    /// Stations in column order followed by the Grand Total column
    pub fn column_keys(&self) -> Vec<ColumnKey> {
        self.stations
            .iter()
            .cloned()
            .map(ColumnKey::Station)
            .chain(std::iter::once(ColumnKey::GrandTotal))
            .collect()
    }

    pub fn find_group(&self, key: &str) -> Option<&PivotGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn station_index(&self, station: &str) -> Option<usize> {
        self.stations.iter().position(|s| s == station)
    }
}
