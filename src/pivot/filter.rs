//! Column filtering and automation scoping.
//!
//! Filters combine with AND across columns and OR within a column. Every
//! filter key is resolved against the dataset header before any record is
//! examined, so a bad column surfaces as an error instead of an empty
//! result.

use crate::constants::OPERATOR_FAMILY_PATTERN;
use crate::error::{PivotError, Result};
use crate::models::{Dataset, FilterSelection, FilterValue, Record};
use regex::Regex;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Resolve every active filter to a header present in the dataset
pub fn resolve_filters<'a>(
    dataset: &'a Dataset,
    selection: &'a FilterSelection,
) -> Result<Vec<(&'a str, &'a FilterValue)>> {
    let mut active = Vec::new();
    for (key, value) in selection.iter() {
        let column = dataset
            .resolve_column(key)
            .ok_or_else(|| PivotError::InvalidFilterColumn {
                column: key.to_string(),
                available: dataset.columns().to_vec(),
            })?;
        if value.is_active() {
            active.push((column, value));
        }
    }
    Ok(active)
}

/// Keep the records that pass every active filter
pub fn apply_filters<'a>(
    dataset: &'a Dataset,
    selection: &FilterSelection,
) -> Result<Vec<&'a Record>> {
    let active = resolve_filters(dataset, selection)?;

    let filtered: Vec<&Record> = dataset
        .records()
        .iter()
        .filter(|record| {
            active
                .iter()
                .all(|(column, value)| value.accepts(record.value(column)))
        })
        .collect();

    info!(
        "Applied {} filters - rows before: {}, rows after: {}",
        active.len(),
        dataset.len(),
        filtered.len()
    );
    Ok(filtered)
}

/// Sorted distinct non-blank values of a column, for populating selectors
pub fn distinct_values(dataset: &Dataset, key: &str) -> Result<Vec<String>> {
    let column = dataset
        .resolve_column(key)
        .ok_or_else(|| PivotError::InvalidFilterColumn {
            column: key.to_string(),
            available: dataset.columns().to_vec(),
        })?;

    let values: BTreeSet<&str> = dataset
        .records()
        .iter()
        .filter_map(|r| r.value(column))
        .filter(|v| !v.trim().is_empty())
        .collect();
    Ok(values.into_iter().map(str::to_owned).collect())
}

/// Allow-list of operator station families
#[derive(Debug, Clone)]
pub struct OperatorScope {
    families: HashSet<String>,
    pattern: Regex,
}

impl OperatorScope {
    pub fn new<I, S>(families: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let pattern = Regex::new(OPERATOR_FAMILY_PATTERN).map_err(|e| PivotError::Configuration {
            message: format!("Invalid operator family pattern: {}", e),
        })?;
        let families = families
            .into_iter()
            .map(|f| f.as_ref().trim().to_string())
            .collect();
        Ok(Self { families, pattern })
    }

    /// Station family of an operator, e.g. `STN251_RED` for
    /// `STN251_RED(id:10089)`
    pub fn family<'a>(&self, operator: &'a str) -> &'a str {
        self.pattern
            .captures(operator)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .unwrap_or_else(|| operator.trim())
    }

    pub fn contains(&self, record: &Record) -> bool {
        self.families.contains(self.family(&record.operator))
    }

    /// Keep records run by an allow-listed operator
    pub fn retain<'a>(&self, records: Vec<&'a Record>) -> Vec<&'a Record> {
        let before = records.len();
        let scoped: Vec<&Record> = records.into_iter().filter(|r| self.contains(r)).collect();
        debug!(
            "Automation scope kept {} of {} records",
            scoped.len(),
            before
        );
        scoped
    }
}

/// Keep records whose operator belongs to one of the station families
pub fn automation_scope<'a, S: AsRef<str>>(
    records: Vec<&'a Record>,
    families: &[S],
) -> Result<Vec<&'a Record>> {
    Ok(OperatorScope::new(families)?.retain(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ALL_SENTINEL;

    fn dataset() -> Dataset {
        Dataset::from_records(vec![
            Record::new("STN251_RED(id:10089)", "FAILURE", "A", "s1", "m1").with_source("line1"),
            Record::new("STN252_RED(id:10090)", "FAILURE", "B", "s2", "m1").with_source("line2"),
            Record::new("manual", "SUCCESS", "", "s1", "m2").with_source("line1"),
            Record::new("STN351_GRN(id:10380)", "ERROR", "A", "s3", "m2").with_source("line2"),
        ])
    }

    #[test]
    fn test_no_filters_keeps_everything() {
        let dataset = dataset();
        let filtered = apply_filters(&dataset, &FilterSelection::new()).unwrap();
        assert_eq!(filtered.len(), dataset.len());
    }

    #[test]
    fn test_all_sentinel_and_empty_set_are_unconstrained() {
        let dataset = dataset();
        let selection = FilterSelection::new()
            .with_values("operator", [ALL_SENTINEL, "manual"])
            .with_values("Station ID", Vec::<String>::new());
        assert!(selection.is_unconstrained());
        assert_eq!(apply_filters(&dataset, &selection).unwrap().len(), 4);
    }

    #[test]
    fn test_or_within_filter() {
        let dataset = dataset();
        let selection = FilterSelection::new().with_values("station_id", ["s1", "s3"]);
        let filtered = apply_filters(&dataset, &selection).unwrap();
        assert_eq!(filtered.len(), 3);
    }

    #[test]
    fn test_and_across_filters() {
        let dataset = dataset();
        let selection = FilterSelection::new()
            .with_values("station_id", ["s1", "s3"])
            .with("source", FilterValue::single("line2"));
        let filtered = apply_filters(&dataset, &selection).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].station_id, "s3");
    }

    #[test]
    fn test_unknown_column_is_rejected() {
        let dataset = dataset();
        let selection = FilterSelection::new().with("firmware", FilterValue::single("1.0"));
        match apply_filters(&dataset, &selection) {
            Err(PivotError::InvalidFilterColumn { column, available }) => {
                assert_eq!(column, "firmware");
                assert!(available.contains(&"Operator".to_string()));
            }
            other => panic!("Expected InvalidFilterColumn error, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_column_rejected_even_when_unconstrained() {
        let dataset = dataset();
        let selection = FilterSelection::new().with("firmware", FilterValue::All);
        assert!(apply_filters(&dataset, &selection).is_err());
    }

    #[test]
    fn test_filter_on_absent_optional_value_excludes_record() {
        let dataset = Dataset::from_records(vec![
            Record::new("op", "FAILURE", "A", "s1", "m1").with_source("line1"),
            Record::new("op", "FAILURE", "A", "s1", "m1"),
        ]);
        let selection = FilterSelection::new().with("source", FilterValue::single("line1"));
        assert_eq!(apply_filters(&dataset, &selection).unwrap().len(), 1);
    }

    #[test]
    fn test_distinct_values_sorted() {
        let dataset = dataset();
        assert_eq!(
            distinct_values(&dataset, "station_id").unwrap(),
            vec!["s1", "s2", "s3"]
        );
    }

    #[test]
    fn test_operator_family_extraction() {
        let scope = OperatorScope::new(["STN251_RED"]).unwrap();
        assert_eq!(scope.family("STN251_RED(id:10089)"), "STN251_RED");
        assert_eq!(scope.family("STN251_RED (id: 10089)"), "STN251_RED");
        assert_eq!(scope.family("STN251_RED"), "STN251_RED");
        assert_eq!(scope.family("manual"), "manual");
    }

    #[test]
    fn test_operator_scope_retain() {
        let dataset = dataset();
        let scope = OperatorScope::new(["STN251_RED", "STN351_GRN"]).unwrap();
        let all: Vec<&Record> = dataset.records().iter().collect();
        let scoped = scope.retain(all);
        assert_eq!(scoped.len(), 2);
        assert!(scoped.iter().all(|r| r.operator.starts_with("STN")));
    }

    #[test]
    fn test_automation_scope_with_default_families() {
        let dataset = dataset();
        let all: Vec<&Record> = dataset.records().iter().collect();
        let scoped = automation_scope(all, crate::constants::DEFAULT_AUTOMATION_OPERATORS).unwrap();
        assert_eq!(scoped.len(), 3);
        assert!(scoped.iter().all(|r| r.operator != "manual"));
    }
}
