//! Ranked failure breakdowns alongside the pivot.
//!
//! Flat top-N lists over the filtered records: failing stations, models
//! and test cases, the most frequent failure reasons per model, error-code
//! rates and repeated failures of one test case on one device slot. Ties
//! keep first-appearance order.

use crate::config::BreakdownConfig;
use crate::constants::{NO_ERROR_CODE, status};
use crate::models::Record;
use serde::Serialize;
use std::collections::HashMap;
use std::hash::Hash;
use tracing::{debug, info};

/// A key with its occurrence count
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCount {
    pub key: String,
    pub count: usize,
}

/// Most frequent failing stations, models and test cases
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopFailures {
    /// FAILURE and ERROR records per station
    pub stations: Vec<RankedCount>,
    /// FAILURE and ERROR records per model
    pub models: Vec<RankedCount>,
    /// Records per non-blank failure reason, whatever their status
    pub test_cases: Vec<RankedCount>,
}

impl TopFailures {
    pub fn from_records(records: &[&Record], limit: usize) -> Self {
        let failing = || {
            records.iter().filter(|r| {
                matches!(r.overall_status.as_str(), status::FAILURE | status::ERROR)
            })
        };

        let rank = |counts: Vec<(&str, usize)>| -> Vec<RankedCount> {
            counts
                .into_iter()
                .take(limit)
                .map(|(key, count)| RankedCount {
                    key: key.to_string(),
                    count,
                })
                .collect()
        };

        Self {
            stations: rank(count_by(failing().map(|r| r.station_id.as_str()))),
            models: rank(count_by(failing().map(|r| r.model.as_str()))),
            test_cases: rank(count_by(
                records
                    .iter()
                    .filter(|r| r.has_result_fail())
                    .map(|r| r.result_fail.as_str()),
            )),
        }
    }
}

/// One failure reason on one model
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelError {
    pub model: String,
    pub test_case: String,
    pub count: usize,
}

/// Most frequent (model, failure reason) pairs among FAILURE records
pub fn top_errors_by_model(records: &[&Record], limit: usize) -> Vec<ModelError> {
    let pairs = records
        .iter()
        .filter(|r| r.overall_status == status::FAILURE && r.has_result_fail())
        .map(|r| (r.model.as_str(), r.result_fail.as_str()));

    count_by(pairs)
        .into_iter()
        .take(limit)
        .map(|((model, test_case), count)| ModelError {
            model: model.to_string(),
            test_case: test_case.to_string(),
            count,
        })
        .collect()
}

/// Share of all filtered records carrying one error code and message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRate {
    pub error_code: String,
    pub error_message: String,
    pub count: usize,
    /// Percent of every filtered record, rounded to two decimals
    pub percentage: f64,
}

/// Most frequent error codes. Blank codes and `0` are not errors.
pub fn error_rates(records: &[&Record], limit: usize) -> Vec<ErrorRate> {
    let coded = records.iter().filter_map(|r| {
        let code = r.error_code.as_deref().map(str::trim)?;
        if code.is_empty() || code == NO_ERROR_CODE {
            return None;
        }
        let message = r.error_message.as_deref().map(str::trim).unwrap_or("");
        Some((code, message))
    });

    let total = records.len() as f64;
    count_by(coded)
        .into_iter()
        .take(limit)
        .map(|((code, message), count)| ErrorRate {
            error_code: code.to_string(),
            error_message: message.to_string(),
            count,
            percentage: (count as f64 / total * 100.0 * 100.0).round() / 100.0,
        })
        .collect()
}

/// A test case failing repeatedly on the same model and station
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepeatedFailure {
    pub model: String,
    pub station_id: String,
    pub test_case: String,
    pub count: usize,
}

/// FAILURE records grouped by model, station and failure reason, kept when
/// a group reaches `min_failures`; largest first
pub fn repeated_failures(records: &[&Record], min_failures: usize) -> Vec<RepeatedFailure> {
    let keys = records
        .iter()
        .filter(|r| r.overall_status == status::FAILURE && r.has_result_fail())
        .map(|r| (r.model.as_str(), r.station_id.as_str(), r.result_fail.as_str()));

    let repeated: Vec<RepeatedFailure> = count_by(keys)
        .into_iter()
        .take_while(|(_, count)| *count >= min_failures)
        .map(|((model, station_id, test_case), count)| RepeatedFailure {
            model: model.to_string(),
            station_id: station_id.to_string(),
            test_case: test_case.to_string(),
            count,
        })
        .collect();

    info!(
        "Found {} repeated failures (threshold {})",
        repeated.len(),
        min_failures
    );
    repeated
}

/// Every breakdown computed for one analysis request
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FailureBreakdown {
    pub top: TopFailures,
    pub errors_by_model: Vec<ModelError>,
    pub error_rates: Vec<ErrorRate>,
    pub repeated_failures: Vec<RepeatedFailure>,
}

impl FailureBreakdown {
    pub fn from_records(records: &[&Record], config: &BreakdownConfig) -> Self {
        let breakdown = Self {
            top: TopFailures::from_records(records, config.top_failures),
            errors_by_model: top_errors_by_model(records, config.top_errors),
            error_rates: error_rates(records, config.top_errors),
            repeated_failures: repeated_failures(records, config.min_repeated_failures),
        };
        debug!(
            "Breakdown: {} stations, {} models, {} test cases, {} error codes",
            breakdown.top.stations.len(),
            breakdown.top.models.len(),
            breakdown.top.test_cases.len(),
            breakdown.error_rates.len()
        );
        breakdown
    }
}

/// Occurrences per key, by descending count with first-appearance ties
fn count_by<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Eq + Hash + Copy,
    I: IntoIterator<Item = K>,
{
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut counts: Vec<(K, usize)> = Vec::new();
    for key in keys {
        match index.get(&key) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(key, counts.len());
                counts.push((key, 1));
            }
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
