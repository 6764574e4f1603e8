//! Failure classification under the two counting modes.

use crate::constants::status;
use crate::models::{FailureMode, Record};
use tracing::info;

/// Whether a record counts as a failure under `mode`
pub fn is_failure(record: &Record, mode: FailureMode) -> bool {
    match mode {
        FailureMode::Pure => record.overall_status == status::FAILURE,
        FailureMode::Comprehensive => {
            record.overall_status == status::FAILURE
                || (record.overall_status == status::ERROR && record.has_result_fail())
        }
    }
}

/// Keep only the records classified as failures
pub fn classify<'a>(records: &[&'a Record], mode: FailureMode) -> Vec<&'a Record> {
    let failures: Vec<&Record> = records
        .iter()
        .copied()
        .filter(|r| is_failure(r, mode))
        .collect();

    info!(
        "Found {} failures in {} records using {}",
        failures.len(),
        records.len(),
        mode.label()
    );
    failures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_counts_failure_status_only() {
        assert!(is_failure(
            &Record::new("op", "FAILURE", "", "s1", "m1"),
            FailureMode::Pure
        ));
        assert!(!is_failure(
            &Record::new("op", "ERROR", "A", "s1", "m1"),
            FailureMode::Pure
        ));
        assert!(!is_failure(
            &Record::new("op", "SUCCESS", "", "s1", "m1"),
            FailureMode::Pure
        ));
    }

    #[test]
    fn test_comprehensive_includes_error_with_reason() {
        let mode = FailureMode::Comprehensive;
        assert!(is_failure(&Record::new("op", "ERROR", "A", "s1", "m1"), mode));
        assert!(!is_failure(&Record::new("op", "ERROR", "", "s1", "m1"), mode));
        assert!(!is_failure(&Record::new("op", "ERROR", "   ", "s1", "m1"), mode));
        assert!(is_failure(&Record::new("op", "FAILURE", "", "s1", "m1"), mode));
    }

    #[test]
    fn test_unknown_status_never_a_failure() {
        for mode in [FailureMode::Pure, FailureMode::Comprehensive] {
            assert!(!is_failure(
                &Record::new("op", "ABORTED", "A", "s1", "m1"),
                mode
            ));
            assert!(!is_failure(
                &Record::new("op", "failure", "A", "s1", "m1"),
                mode
            ));
        }
    }

    #[test]
    fn test_comprehensive_is_superset_of_pure() {
        let records = [
            Record::new("op", "FAILURE", "A", "s1", "m1"),
            Record::new("op", "FAILURE", "", "s1", "m1"),
            Record::new("op", "ERROR", "A", "s1", "m1"),
            Record::new("op", "ERROR", "", "s1", "m1"),
            Record::new("op", "SUCCESS", "A", "s1", "m1"),
        ];
        for record in &records {
            if is_failure(record, FailureMode::Pure) {
                assert!(is_failure(record, FailureMode::Comprehensive));
            }
        }
    }

    #[test]
    fn test_three_record_scenario() {
        let records = [
            Record::new("op", "FAILURE", "A", "stationX", "model1"),
            Record::new("op", "ERROR", "A", "stationX", "model1"),
            Record::new("op", "ERROR", "", "stationY", "model2"),
        ];
        let refs: Vec<&Record> = records.iter().collect();

        assert_eq!(classify(&refs, FailureMode::Pure).len(), 1);
        let comprehensive = classify(&refs, FailureMode::Comprehensive);
        assert_eq!(comprehensive.len(), 2);
        assert!(comprehensive.iter().all(|r| r.station_id == "stationX"));
    }
}
