//! Scenario and invariant tests for the analysis pipeline
//!
//! Exercises the stages together on synthetic test-run tables.


use crate::models::{FilterSelection, Record};
use proptest::prelude::*;

const STATIONS: &[&str] = &["radi135", "radi138", "radi115", "radi163", "radi056"];
const MODELS: &[&str] = &["iPhone14ProMax", "iPhone13", "SM-S931U", "SM-A205U"];
const TEST_CASES: &[&str] = &[
    "Camera Pictures",
    "Camera Flash",
    "Camera Pictures,Camera Flash",
    "AQA_Microphone",
    "Touch screen",
];
const OPERATORS: &[&str] = &[
    "STN251_RED(id:10089)",
    "STN252_RED(id:10090)",
    "STN351_GRN(id:10380)",
    "manual_bench",
];
const STATUSES: &[&str] = &["FAILURE", "ERROR", "ABORTED", "SUCCESS"];
const SOURCES: &[&str] = &["line1", "line2"];

/// One record drawn from the fixed vocabularies; failure reasons are
/// blank about a third of the time and never set on SUCCESS rows
pub(crate) fn record_strategy() -> impl Strategy<Value = Record> {
    (
        prop::sample::select(OPERATORS),
        prop::sample::select(STATUSES),
        prop::option::weighted(0.67, prop::sample::select(TEST_CASES)),
        prop::sample::select(STATIONS),
        prop::sample::select(MODELS),
        prop::sample::select(SOURCES),
    )
        .prop_map(|(operator, status, reason, station, model, source)| {
            let result_fail = match status {
                "SUCCESS" => "",
                _ => reason.unwrap_or(""),
            };
            Record::new(operator, status, result_fail, station, model).with_source(source)
        })
}

/// Non-empty table so every optional column used by selections exists
pub(crate) fn records_strategy(max: usize) -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 1..max)
}

/// Per-column value subsets, each column left unset about half the time
pub(crate) fn selection_strategy() -> impl Strategy<Value = FilterSelection> {
    let subset = |values: &'static [&'static str]| {
        prop::option::of(prop::sample::subsequence(values, 0..=values.len()))
    };
    (
        subset(OPERATORS),
        subset(STATIONS),
        subset(MODELS),
        subset(SOURCES),
    )
        .prop_map(|(operators, stations, models, sources)| {
            let mut selection = FilterSelection::new();
            for (key, values) in [
                ("operator", operators),
                ("station_id", stations),
                ("model", models),
                ("source", sources),
            ] {
                if let Some(values) = values {
                    selection = selection.with_values(key, values);
                }
            }
            selection
        })
}

/// Calibration table: 1000 FAILURE records (20 without a reason), 23
/// ERROR records with a failure reason, plus ERROR-without-reason and
/// SUCCESS noise. Cells cycle through the vocabularies by index.
pub(crate) fn calibration_records() -> Vec<Record> {
    let pick = |items: &[&'static str], i: usize| items[i % items.len()];
    let mut records = Vec::new();

    for i in 0..1000 {
        let result_fail = if i % 50 == 0 { "" } else { pick(TEST_CASES, i * 3) };
        records.push(Record::new(
            pick(OPERATORS, i / 7),
            "FAILURE",
            result_fail,
            pick(STATIONS, i),
            pick(MODELS, i / 5),
        ));
    }
    for i in 0..23 {
        records.push(Record::new(
            pick(OPERATORS, i),
            "ERROR",
            pick(TEST_CASES, i),
            pick(STATIONS, i * 2),
            pick(MODELS, i),
        ));
    }
    for i in 0..40 {
        records.push(Record::new(
            pick(OPERATORS, i),
            "ERROR",
            "",
            pick(STATIONS, i + 1),
            pick(MODELS, i + 2),
        ));
    }
    for i in 0..500 {
        records.push(Record::new(
            pick(OPERATORS, i),
            "SUCCESS",
            "",
            pick(STATIONS, i),
            pick(MODELS, i / 3),
        ));
    }
    records
}
