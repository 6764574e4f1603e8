//! Pipeline benchmarks over synthetic test-run tables
//!
//! Run with `cargo bench --bench pivot_pipeline`

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use monsterc::config::YellowScope;
use monsterc::{AnalysisConfig, AnalysisPipeline, Dataset, FailureMode, FilterSelection, Record};

const STATUSES: &[&str] = &["FAILURE", "FAILURE", "ERROR", "SUCCESS", "SUCCESS", "SUCCESS"];
const TEST_CASES: &[&str] = &[
    "Camera Pictures",
    "Camera Flash",
    "Camera Pictures,Camera Flash",
    "AQA_Microphone",
    "Touch screen",
    "Bluetooth",
    "WiFi",
];
const OPERATORS: &[&str] = &["STN251_RED(id:10089)", "STN352_GRN(id:10381)", "manual"];

/// Deterministic table: same size always produces the same records
fn synthetic_dataset(rows: usize) -> Dataset {
    let records = (0..rows)
        .map(|i| {
            let status = STATUSES[i % STATUSES.len()];
            let result_fail = if status == "SUCCESS" {
                ""
            } else {
                TEST_CASES[(i / 7) % TEST_CASES.len()]
            };
            Record::new(
                OPERATORS[i % OPERATORS.len()],
                status,
                result_fail,
                format!("radi{:03}", (i * 31) % 40),
                format!("model-{:02}", (i * 17) % 25),
            )
        })
        .collect();
    Dataset::from_records(records)
}

fn bench_pipeline_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline_scaling");
    let pipeline = AnalysisPipeline::new(AnalysisConfig::default());
    let selection = FilterSelection::new();

    for rows in [1_000, 10_000, 100_000] {
        let dataset = synthetic_dataset(rows);
        group.throughput(Throughput::Elements(rows as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &dataset, |b, dataset| {
            b.iter(|| pipeline.run(black_box(dataset), black_box(&selection)))
        });
    }
    group.finish();
}

fn bench_modes_and_filters(c: &mut Criterion) {
    let dataset = synthetic_dataset(50_000);
    let filtered = FilterSelection::new()
        .with_values("station_id", ["radi001", "radi010", "radi020"])
        .with_values("operator", ["STN251_RED(id:10089)", "manual"]);

    let comprehensive = AnalysisPipeline::new(
        AnalysisConfig::default()
            .with_failure_mode(FailureMode::Comprehensive)
            .with_yellow_scope(YellowScope::PerModelRow),
    );
    c.bench_function("comprehensive_per_model_row_50k", |b| {
        b.iter(|| comprehensive.run(black_box(&dataset), black_box(&FilterSelection::new())))
    });

    let scoped = AnalysisPipeline::new(AnalysisConfig::default().with_automation_only());
    c.bench_function("filtered_automation_scope_50k", |b| {
        b.iter(|| scoped.run(black_box(&dataset), black_box(&filtered)))
    });
}

criterion_group!(benches, bench_pipeline_scaling, bench_modes_and_filters);
criterion_main!(benches);
