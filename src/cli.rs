//! Command-line interface components.
//!
//! Parses arguments, layers configuration (defaults, `--config` file, flag
//! overrides), runs one analysis and renders the report as a colored grid
//! or JSON.

use crate::config::{AnalysisConfig, RowOrder, YellowScope};
use crate::constants::{ALL_SENTINEL, columns};
use crate::export::{PivotExporter, group_header};
use crate::loader::load_csv;
use crate::models::{FailureMode, FilterSelection, PivotCell, PivotKind, PivotRow, RowKind, Tier};
use crate::pivot::breakdown::RankedCount;
use crate::pivot::{AnalysisPipeline, AnalysisReport};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::*;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Build failure pivots and heat maps from test-run CSV exports
#[derive(Parser, Debug, Clone)]
#[command(name = "monsterc")]
#[command(about = "Build failure pivots and heat maps from test-run CSV exports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    /// Test-run CSV export to analyze
    #[arg(value_name = "CSV")]
    pub csv_path: PathBuf,

    /// Keep only these operators (repeatable; "All" clears the filter)
    #[arg(long, value_name = "VALUE")]
    pub operator: Vec<String>,

    /// Keep only these stations (repeatable)
    #[arg(long, value_name = "VALUE")]
    pub station: Vec<String>,

    /// Keep only these models (repeatable)
    #[arg(long, value_name = "VALUE")]
    pub model: Vec<String>,

    /// Keep only these sources (repeatable)
    #[arg(long, value_name = "VALUE")]
    pub source: Vec<String>,

    /// Filter on any column, as COLUMN=VALUE (repeatable)
    #[arg(long = "filter", value_name = "COLUMN=VALUE")]
    pub filters: Vec<String>,

    /// Failure-counting mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Outer grouping of the pivot
    #[arg(long, value_enum)]
    pub pivot: Option<PivotArg>,

    /// Restrict to automation operator families
    #[arg(long)]
    pub automation: bool,

    /// Ordering of test cases and model rows
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// Leading models per test case eligible for yellow highlighting
    #[arg(long, value_name = "N")]
    pub top_models: Option<usize>,

    /// How the yellow maximum is taken over the top models
    #[arg(long, value_enum)]
    pub yellow_scope: Option<ScopeArg>,

    /// Entries per top failing stations / models / test cases list
    #[arg(long, value_name = "N")]
    pub top_n: Option<usize>,

    /// Failures of one test case on one model and station before it is
    /// reported as repeated
    #[arg(long, value_name = "N")]
    pub min_failures: Option<usize>,

    /// JSON configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Also write the pivot to this CSV file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Reject tables with more data rows than this
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,

    /// Enable verbose logging (-v: info, -vv: debug, -vvv: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Only FAILURE records count
    Pure,
    /// FAILURE plus ERROR records with a failure reason
    Comprehensive,
}

impl From<ModeArg> for FailureMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Pure => FailureMode::Pure,
            ModeArg::Comprehensive => FailureMode::Comprehensive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PivotArg {
    /// Group by result_FAIL
    Failure,
    /// Group by error code and message
    Error,
}

impl From<PivotArg> for PivotKind {
    fn from(pivot: PivotArg) -> Self {
        match pivot {
            PivotArg::Failure => PivotKind::Failure,
            PivotArg::Error => PivotKind::ErrorCode,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OrderArg {
    /// Highest total first
    Total,
    /// Order of first appearance
    Discovery,
}

impl From<OrderArg> for RowOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Total => RowOrder::TotalDescending,
            OrderArg::Discovery => RowOrder::Discovery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Maximum over the combined top-model slice
    Slice,
    /// Maximum of each top model's row
    Row,
}

impl From<ScopeArg> for YellowScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Slice => YellowScope::Slice,
            ScopeArg::Row => YellowScope::PerModelRow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored terminal grid
    Table,
    /// JSON report for scripting
    Json,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Collect the filter flags into a selection keyed by header name
    pub fn filter_selection(&self) -> Result<FilterSelection> {
        let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();

        for (column, flag_values) in [
            (columns::OPERATOR, &self.operator),
            (columns::STATION_ID, &self.station),
            (columns::MODEL, &self.model),
            (columns::SOURCE, &self.source),
        ] {
            if !flag_values.is_empty() {
                values
                    .entry(column.to_string())
                    .or_default()
                    .extend(flag_values.iter().cloned());
            }
        }

        for filter in &self.filters {
            let Some((column, value)) = filter.split_once('=') else {
                bail!("Invalid filter '{}': expected COLUMN=VALUE", filter);
            };
            let column = column.trim();
            if column.is_empty() {
                bail!("Invalid filter '{}': column name is empty", filter);
            }
            values
                .entry(column.to_string())
                .or_default()
                .push(value.trim().to_string());
        }

        let mut selection = FilterSelection::new();
        for (column, accepted) in values {
            if accepted.iter().any(|v| v == ALL_SENTINEL) {
                debug!("Filter on '{}' cleared by '{}'", column, ALL_SENTINEL);
            }
            selection = selection.with_values(column, accepted);
        }
        Ok(selection)
    }
}

/// Set up structured logging
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("monsterc={}", log_level)));

    if args.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Layer configuration: defaults, then the config file, then flags
pub fn load_configuration(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Using config file: {}", path.display());
            AnalysisConfig::from_file(path)
                .with_context(|| format!("Failed to load config file {}", path.display()))?
        }
        None => AnalysisConfig::default(),
    };

    apply_cli_overrides(&mut config, args);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Apply CLI argument overrides to configuration
pub fn apply_cli_overrides(config: &mut AnalysisConfig, args: &Args) {
    if let Some(mode) = args.mode {
        config.failure_mode = mode.into();
    }
    if let Some(pivot) = args.pivot {
        config.pivot_kind = pivot.into();
    }
    if args.automation {
        config.automation_only = true;
    }
    if let Some(order) = args.order {
        config.row_order = order.into();
    }
    if let Some(top_models) = args.top_models {
        config.highlight.top_models = top_models;
    }
    if let Some(scope) = args.yellow_scope {
        config.highlight.yellow_scope = scope.into();
    }
    if let Some(top_n) = args.top_n {
        config.breakdown.top_failures = top_n;
    }
    if let Some(min_failures) = args.min_failures {
        config.breakdown.min_repeated_failures = min_failures;
    }
    if let Some(max_rows) = args.max_rows {
        config.loader.max_rows = Some(max_rows);
    }
}

/// Run one analysis end to end
pub fn run(args: Args) -> Result<()> {
    setup_logging(&args)?;

    let config = load_configuration(&args)?;
    let selection = args.filter_selection()?;

    let dataset = load_csv(&args.csv_path, &config.loader)
        .with_context(|| format!("Failed to load {}", args.csv_path.display()))?;

    let report = AnalysisPipeline::new(config)
        .run(&dataset, &selection)
        .context("Analysis failed")?;

    if let Some(path) = &args.export {
        PivotExporter::new(path)
            .write_csv(&report.pivot)
            .with_context(|| format!("Failed to export pivot to {}", path.display()))?;
    }

    match args.format {
        OutputFormat::Table => print!("{}", ReportView(&report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    Ok(())
}

fn style_cell(text: &str, tier: Tier) -> ColoredString {
    match tier {
        Tier::Red => text.white().bold().on_red(),
        Tier::Orange => text.black().on_truecolor(255, 152, 0),
        Tier::Yellow => text.black().on_yellow(),
        Tier::None => text.normal(),
    }
}

fn cell_text(cell: &PivotCell) -> String {
    if cell.count == 0 {
        String::new()
    } else {
        cell.count.to_string()
    }
}

/// Terminal rendering of a report: the pivot grid, the summary block and
/// the ranked breakdowns
pub struct ReportView<'a>(pub &'a AnalysisReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(
            f,
            "\n{} ({})",
            "Failure Pivot".bright_green().bold(),
            report.failure_mode.label()
        )?;
        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;

        if report.is_empty() {
            writeln!(f, "{}", "No data for the current selection".bright_yellow())?;
        } else {
            render_grid(report, f)?;
        }

        render_summary(report, f)?;
        render_breakdown(report, f)
    }
}

/// Render the pivot grid followed by the summary block
pub fn render_report(report: &AnalysisReport) -> String {
    ReportView(report).to_string()
}

fn render_grid(report: &AnalysisReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let pivot = &report.pivot;
    let key_header = group_header(pivot.kind);

    let key_width = pivot
        .groups
        .iter()
        .map(|g| g.key.chars().count())
        .chain(std::iter::once(key_header.len()))
        .max()
        .unwrap_or(0);
    let model_width = pivot
        .groups
        .iter()
        .flat_map(|g| g.rows())
        .map(|r| r.label.chars().count())
        .chain(std::iter::once(columns::MODEL.len()))
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = report
        .columns
        .iter()
        .map(|c| c.label().chars().count().max(pivot.grand_total().to_string().len()))
        .collect();

    write!(f, "{:<key_width$}  {:<model_width$}", key_header, columns::MODEL)?;
    for (column, &width) in report.columns.iter().zip(&widths) {
        write!(f, "  {:>width$}", column.label())?;
    }
    writeln!(f)?;

    for group in &pivot.groups {
        for (i, row) in group.rows().enumerate() {
            let key = if i == 0 { group.key.as_str() } else { "" };
            write!(f, "{:<key_width$}  ", key)?;
            render_row(row, &widths, model_width, f)?;
        }
    }
    Ok(())
}

fn render_row(
    row: &PivotRow,
    widths: &[usize],
    model_width: usize,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    let is_total = row.kind == RowKind::Total;
    let label = format!("{:<model_width$}", row.label);
    write!(f, "{}", if is_total { label.bold() } else { label.normal() })?;

    for (cell, &width) in row.cells.iter().zip(widths) {
        let text = format!("{:>width$}", cell_text(cell));
        write!(f, "  {}", style_cell(&text, cell.tier))?;
    }

    let grand_width = widths.last().copied().unwrap_or(0);
    let grand = format!("{:>grand_width$}", row.grand_total);
    writeln!(f, "  {}", if is_total { grand.bold() } else { grand.normal() })
}

fn render_summary(report: &AnalysisReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let summary = &report.summary;
    writeln!(f, "\n📊 Summary:")?;
    writeln!(f, "   • Rows loaded: {}", report.rows_in)?;
    writeln!(f, "   • Rows after filters: {}", report.rows_filtered)?;
    writeln!(f, "   • Failures counted: {}", summary.total_failures)?;
    if let Some(cell) = &summary.highest_cell {
        writeln!(
            f,
            "   • Highest cell: {} / {} @ {} = {}",
            cell.group, cell.model, cell.station, cell.count
        )?;
    }
    if let Some((group, total)) = &summary.highest_group {
        writeln!(f, "   • Top test case: {} ({})", group, total)?;
    }
    if let Some((model, total)) = &summary.highest_model {
        writeln!(f, "   • Top model: {} ({})", model, total)?;
    }
    if let Some((station, total)) = summary.station_totals.first() {
        writeln!(f, "   • Top station: {} ({})", station, total)?;
    }
    writeln!(
        f,
        "   • Status: {} success, {} failure, {} error, {} other ({:.1}% failure rate)",
        report.status.success,
        report.status.failure,
        report.status.error,
        report.status.other,
        report.status.failure_rate
    )?;

    if report.skipped_records > 0 {
        writeln!(
            f,
            "⚠️  Rows skipped for missing required fields: {}",
            report.skipped_records
        )?;
    }
    if report.phantom_results.count > 0 {
        writeln!(
            f,
            "⚠️  Records with result_FAIL but not FAILURE status: {}",
            report.phantom_results.count
        )?;
    }
    writeln!(f, "   • Processing time: {} ms", report.processing_time_ms)
}

fn render_ranked(title: &str, ranked: &[RankedCount], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if ranked.is_empty() {
        return Ok(());
    }
    writeln!(f, "\n{}", title.bold())?;
    for (i, entry) in ranked.iter().enumerate() {
        writeln!(f, "   {:>2}. {} ({})", i + 1, entry.key, entry.count)?;
    }
    Ok(())
}

fn render_breakdown(report: &AnalysisReport, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let breakdown = &report.breakdown;
    render_ranked("Top failing stations", &breakdown.top.stations, f)?;
    render_ranked("Top failing models", &breakdown.top.models, f)?;
    render_ranked("Top failing test cases", &breakdown.top.test_cases, f)?;

    if !breakdown.errors_by_model.is_empty() {
        writeln!(f, "\n{}", "Top errors by model".bold())?;
        for error in &breakdown.errors_by_model {
            writeln!(f, "   • {}: {} ({})", error.model, error.test_case, error.count)?;
        }
    }
    if !breakdown.error_rates.is_empty() {
        writeln!(f, "\n{}", "Error rates".bold())?;
        for rate in &breakdown.error_rates {
            writeln!(
                f,
                "   • {} - {}: {} ({:.2}%)",
                rate.error_code, rate.error_message, rate.count, rate.percentage
            )?;
        }
    }
    if !breakdown.repeated_failures.is_empty() {
        writeln!(
            f,
            "\n{} {}",
            "🔁 Repeated failures:".bright_red().bold(),
            breakdown.repeated_failures.len()
        )?;
        for repeated in &breakdown.repeated_failures {
            writeln!(
                f,
                "   • {} @ {}: {} x{}",
                repeated.model, repeated.station_id, repeated.test_case, repeated.count
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dataset, Record};

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("monsterc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_repeated_flags_build_multi_value_filters() {
        let args = parse(&[
            "runs.csv",
            "--station",
            "radi135",
            "--station",
            "radi138",
            "--filter",
            "Source=line1",
        ]);
        let selection = args.filter_selection().unwrap();
        let active: Vec<&str> = selection.iter().map(|(k, _)| k).collect();
        assert_eq!(active, vec!["Source", "Station ID"]);
        assert!(!selection.is_unconstrained());
    }

    #[test]
    fn test_all_clears_filter() {
        let args = parse(&["runs.csv", "--operator", "All", "--operator", "op1"]);
        assert!(args.filter_selection().unwrap().is_unconstrained());
    }

    #[test]
    fn test_malformed_filter_rejected() {
        let args = parse(&["runs.csv", "--filter", "Source"]);
        assert!(args.filter_selection().is_err());
        let args = parse(&["runs.csv", "--filter", "=line1"]);
        assert!(args.filter_selection().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let args = parse(&[
            "runs.csv",
            "--mode",
            "comprehensive",
            "--pivot",
            "error",
            "--order",
            "discovery",
            "--top-models",
            "5",
            "--yellow-scope",
            "row",
            "--automation",
            "--max-rows",
            "100",
            "--top-n",
            "3",
            "--min-failures",
            "2",
        ]);
        let config = load_configuration(&args).unwrap();
        assert_eq!(config.failure_mode, FailureMode::Comprehensive);
        assert_eq!(config.pivot_kind, PivotKind::ErrorCode);
        assert_eq!(config.row_order, RowOrder::Discovery);
        assert_eq!(config.highlight.top_models, 5);
        assert_eq!(config.highlight.yellow_scope, YellowScope::PerModelRow);
        assert!(config.automation_only);
        assert_eq!(config.loader.max_rows, Some(100));
        assert_eq!(config.breakdown.top_failures, 3);
        assert_eq!(config.breakdown.min_repeated_failures, 2);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let args = parse(&["runs.csv", "--top-models", "0"]);
        assert!(load_configuration(&args).is_err());
        let args = parse(&["runs.csv", "--min-failures", "0"]);
        assert!(load_configuration(&args).is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(parse(&["runs.csv"]).get_log_level(), "warn");
        assert_eq!(parse(&["runs.csv", "-vv"]).get_log_level(), "debug");
        assert_eq!(parse(&["runs.csv", "-q", "-v"]).get_log_level(), "error");
    }

    #[test]
    fn test_render_report() {
        let dataset = Dataset::from_records(vec![
            Record::new("op", "FAILURE", "Camera Pictures,Camera Flash", "radi135", "iPhone13"),
            Record::new("op", "FAILURE", "Camera Pictures,Camera Flash", "radi135", "iPhone13"),
            Record::new("op", "FAILURE", "Touch screen", "radi138", "SM-S931U"),
        ]);
        let report = AnalysisPipeline::default()
            .run(&dataset, &FilterSelection::new())
            .unwrap();
        let rendered = render_report(&report);

        assert!(rendered.contains("Camera Pictures,Camera Flash"));
        assert!(rendered.contains("Grand Total"));
        assert!(rendered.contains("Total"));
        assert!(rendered.contains("Failures counted: 3"));
        assert!(rendered.contains("Top failing stations"));
    }

    #[test]
    fn test_render_repeated_failures_and_error_rates() {
        let mut records = vec![
            Record::new("op", "ERROR", "", "radi138", "SM-S931U").with_error("E12", "Timeout"),
        ];
        for _ in 0..4 {
            records.push(Record::new("op", "FAILURE", "Touch screen", "radi135", "iPhone13"));
        }
        let report = AnalysisPipeline::default()
            .run(&Dataset::from_records(records), &FilterSelection::new())
            .unwrap();
        let rendered = render_report(&report);

        assert!(rendered.contains("Repeated failures:"));
        assert!(rendered.contains("iPhone13 @ radi135: Touch screen x4"));
        assert!(rendered.contains("E12 - Timeout: 1 (20.00%)"));
        assert!(rendered.contains("Top errors by model"));
    }

    #[test]
    fn test_render_empty_report() {
        let dataset = Dataset::from_records(vec![Record::new("op", "SUCCESS", "", "s1", "m1")]);
        let report = AnalysisPipeline::default()
            .run(&dataset, &FilterSelection::new())
            .unwrap();
        assert!(render_report(&report).contains("No data for the current selection"));
    }
}
