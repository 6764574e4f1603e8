//! Monsterc Library
//!
//! A Rust library for turning flat test-run CSV exports from automated
//! device-testing lines into hierarchical failure pivots with heat-map
//! highlighting.
//!
//! This library provides tools for:
//! - Loading test-run CSV exports with skipped-row accounting
//! - Filtering records with multi-valued, per-column selections
//! - Classifying failures under Pure and Comprehensive counting modes
//! - Aggregating Test Case → Model → Station pivots with Total rows and
//!   Grand Total columns
//! - Ranking cells into red / orange / yellow heat-map tiers
//! - Ranked breakdowns: top failing stations, models and test cases,
//!   error rates and repeated failures
//! - Exporting pivots to CSV

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod export;
pub mod loader;
pub mod models;
pub mod pivot;

// Re-export commonly used types
pub use config::{
    AnalysisConfig, BreakdownConfig, HighlightConfig, LoaderConfig, RowOrder, YellowScope,
};
pub use error::{PivotError, Result};
pub use export::PivotExporter;
pub use loader::load_csv;
pub use models::{
    ColumnKey, Dataset, FailureMode, FilterSelection, FilterValue, PivotKind, PivotTable, Record,
    Tier,
};
pub use pivot::{AnalysisPipeline, AnalysisReport};
