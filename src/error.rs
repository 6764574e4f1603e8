//! Error handling for pivot analysis operations.
//!
//! Provides error types with context for table loading, filter
//! validation, configuration and export failures.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PivotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Required column '{column}' missing from table: {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Filter references unknown column '{column}' (available: {})", .available.join(", "))]
    InvalidFilterColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Table {path} exceeds the row ceiling of {limit} rows")]
    RowLimitExceeded { path: PathBuf, limit: usize },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, PivotError>;
