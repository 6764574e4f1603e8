//! Application constants for the pivot analysis tool
//!
//! This module contains the CSV header names, status literals, display
//! labels and default allow-lists used throughout the application.

// =============================================================================
// CSV Header Names
// =============================================================================

/// Column names as they appear in test-run CSV exports
pub mod columns {
    pub const OPERATOR: &str = "Operator";
    pub const OVERALL_STATUS: &str = "Overall status";
    pub const RESULT_FAIL: &str = "result_FAIL";
    pub const STATION_ID: &str = "Station ID";
    pub const MODEL: &str = "Model";
    pub const SOURCE: &str = "Source";
    pub const ERROR_CODE: &str = "error_code";
    pub const ERROR_MESSAGE: &str = "error_message";
}

/// Columns a row must populate to take part in any analysis
pub const REQUIRED_COLUMNS: &[&str] = &[
    columns::OPERATOR,
    columns::OVERALL_STATUS,
    columns::STATION_ID,
    columns::MODEL,
];

/// Snake-case aliases accepted as filter keys, mapped to their header names
pub const COLUMN_ALIASES: &[(&str, &str)] = &[
    ("operator", columns::OPERATOR),
    ("overall_status", columns::OVERALL_STATUS),
    ("result_fail", columns::RESULT_FAIL),
    ("station_id", columns::STATION_ID),
    ("model", columns::MODEL),
    ("source", columns::SOURCE),
    ("error_code", columns::ERROR_CODE),
    ("error_message", columns::ERROR_MESSAGE),
];

// =============================================================================
// Status Values
// =============================================================================

/// `Overall status` literals
pub mod status {
    pub const SUCCESS: &str = "SUCCESS";
    pub const FAILURE: &str = "FAILURE";
    pub const ERROR: &str = "ERROR";
}

// =============================================================================
// Filters and Labels
// =============================================================================

/// Filter value meaning "no constraint on this column"
pub const ALL_SENTINEL: &str = "All";

/// Label of the synthetic per-group subtotal row
pub const TOTAL_ROW_LABEL: &str = "Total";

/// Header of the synthetic horizontal-sum column
pub const GRAND_TOTAL_LABEL: &str = "Grand Total";

/// Placeholder for blank error fields in the error-code pivot
pub const BLANK_PLACEHOLDER: &str = "(blank)";

/// Header used for the outer grouping key in exports
pub const TEST_CASE_HEADER: &str = "Test Case";

/// Header used for the outer grouping key of the error-code pivot in exports
pub const ERROR_CODE_HEADER: &str = "Error Code";

// =============================================================================
// Automation Scope
// =============================================================================

/// Station families whose operators run the automated test lines
pub const DEFAULT_AUTOMATION_OPERATORS: &[&str] =
    &["STN251_RED", "STN252_RED", "STN351_GRN", "STN352_GRN"];

/// Extracts the station family from an operator such as `STN251_RED(id:10089)`
pub const OPERATOR_FAMILY_PATTERN: &str = r"^\s*([^(\s]+)\s*(?:\(id:\s*\d+\))?\s*$";

// =============================================================================
// Highlighting
// =============================================================================

/// Number of leading models per test case eligible for the yellow tier
pub const DEFAULT_TOP_MODELS: usize = 3;

// =============================================================================
// Breakdowns
// =============================================================================

/// Entries kept in each top failing stations / models / test cases list
pub const DEFAULT_TOP_FAILURES: usize = 10;

/// Entries kept in the per-model error and error-rate lists
pub const DEFAULT_TOP_ERRORS: usize = 5;

/// Failures of one test case on one (model, station) pair before it is
/// reported as repeated
pub const DEFAULT_MIN_REPEATED_FAILURES: usize = 4;

/// Error codes that mean "no error"
pub const NO_ERROR_CODE: &str = "0";
