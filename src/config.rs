//! Configuration management and validation.
//!
//! Provides the request-scoped configuration consumed by the analysis
//! pipeline: failure-counting mode, row ordering, heat-map settings,
//! breakdown list sizes, the automation operator allow-list and table
//! loading limits.

use crate::constants::{
    DEFAULT_AUTOMATION_OPERATORS, DEFAULT_MIN_REPEATED_FAILURES, DEFAULT_TOP_ERRORS,
    DEFAULT_TOP_FAILURES, DEFAULT_TOP_MODELS,
};
use crate::error::{PivotError, Result};
use crate::models::{FailureMode, PivotKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Ordering of test-case groups and of model rows within a group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Highest Grand Total first; equal totals keep discovery order
    #[default]
    TotalDescending,
    /// Order in which keys first appear in the input
    Discovery,
}

/// Scope of the yellow tier within a test-case group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YellowScope {
    /// Maximum over the combined slice of the top models' rows
    #[default]
    Slice,
    /// Maximum of each top model's row taken separately
    PerModelRow,
}

/// Heat-map settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Leading models per group eligible for the yellow tier
    pub top_models: usize,

    /// How the yellow maximum is taken over those models
    pub yellow_scope: YellowScope,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            top_models: DEFAULT_TOP_MODELS,
            yellow_scope: YellowScope::Slice,
        }
    }
}

/// Ranked breakdown list sizes and the repeated-failure threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakdownConfig {
    /// Entries per top failing stations / models / test cases list
    pub top_failures: usize,

    /// Entries per error list
    pub top_errors: usize,

    /// Minimum count for a repeated failure
    pub min_repeated_failures: usize,
}

impl Default for BreakdownConfig {
    fn default() -> Self {
        Self {
            top_failures: DEFAULT_TOP_FAILURES,
            top_errors: DEFAULT_TOP_ERRORS,
            min_repeated_failures: DEFAULT_MIN_REPEATED_FAILURES,
        }
    }
}

/// Table loading settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Reject tables with more data rows than this
    pub max_rows: Option<usize>,

    /// Field separator byte
    pub delimiter: u8,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_rows: None,
            delimiter: b',',
        }
    }
}

/// Configuration for one analysis request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Failure-counting semantics
    pub failure_mode: FailureMode,

    /// Outer grouping key
    pub pivot_kind: PivotKind,

    /// Ordering of groups and model rows
    pub row_order: RowOrder,

    /// Heat-map settings
    pub highlight: HighlightConfig,

    /// Ranked breakdown settings
    pub breakdown: BreakdownConfig,

    /// Restrict analysis to the automation operator families
    pub automation_only: bool,

    /// Station families recognized as automation operators
    pub automation_operators: Vec<String>,

    /// Table loading settings
    pub loader: LoaderConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            failure_mode: FailureMode::Pure,
            pivot_kind: PivotKind::Failure,
            row_order: RowOrder::TotalDescending,
            highlight: HighlightConfig::default(),
            breakdown: BreakdownConfig::default(),
            automation_only: false,
            automation_operators: DEFAULT_AUTOMATION_OPERATORS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            loader: LoaderConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a JSON document; missing keys take defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PivotError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no analysis can run with
    pub fn validate(&self) -> Result<()> {
        if self.highlight.top_models == 0 {
            return Err(PivotError::Configuration {
                message: "highlight.top_models must be at least 1".to_string(),
            });
        }
        for (name, value) in [
            ("breakdown.top_failures", self.breakdown.top_failures),
            ("breakdown.top_errors", self.breakdown.top_errors),
            ("breakdown.min_repeated_failures", self.breakdown.min_repeated_failures),
        ] {
            if value == 0 {
                return Err(PivotError::Configuration {
                    message: format!("{} must be at least 1", name),
                });
            }
        }
        if self.automation_operators.iter().any(|op| op.trim().is_empty()) {
            return Err(PivotError::Configuration {
                message: "automation_operators must not contain blank entries".to_string(),
            });
        }
        if self.automation_only && self.automation_operators.is_empty() {
            return Err(PivotError::Configuration {
                message: "automation scope requested but no operator families configured"
                    .to_string(),
            });
        }
        if self.loader.max_rows == Some(0) {
            return Err(PivotError::Configuration {
                message: "loader.max_rows must be positive when set".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = mode;
        self
    }

    pub fn with_pivot_kind(mut self, kind: PivotKind) -> Self {
        self.pivot_kind = kind;
        self
    }

    pub fn with_row_order(mut self, order: RowOrder) -> Self {
        self.row_order = order;
        self
    }

    pub fn with_top_models(mut self, top_models: usize) -> Self {
        self.highlight.top_models = top_models;
        self
    }

    pub fn with_yellow_scope(mut self, scope: YellowScope) -> Self {
        self.highlight.yellow_scope = scope;
        self
    }

    pub fn with_top_failures(mut self, top_failures: usize) -> Self {
        self.breakdown.top_failures = top_failures;
        self
    }

    pub fn with_min_repeated_failures(mut self, min_failures: usize) -> Self {
        self.breakdown.min_repeated_failures = min_failures;
        self
    }

    /// Restrict to automation operators
    pub fn with_automation_only(mut self) -> Self {
        self.automation_only = true;
        self
    }

    pub fn with_automation_operators<I, S>(mut self, families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.automation_operators = families.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.loader.max_rows = Some(max_rows);
        self
    }
}
