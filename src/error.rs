//! Error types for `scopecfg`
//!
//! Fatal loader failures are [`ConfigError`]s. Everything the validator
//! finds is a [`ValidationIssue`], collected rather than raised, so a single
//! run reports every problem in a configuration.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `scopecfg` CLI operations.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `scopecfg` operations.
#[derive(Debug, Error)]
pub enum ScopeError {
    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration loaded but did not pass validation
    #[error("configuration has {errors} error(s) and {warnings} warning(s)")]
    Validation {
        /// Number of error-severity issues
        errors: usize,
        /// Number of warning-severity issues
        warnings: usize,
    },

    /// Requested item does not exist in the configuration
    #[error("{0}")]
    NotFound(String),

    /// Metrics recorder could not be installed
    #[error("metrics error: {0}")]
    Metrics(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ScopeError {
    /// Returns the process exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(ConfigError::MissingFile { .. }) | Self::Io(_) => ExitCode::IO_ERROR,
            Self::Config(_) | Self::Validation { .. } | Self::Json(_) | Self::Yaml(_) => {
                ExitCode::CONFIG_ERROR
            }
            Self::NotFound(_) => ExitCode::USAGE_ERROR,
            Self::Metrics(_) => ExitCode::ERROR,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Fatal configuration loading errors.
///
/// Any of these aborts the load; no partially merged configuration is ever
/// returned alongside one.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// No configuration documents were supplied
    #[error("no configuration files given")]
    NoDocuments,

    /// Field has an invalid value
    #[error("invalid value for '{field}': got '{value}', expected {expected}")]
    InvalidValue {
        /// Name of the field with invalid value
        field: String,
        /// The actual value provided
        value: String,
        /// Description of what was expected
        expected: String,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location in the configuration where it was referenced
        location: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// Category of a validation issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Missing required key, wrong value type, duplicate or unknown entry.
    Schema,
    /// Numeric bound violated (`min > max`, `step <= 0`, percentage out of range).
    Range,
    /// Name that does not resolve: device type, inventory entry, parent, axis.
    Reference,
    /// Collections whose sizes must agree, or more than one of a singleton.
    Cardinality,
}

impl IssueKind {
    /// Stable lowercase label, used in output and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Range => "range",
            Self::Reference => "reference",
            Self::Cardinality => "cardinality",
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single issue found while validating a configuration.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ValidationIssue {
    /// Dotted document path (e.g. `microscopes.Mesoscale.stage.hardware[0].axes`)
    pub path: String,
    /// Description of the issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
    /// Issue category
    pub kind: IssueKind,
}

impl ValidationIssue {
    /// Creates an error-severity issue.
    pub fn error(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Error,
            kind,
        }
    }

    /// Creates a warning-severity issue.
    pub fn warning(kind: IssueKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            severity: Severity::Warning,
            kind,
        }
    }

    /// Returns `true` for error-severity issues.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}]: {} at {}", prefix, self.kind, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The configuration must not be used as-is
    Error,
    /// Suspicious but usable
    Warning,
}

impl Severity {
    /// Stable lowercase label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `scopecfg` operations.
pub type Result<T> = std::result::Result<T, ScopeError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
    }

    #[test]
    fn test_parse_error_exit_code() {
        let err: ScopeError = ConfigError::ParseError {
            path: PathBuf::from("scope.yaml"),
            line: Some(3),
            message: "bad indent".to_string(),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_missing_file_exit_code() {
        let err: ScopeError = ConfigError::MissingFile {
            path: PathBuf::from("/nope.yaml"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_exit_code() {
        let err = ScopeError::Validation {
            errors: 2,
            warnings: 0,
        };
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
        assert!(err.to_string().contains("2 error(s)"));
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: ScopeError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue::error(
            IssueKind::Range,
            "microscopes.Mesoscale.stage.x_min",
            "x_min (10) is greater than x_max (5)",
        );
        assert_eq!(
            issue.to_string(),
            "error[range]: x_min (10) is greater than x_max (5) at microscopes.Mesoscale.stage.x_min"
        );
    }

    #[test]
    fn test_validation_issue_warning_display() {
        let issue = ValidationIssue::warning(IssueKind::Schema, "gui.colors", "unknown section");
        assert!(!issue.is_error());
        assert_eq!(
            issue.to_string(),
            "warning[schema]: unknown section at gui.colors"
        );
    }

    #[test]
    fn test_issue_serializes_with_snake_case_labels() {
        let issue = ValidationIssue::error(IssueKind::Cardinality, "p", "m");
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "cardinality");
        assert_eq!(json["severity"], "error");
    }

    #[test]
    fn test_config_error_env_var_display() {
        let err = ConfigError::EnvVarNotSet {
            var: "FILTER_PORT".to_string(),
            location: "serial port must be set".to_string(),
        };
        assert!(err.to_string().contains("FILTER_PORT"));
    }
}
