//! Error types for the tracelink-rs library.
//!
//! Boundary-data inconsistencies and training degeneracy are fatal and
//! terminate a run; per-pair diff-parsing anomalies are recovered locally
//! and aggregated into [`crate::io::diff::DiffDiagnostics`] instead of
//! surfacing here.

use std::io;

use thiserror::Error;

/// Main result type for tracelink operations.
pub type Result<T> = std::result::Result<T, TracelinkError>;

/// Comprehensive error type for all tracelink operations.
#[derive(Error, Debug)]
pub enum TracelinkError {
    /// I/O related errors (file operations, git access, etc.)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors (unknown model name, non-positive threshold,
    /// missing lexical resource bundle, empty candidate universe)
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// An issue or commit referenced by a candidate pair has no entry in
    /// its boundary repository. Indicates an upstream extraction
    /// inconsistency and always aborts the run.
    #[error("Missing {kind} record: {key}")]
    MissingData {
        /// Record kind ("issue" or "commit")
        kind: String,
        /// The identifier that failed to resolve
        key: String,
    },

    /// The PU correction constant is undefined because no training example
    /// carries the positive label.
    #[error("Degenerate training set: {message}")]
    DegenerateTraining {
        /// Error description
        message: String,
    },

    /// Parsing errors for dates, patches, and repository metadata
    #[error("Parse error: {message}")]
    Parse {
        /// Error description
        message: String,
        /// Input fragment that failed to parse
        input: Option<String>,
    },

    /// Pipeline stage failures
    #[error("Pipeline error at stage '{stage}': {message}")]
    Pipeline {
        /// Pipeline stage where the error occurred
        stage: String,
        /// Error description
        message: String,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
    },

    /// Git repository access errors
    #[error("Git error: {message}")]
    Git {
        /// Error description
        message: String,
        /// Underlying libgit2 error
        #[source]
        source: Option<git2::Error>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
    },
}

impl TracelinkError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a missing-issue error
    pub fn missing_issue(id: impl Into<String>) -> Self {
        Self::MissingData {
            kind: "issue".to_string(),
            key: id.into(),
        }
    }

    /// Create a missing-commit error
    pub fn missing_commit(hash: impl Into<String>) -> Self {
        Self::MissingData {
            kind: "commit".to_string(),
            key: hash.into(),
        }
    }

    /// Create a degenerate-training error
    pub fn degenerate_training(message: impl Into<String>) -> Self {
        Self::DegenerateTraining {
            message: message.into(),
        }
    }

    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            input: None,
        }
    }

    /// Create a new parse error with the offending input
    pub fn parse_with_input(message: impl Into<String>, input: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            input: Some(input.into()),
        }
    }

    /// Create a new pipeline error
    pub fn pipeline(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Pipeline {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<git2::Error> for TracelinkError {
    fn from(err: git2::Error) -> Self {
        Self::Git {
            message: err.message().to_string(),
            source: Some(err),
        }
    }
}

impl From<serde_yaml::Error> for TracelinkError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Parse {
            message: format!("YAML error: {err}"),
            input: None,
        }
    }
}

impl From<serde_json::Error> for TracelinkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: format!("JSON error: {err}"),
            input: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TracelinkError::missing_issue("HADOOP-1234");
        assert_eq!(err.to_string(), "Missing issue record: HADOOP-1234");

        let err = TracelinkError::pipeline("featureset", "no candidates");
        assert_eq!(
            err.to_string(),
            "Pipeline error at stage 'featureset': no candidates"
        );
    }

    #[test]
    fn test_config_field_context() {
        let err = TracelinkError::config_field("must be positive", "shared_files.duplicate_rate");
        match err {
            TracelinkError::Config { field, .. } => {
                assert_eq!(field.as_deref(), Some("shared_files.duplicate_rate"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
