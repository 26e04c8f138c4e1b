//! Configuration types for tracelink-rs.
//!
//! One immutable [`TracelinkConfig`] is built at startup, validated, and
//! passed explicitly into every component constructor. There is no ambient
//! or global configuration state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, TracelinkError};
use crate::core::types::{CommitDateField, IssueDateField, NameField};

/// Main configuration for the link-recovery pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TracelinkConfig {
    /// Project identity (issue-id prefix, source extensions)
    pub project: ProjectConfig,

    /// Wide candidate-generation window
    pub candidates: CandidateConfig,

    /// Narrow time-confirmation window
    pub time_filter: TimeFilterConfig,

    /// Shared-file coverage filter
    #[serde(default)]
    pub shared_files: SharedFileConfig,

    /// Word-to-file association model
    #[serde(default)]
    pub word_assoc: WordAssocConfig,

    /// TF-IDF similarity thresholds and NSD extraction
    #[serde(default)]
    pub similarity: SimilarityConfig,

    /// Phantom expansion envelope
    #[serde(default)]
    pub phantom: PhantomConfig,

    /// Classifier selection and hyperparameter search
    #[serde(default)]
    pub learning: LearningConfig,

    /// Local lexical resource bundles
    #[serde(default)]
    pub resources: ResourceConfig,
}

impl TracelinkConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            TracelinkError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;
        serde_yaml::from_str(&content).map_err(Into::into)
    }

    /// Serialize configuration to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Validate every threshold and window. Fatal at startup: a pipeline is
    /// never constructed from an invalid configuration.
    pub fn validate(&self) -> Result<()> {
        if self.project.issue_prefix.is_empty() {
            return Err(TracelinkError::config_field(
                "issue prefix must not be empty",
                "project.issue_prefix",
            ));
        }
        if self.candidates.before_secs < 0 || self.candidates.after_secs < 0 {
            return Err(TracelinkError::config_field(
                "candidate window must be non-negative",
                "candidates.before_secs/after_secs",
            ));
        }
        if self.time_filter.before_secs < 0 || self.time_filter.after_secs < 0 {
            return Err(TracelinkError::config_field(
                "confirmation window must be non-negative",
                "time_filter.before_secs/after_secs",
            ));
        }
        for (value, field) in [
            (self.shared_files.duplicate_rate, "shared_files.duplicate_rate"),
            (self.word_assoc.threshold, "word_assoc.threshold"),
            (self.similarity.message_threshold, "similarity.message_threshold"),
            (self.similarity.nsd_threshold, "similarity.nsd_threshold"),
            (self.similarity.comment_threshold, "similarity.comment_threshold"),
            (self.phantom.duplicate_rate, "phantom.duplicate_rate"),
        ] {
            if value <= 0.0 || !value.is_finite() {
                return Err(TracelinkError::config_field(
                    format!("threshold must be a positive finite number, got {value}"),
                    field,
                ));
            }
        }
        if let Some(rate) = self.learning.blind_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(TracelinkError::config_field(
                    format!("blind rate must be in [0, 1], got {rate}"),
                    "learning.blind_rate",
                ));
            }
        }
        if self.learning.alpha_grid.is_empty() {
            return Err(TracelinkError::config_field(
                "hyperparameter grid must not be empty",
                "learning.alpha_grid",
            ));
        }
        self.resources.validate()?;
        Ok(())
    }
}

/// Project identity settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Issue-id prefix, e.g. `HADOOP`. The keyword pattern is
    /// `{prefix}-[0-9]+`.
    pub issue_prefix: String,

    /// Extensions counted as source files for the commit feature pair
    pub source_extensions: Vec<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            issue_prefix: "HADOOP".to_string(),
            source_extensions: vec![".java".to_string()],
        }
    }
}

/// Wide window bounding the candidate universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Seconds before each commit date still considered plausible
    pub before_secs: i64,

    /// Seconds after each commit date still considered plausible
    pub after_secs: i64,

    /// Issue date field used for the time-delta feature
    pub issue_date_field: IssueDateField,

    /// Commit date field used for the time-delta feature
    pub commit_date_field: CommitDateField,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            before_secs: 7 * 86_400,
            after_secs: 7 * 86_400,
            issue_date_field: IssueDateField::Resolved,
            commit_date_field: CommitDateField::CommitDate,
        }
    }
}

/// Narrow window for high-confidence time confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeFilterConfig {
    /// Seconds before the commit date
    pub before_secs: i64,

    /// Seconds after the commit date
    pub after_secs: i64,

    /// Single issue reference date field
    pub issue_date_field: IssueDateField,

    /// Single commit reference date field
    pub commit_date_field: CommitDateField,
}

impl Default for TimeFilterConfig {
    fn default() -> Self {
        Self {
            before_secs: 0,
            after_secs: 600,
            issue_date_field: IssueDateField::Resolved,
            commit_date_field: CommitDateField::CommitDate,
        }
    }
}

/// Shared-file coverage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedFileConfig {
    /// Minimum `|issue ∩ commit| / |issue|` ratio to confirm a pair
    pub duplicate_rate: f64,
}

impl Default for SharedFileConfig {
    fn default() -> Self {
        Self {
            duplicate_rate: 0.66,
        }
    }
}

/// Word-association model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordAssocConfig {
    /// Minimum `mu_CB` score to confirm a pair
    pub threshold: f64,

    /// Extensions of files whose content vocabulary participates
    pub extensions: Vec<String>,
}

impl Default for WordAssocConfig {
    fn default() -> Self {
        Self {
            threshold: 0.2,
            extensions: vec![".java".to_string()],
        }
    }
}

/// Similarity-engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Cosine threshold when scoring commit messages
    pub message_threshold: f64,

    /// Cosine threshold when scoring non-source-document diff text
    pub nsd_threshold: f64,

    /// Cosine threshold when scoring extracted doc-comment text
    pub comment_threshold: f64,

    /// Context lines requested from the diff source for NSD text
    pub context_lines: u32,

    /// Extensions treated as non-source documents
    pub nsd_extensions: Vec<String>,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            message_threshold: 0.3,
            nsd_threshold: 0.2,
            comment_threshold: 0.4,
            context_lines: 3,
            nsd_extensions: vec![".md".to_string(), ".txt".to_string()],
        }
    }
}

/// Phantom-expansion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhantomConfig {
    /// Days before a linked commit's date still in the envelope
    pub before_days: i64,

    /// Days after a linked commit's date still in the envelope
    pub after_days: i64,

    /// Minimum file-overlap ratio against the linked commit's file set
    pub duplicate_rate: f64,

    /// Developer identity compared between the two commits
    pub name_field: NameField,
}

impl Default for PhantomConfig {
    fn default() -> Self {
        Self {
            before_days: 3,
            after_days: 3,
            duplicate_rate: 0.66,
            name_field: NameField::Committer,
        }
    }
}

/// Which final decision stage a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Elkan–Noto PU-corrected classifier (primary path)
    Pu,
    /// Plain supervised classifier on the noisy labels (comparison baseline)
    Supervised,
}

/// Classifier and hyperparameter-search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningConfig {
    /// Decision stage selection
    pub model: ModelKind,

    /// L2 regularization strengths searched by cross-validation
    pub alpha_grid: Vec<f64>,

    /// SGD passes over the training data
    pub epochs: usize,

    /// Cross-validation folds in the grid search
    pub folds: usize,

    /// Seed for shuffling, fold assignment, and blinding
    pub seed: u64,

    /// Optional fraction of keyword-linked commits hidden from the
    /// positive map before training (evaluation aid)
    pub blind_rate: Option<f64>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Pu,
            alpha_grid: log_space(-4.0, 0.0, 10),
            epochs: 50,
            folds: 3,
            seed: 200,
            blind_rate: None,
        }
    }
}

/// Lexical resource bundle locations. When a path is `None` the embedded
/// default bundle is used; a configured path that cannot be read is a
/// startup configuration error, never a runtime surprise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Newline-separated stop-word list
    pub stopwords_path: Option<PathBuf>,

    /// Two-column (word, canonical) synonym table, tab-separated
    pub thesaurus_path: Option<PathBuf>,
}

impl ResourceConfig {
    fn validate(&self) -> Result<()> {
        for (path, field) in [
            (&self.stopwords_path, "resources.stopwords_path"),
            (&self.thesaurus_path, "resources.thesaurus_path"),
        ] {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(TracelinkError::config_field(
                        format!("resource bundle not found: {}", path.display()),
                        field,
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Evenly log-spaced grid between `10^lo` and `10^hi`, inclusive.
pub fn log_space(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    if n <= 1 {
        return vec![10f64.powf(lo)];
    }
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|i| 10f64.powf(lo + step * i as f64)).collect()
}
