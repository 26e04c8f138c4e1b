//! Unified-diff parsing for patches and NSD text extraction.
//!
//! Two consumers: issue patch headers yield the file paths an attached
//! patch touches, and commit diffs yield the added-plus-context text of
//! changed non-source documents. A file expected in a diff but absent
//! from its parsed body (rename/move detection limits) is skipped and
//! recorded, never fatal.

use ahash::AHashMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::core::types::CommitHash;

static PRE_FILE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---\s(\S+)").unwrap());
static NEW_FILE_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+\+\+\s(?:b/)?(\S+)").unwrap());
static HUNK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@@\s-(\d+).+\+(\d+),(\d+)\s@@").unwrap());

/// One skipped file during diff parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MalformedDiff {
    /// Commit whose diff was affected
    pub commit: CommitHash,
    /// File expected in the diff body but not found
    pub file: String,
}

/// Aggregated per-pair diff anomalies for one run.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct DiffDiagnostics {
    warnings: Vec<MalformedDiff>,
}

impl DiffDiagnostics {
    /// Record one skipped file.
    pub fn record(&mut self, commit: impl Into<CommitHash>, file: impl Into<String>) {
        let entry = MalformedDiff {
            commit: commit.into(),
            file: file.into(),
        };
        warn!(commit = %entry.commit, file = %entry.file, "file missing from parsed diff body");
        self.warnings.push(entry);
    }

    /// All recorded anomalies, in recording order.
    pub fn warnings(&self) -> &[MalformedDiff] {
        &self.warnings
    }

    /// Number of recorded anomalies.
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    /// True when nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: DiffDiagnostics) {
        self.warnings.extend(other.warnings);
    }
}

/// File paths named by the `---` header lines of a unified patch.
///
/// The pre-image side is used because issue trackers carry patches made
/// against the tree the reporter had, which is what a resolving commit's
/// file set is compared to.
pub fn patch_paths(patch: &str) -> Vec<String> {
    patch
        .lines()
        .filter_map(|line| PRE_FILE_LINE.captures(line))
        .map(|captures| captures[1].to_string())
        .collect()
}

/// Split a `git show`-style diff into per-file added-plus-context text.
///
/// Hunk bookkeeping follows the `@@ -a,b +c,d @@` post-image line count:
/// added and context lines advance it, deletions do not, and a hunk ends
/// when the count is reached.
pub fn split_diff_by_file(diff: &str) -> AHashMap<String, String> {
    let mut by_file: AHashMap<String, String> = AHashMap::new();
    let mut current_file: Option<String> = None;
    let mut remaining: usize = 0;
    let mut in_hunk = false;

    for line in diff.lines() {
        if let Some(captures) = NEW_FILE_LINE.captures(line) {
            let file = captures[1].to_string();
            by_file.entry(file.clone()).or_default();
            current_file = Some(file);
            in_hunk = false;
            continue;
        }

        if !in_hunk {
            if let Some(captures) = HUNK_LINE.captures(line) {
                remaining = captures[3].parse().unwrap_or(0);
                in_hunk = remaining > 0;
                continue;
            }
        }

        if in_hunk {
            let Some(file) = &current_file else { continue };
            let Some(text) = by_file.get_mut(file) else { continue };
            if line.starts_with('-') {
                // Deletion: not part of the post-image, no count progress.
            } else if let Some(added) = line.strip_prefix('+') {
                text.push(' ');
                text.push_str(added);
                text.push('\n');
                remaining -= 1;
            } else {
                text.push_str(line);
                text.push('\n');
                remaining -= 1;
            }
            if remaining == 0 {
                in_hunk = false;
            }
        }
    }

    by_file
}

/// Concatenated NSD text of one commit: added-plus-context text of every
/// changed file carrying an NSD extension. Files whose text cannot be
/// located in the diff body are skipped and recorded in the returned
/// diagnostics, which the caller folds into its run-level report.
pub fn nsd_text(
    commit_hash: &str,
    changed_files: &[String],
    diff: &str,
    nsd_extensions: &[String],
) -> (String, DiffDiagnostics) {
    let by_file = split_diff_by_file(diff);
    let mut text = String::new();
    let mut diagnostics = DiffDiagnostics::default();
    for file in changed_files {
        if !nsd_extensions.iter().any(|ext| file.ends_with(ext.as_str())) {
            continue;
        }
        match by_file.get(file.as_str()) {
            Some(file_text) => text.push_str(file_text),
            None => diagnostics.record(commit_hash, file.clone()),
        }
    }
    (text, diagnostics)
}
