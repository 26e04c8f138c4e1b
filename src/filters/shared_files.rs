//! File-overlap confirmation between issue patches and commits.
//!
//! The ratio is asymmetric on purpose: an issue's attached patch should be
//! covered by the commit that resolves it, not the reverse. A large
//! housekeeping commit touching the patch's files still counts.

use ahash::AHashSet;

use crate::core::config::SharedFileConfig;
use crate::core::errors::Result;
use crate::core::linkmap::IssueLinkMap;
use crate::core::pipeline::{FilterOutcome, LinkContext, LinkFilter};

/// Confirms pairs whose file sets overlap strongly.
#[derive(Debug, Clone)]
pub struct SharedFileFilter {
    config: SharedFileConfig,
}

impl SharedFileFilter {
    /// Build a filter from its threshold configuration.
    pub fn new(config: SharedFileConfig) -> Self {
        Self { config }
    }

    /// `|issue_files ∩ commit_files| / |issue_files|`, or `None` when the
    /// issue has no files (score undefined, pair always filtered out).
    pub fn score(issue_files: &[String], commit_files: &[String]) -> Option<f64> {
        if issue_files.is_empty() {
            return None;
        }
        let issue_set: AHashSet<&str> = issue_files.iter().map(String::as_str).collect();
        let commit_set: AHashSet<&str> = commit_files.iter().map(String::as_str).collect();
        let shared = issue_set.intersection(&commit_set).count();
        Some(shared as f64 / issue_set.len() as f64)
    }

    /// True when the overlap score is defined and meets the threshold.
    pub fn confirms(&self, issue_files: &[String], commit_files: &[String]) -> bool {
        Self::score(issue_files, commit_files)
            .is_some_and(|score| score >= self.config.duplicate_rate)
    }
}

impl LinkFilter for SharedFileFilter {
    fn name(&self) -> &'static str {
        "shared_files"
    }

    fn apply(&self, context: &LinkContext<'_>, input: &IssueLinkMap) -> Result<FilterOutcome> {
        let mut retained = IssueLinkMap::new();
        let mut removed = IssueLinkMap::new();
        for (issue_id, commits) in input.iter() {
            let issue = context.issue(issue_id)?;
            for hash in commits {
                let commit = context.commit(hash)?;
                if self.confirms(&issue.patch_paths, &commit.files) {
                    retained.insert(issue_id.clone(), hash.clone());
                } else {
                    removed.insert(issue_id.clone(), hash.clone());
                }
            }
        }
        Ok(FilterOutcome { retained, removed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn paths(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_score_is_issue_sided() {
        let issue = paths(&["a.java", "b.java"]);
        let commit = paths(&["a.java", "b.java", "c.java", "d.java"]);
        // All of the issue's files are covered, extra commit files are free.
        assert_relative_eq!(
            SharedFileFilter::score(&issue, &commit).unwrap(),
            1.0,
            max_relative = 1e-12
        );
        // The reverse direction would have been 0.5.
        assert_relative_eq!(
            SharedFileFilter::score(&commit, &issue).unwrap(),
            0.5,
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_empty_issue_set_is_undefined_not_a_division() {
        assert!(SharedFileFilter::score(&[], &paths(&["a.java"])).is_none());
        let filter = SharedFileFilter::new(SharedFileConfig::default());
        assert!(!filter.confirms(&[], &paths(&["a.java"])));
    }

    #[test]
    fn test_default_threshold() {
        let filter = SharedFileFilter::new(SharedFileConfig::default());
        let issue = paths(&["a.java", "b.java", "c.java"]);
        // 2/3 ≈ 0.667 clears the 0.66 default; 1/3 does not.
        assert!(filter.confirms(&issue, &paths(&["a.java", "b.java"])));
        assert!(!filter.confirms(&issue, &paths(&["a.java"])));
    }

    #[test]
    fn test_duplicate_paths_do_not_inflate_score() {
        let issue = paths(&["a.java", "a.java", "b.java"]);
        let commit = paths(&["a.java"]);
        assert_relative_eq!(
            SharedFileFilter::score(&issue, &commit).unwrap(),
            0.5,
            max_relative = 1e-12
        );
    }
}
