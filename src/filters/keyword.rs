//! Keyword extraction: issue ids appearing verbatim in commit messages.
//!
//! This is the only directly observed link evidence and the only signal
//! treated as ground truth for training. Everything else in the pipeline
//! is heuristic confirmation layered on top of this map.

use ahash::AHashSet;
use regex::Regex;

use crate::core::errors::{Result, TracelinkError};
use crate::core::linkmap::IssueLinkMap;
use crate::core::types::{Commit, IssueId};

/// Token substituted for matched issue ids when masking messages.
///
/// Masked messages feed the similarity engine so the textual signal stays
/// independent of the keyword signal.
pub const MASK_TOKEN: &str = "ISSUE_ID";

/// Extracts issue ids from commit messages.
#[derive(Debug, Clone)]
pub struct KeywordLinker {
    pattern: Regex,
    studied: AHashSet<IssueId>,
}

impl KeywordLinker {
    /// Build a linker for one project prefix and the studied issue set.
    ///
    /// The pattern is `{prefix}-[0-9]+`; matches outside the studied set
    /// are ignored, since foreign-project ids routinely appear in merged
    /// upstream messages.
    pub fn new(
        issue_prefix: &str,
        studied: impl IntoIterator<Item = IssueId>,
    ) -> Result<Self> {
        let pattern = Regex::new(&format!("{}-[0-9]+", regex::escape(issue_prefix)))
            .map_err(|e| {
                TracelinkError::config_field(
                    format!("invalid issue-id pattern: {e}"),
                    "project.issue_prefix",
                )
            })?;
        Ok(Self {
            pattern,
            studied: studied.into_iter().collect(),
        })
    }

    /// Issue ids referenced by one message, restricted to the studied set.
    pub fn matches<'a>(&'a self, message: &'a str) -> impl Iterator<Item = &'a str> {
        self.pattern
            .find_iter(message)
            .map(|m| m.as_str())
            .filter(|id| self.studied.contains(*id))
    }

    /// Scan all commit messages and build the observed link map.
    pub fn link(&self, commits: &[Commit]) -> IssueLinkMap {
        let mut map = IssueLinkMap::new();
        for commit in commits {
            for issue_id in self.matches(&commit.message) {
                map.insert(issue_id, commit.hash.clone());
            }
        }
        map
    }

    /// Replace every issue-id occurrence with [`MASK_TOKEN`].
    ///
    /// Masking is applied to ALL pattern matches, studied or not, so a
    /// message never leaks any ticket reference into similarity scoring.
    pub fn mask(&self, message: &str) -> String {
        self.pattern.replace_all(message, MASK_TOKEN).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn commit(hash: &str, message: &str) -> Commit {
        Commit {
            hash: hash.into(),
            author: "alice".into(),
            committer: "alice".into(),
            author_date: Utc::now(),
            commit_date: Utc::now(),
            message: message.into(),
            files: vec![],
        }
    }

    fn linker() -> KeywordLinker {
        KeywordLinker::new(
            "HADOOP",
            ["HADOOP-5213".to_string(), "HADOOP-4840".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn test_links_studied_ids_only() {
        let commits = vec![
            commit("c1", "HADOOP-5213. Fix namenode restart."),
            commit("c2", "HADOOP-9999. Not a studied issue."),
            commit("c3", "Cleanup, no ticket reference."),
        ];
        let map = linker().link(&commits);
        assert!(map.contains("HADOOP-5213", "c1"));
        assert!(!map.contains("HADOOP-9999", "c2"));
        assert_eq!(map.pair_count(), 1);
    }

    #[test]
    fn test_multiple_ids_in_one_message() {
        let commits = vec![commit("c1", "HADOOP-5213 and HADOOP-4840 together")];
        let map = linker().link(&commits);
        assert!(map.contains("HADOOP-5213", "c1"));
        assert!(map.contains("HADOOP-4840", "c1"));
    }

    #[test]
    fn test_mask_hides_every_reference() {
        let masked = linker().mask("HADOOP-5213 fixes a bug like HADOOP-9999 did");
        assert_eq!(masked, "ISSUE_ID fixes a bug like ISSUE_ID did");
    }

    #[test]
    fn test_prefix_is_escaped() {
        let linker = KeywordLinker::new("A+B", ["A+B-1".to_string()]).unwrap();
        let map = linker.link(&[commit("c1", "see A+B-1")]);
        assert!(map.contains("A+B-1", "c1"));
    }
}
