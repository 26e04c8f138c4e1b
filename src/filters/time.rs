//! Narrow time-window confirmation.
//!
//! Unlike candidate generation, this filter compares exactly one issue
//! date field against one commit date field. The default window keeps an
//! issue resolved between the commit time and ten minutes after it, which
//! matches the "close the ticket right after pushing the fix" workflow.

use chrono::Duration;

use crate::core::config::TimeFilterConfig;
use crate::core::errors::Result;
use crate::core::linkmap::IssueLinkMap;
use crate::core::pipeline::{FilterOutcome, LinkContext, LinkFilter};
use crate::core::types::{Commit, Issue};

/// Confirms pairs whose single-field dates are close.
#[derive(Debug, Clone)]
pub struct TimeFilter {
    config: TimeFilterConfig,
}

impl TimeFilter {
    /// Build a filter from its window configuration.
    pub fn new(config: TimeFilterConfig) -> Self {
        Self { config }
    }

    /// True when the issue date lies in
    /// `[commit_date - before, commit_date + after]`.
    pub fn in_window(&self, issue: &Issue, commit: &Commit) -> bool {
        let issue_date = issue.date(self.config.issue_date_field);
        let commit_date = commit.date(self.config.commit_date_field);
        issue_date >= commit_date - Duration::seconds(self.config.before_secs)
            && issue_date <= commit_date + Duration::seconds(self.config.after_secs)
    }

    /// Scan the full cross product of a working set and link every pair
    /// inside the window.
    pub fn link_all<'a>(
        &self,
        issues: impl IntoIterator<Item = &'a Issue>,
        commits: &[Commit],
    ) -> IssueLinkMap {
        let mut map = IssueLinkMap::new();
        for issue in issues {
            for commit in commits {
                if self.in_window(issue, commit) {
                    map.insert(issue.id.clone(), commit.hash.clone());
                }
            }
        }
        map
    }
}

impl LinkFilter for TimeFilter {
    fn name(&self) -> &'static str {
        "time"
    }

    fn apply(&self, context: &LinkContext<'_>, input: &IssueLinkMap) -> Result<FilterOutcome> {
        let mut retained = IssueLinkMap::new();
        let mut removed = IssueLinkMap::new();
        for (issue_id, commits) in input.iter() {
            let issue = context.issue(issue_id)?;
            for hash in commits {
                let commit = context.commit(hash)?;
                if self.in_window(issue, commit) {
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
    use crate::core::types::parse_datetime;

    fn issue(id: &str, resolved: &str) -> Issue {
        let date = parse_datetime(resolved).unwrap();
        Issue {
            id: id.into(),
            description: None,
            comments: None,
            created: date,
            updated: date,
            resolved: date,
            patch_paths: vec![],
        }
    }

    fn commit(hash: &str, committed: &str) -> Commit {
        let date = parse_datetime(committed).unwrap();
        Commit {
            hash: hash.into(),
            author: "alice".into(),
            committer: "alice".into(),
            author_date: date,
            commit_date: date,
            message: String::new(),
            files: vec![],
        }
    }

    #[test]
    fn test_resolved_shortly_after_commit_is_linked() {
        let filter = TimeFilter::new(TimeFilterConfig::default());
        let i = issue("T-1", "2009-05-01T10:09:00+00:00");
        let c = commit("c1", "2009-05-01T10:00:00+00:00");
        assert!(filter.in_window(&i, &c));
    }

    #[test]
    fn test_default_window_is_one_sided() {
        let filter = TimeFilter::new(TimeFilterConfig::default());
        let c = commit("c1", "2009-05-01T10:00:00+00:00");
        // Resolved one second before the commit: outside (before = 0).
        assert!(!filter.in_window(&issue("T-1", "2009-05-01T09:59:59+00:00"), &c));
        // Resolved eleven minutes after: outside (after = 600s).
        assert!(!filter.in_window(&issue("T-1", "2009-05-01T10:11:00+00:00"), &c));
    }

    #[test]
    fn test_link_all_cross_product() {
        let filter = TimeFilter::new(TimeFilterConfig::default());
        let issues = vec![
            issue("T-1", "2009-05-01T10:05:00+00:00"),
            issue("T-2", "2009-06-01T00:00:00+00:00"),
        ];
        let commits = vec![
            commit("c1", "2009-05-01T10:00:00+00:00"),
            commit("c2", "2009-05-01T10:04:00+00:00"),
        ];
        let map = filter.link_all(&issues, &commits);
        assert!(map.contains("T-1", "c1"));
        assert!(map.contains("T-1", "c2"));
        assert!(map.commits_for("T-2").is_none());
    }
}
