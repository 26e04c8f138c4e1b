//! Loner reduction: unambiguous single-candidate issues.
//!
//! After other evidence has been stripped out of the working sets, an
//! issue left with exactly one candidate commit has nothing to
//! disambiguate and is accepted as a high-confidence link. The working-set
//! bookkeeping lets each stage shrink the problem the next stage sees.

use ahash::AHashSet;
use tracing::debug;

use crate::core::config::TimeFilterConfig;
use crate::core::errors::Result;
use crate::core::linkmap::IssueLinkMap;
use crate::core::pipeline::{FilterOutcome, LinkContext, LinkFilter};
use crate::core::types::{CommitHash, IssueId};
use crate::filters::time::TimeFilter;

/// The shrinking (issues, commits) problem a filter chain operates on.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    /// Issue ids still unexplained
    pub issues: Vec<IssueId>,
    /// Commit hashes still unclaimed
    pub hashes: Vec<CommitHash>,
}

impl WorkingSet {
    /// Build a working set from the full studied lists.
    pub fn new(issues: Vec<IssueId>, hashes: Vec<CommitHash>) -> Self {
        Self { issues, hashes }
    }

    /// Drop every entity a previous filter already claimed. Order of the
    /// survivors is preserved.
    pub fn remove_matched(&mut self, claimed: &IssueLinkMap) {
        let claimed_issues: AHashSet<&str> = claimed.issues().map(String::as_str).collect();
        let claimed_hashes = claimed.all_commits();
        self.issues.retain(|id| !claimed_issues.contains(id.as_str()));
        self.hashes.retain(|hash| !claimed_hashes.contains(hash.as_str()));
    }

    /// Keep only the entities a filter just matched.
    pub fn retain_matched(&mut self, matched: &IssueLinkMap) {
        let matched_issues: AHashSet<&str> = matched.issues().map(String::as_str).collect();
        let matched_hashes = matched.all_commits();
        self.issues.retain(|id| matched_issues.contains(id.as_str()));
        self.hashes.retain(|hash| matched_hashes.contains(hash.as_str()));
    }
}

/// Isolates singleton candidates among commits not already keyword-linked.
#[derive(Debug, Clone)]
pub struct LonerReducer {
    time_filter: TimeFilter,
}

impl LonerReducer {
    /// Build a reducer around the narrow time window it confirms with.
    pub fn new(config: TimeFilterConfig) -> Self {
        Self {
            time_filter: TimeFilter::new(config),
        }
    }

    /// Run the reduction: exclude keyword-claimed entities, time-match the
    /// remaining working set, and keep the unambiguous singletons.
    pub fn reduce(
        &self,
        context: &LinkContext<'_>,
        keyword_links: &IssueLinkMap,
    ) -> Result<IssueLinkMap> {
        let mut working = WorkingSet::new(
            context.issues().map(|(id, _)| id.clone()).collect(),
            context.commits().map(|(hash, _)| hash.clone()).collect(),
        );
        working.remove_matched(keyword_links);

        let issues = working
            .issues
            .iter()
            .map(|id| context.issue(id))
            .collect::<Result<Vec<_>>>()?;
        let commits = working
            .hashes
            .iter()
            .map(|hash| context.commit(hash).cloned())
            .collect::<Result<Vec<_>>>()?;

        let matched = self.time_filter.link_all(issues.into_iter(), &commits);
        working.retain_matched(&matched);

        let singletons = matched.singletons();
        debug!(
            matched = matched.pair_count(),
            singletons = singletons.pair_count(),
            "loner reduction"
        );
        Ok(singletons)
    }
}

impl LinkFilter for LonerReducer {
    fn name(&self) -> &'static str {
        "loner"
    }

    fn apply(&self, _context: &LinkContext<'_>, input: &IssueLinkMap) -> Result<FilterOutcome> {
        let retained = input.singletons();
        let mut removed = IssueLinkMap::new();
        for (issue_id, commits) in input.iter() {
            if commits.len() != 1 {
                for hash in commits {
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
    use crate::core::types::{parse_datetime, Commit, Issue};
    use indexmap::IndexMap;

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
    fn test_working_set_shrinking() {
        let mut working = WorkingSet::new(
            vec!["T-1".into(), "T-2".into(), "T-3".into()],
            vec!["c1".into(), "c2".into(), "c3".into()],
        );
        let mut claimed = IssueLinkMap::new();
        claimed.insert("T-1", "c2");
        working.remove_matched(&claimed);
        assert_eq!(working.issues, vec!["T-2".to_string(), "T-3".to_string()]);
        assert_eq!(working.hashes, vec!["c1".to_string(), "c3".to_string()]);

        let mut matched = IssueLinkMap::new();
        matched.insert("T-3", "c3");
        working.retain_matched(&matched);
        assert_eq!(working.issues, vec!["T-3".to_string()]);
        assert_eq!(working.hashes, vec!["c3".to_string()]);
    }

    #[test]
    fn test_reduce_keeps_only_singletons() {
        let issues: IndexMap<String, Issue> = [
            // Two commits inside T-1's window: ambiguous, dropped.
            issue("T-1", "2009-05-01T10:05:00+00:00"),
            // Exactly one commit inside T-2's window: kept.
            issue("T-2", "2009-06-01T09:01:00+00:00"),
        ]
        .into_iter()
        .map(|i| (i.id.clone(), i))
        .collect();
        let commits: IndexMap<String, Commit> = [
            commit("c1", "2009-05-01T10:00:00+00:00"),
            commit("c2", "2009-05-01T10:04:00+00:00"),
            commit("c3", "2009-06-01T09:00:00+00:00"),
        ]
        .into_iter()
        .map(|c| (c.hash.clone(), c))
        .collect();
        let context = LinkContext::new(&issues, &commits);

        let reducer = LonerReducer::new(TimeFilterConfig::default());
        let result = reducer.reduce(&context, &IssueLinkMap::new()).unwrap();
        assert_eq!(result.pair_count(), 1);
        assert!(result.contains("T-2", "c3"));
    }

    #[test]
    fn test_keyword_claimed_entities_are_excluded() {
        let issues: IndexMap<String, Issue> = [issue("T-1", "2009-05-01T10:05:00+00:00")]
            .into_iter()
            .map(|i| (i.id.clone(), i))
            .collect();
        let commits: IndexMap<String, Commit> = [commit("c1", "2009-05-01T10:00:00+00:00")]
            .into_iter()
            .map(|c| (c.hash.clone(), c))
            .collect();
        let context = LinkContext::new(&issues, &commits);

        let mut keyword = IssueLinkMap::new();
        keyword.insert("T-1", "c1");
        let reducer = LonerReducer::new(TimeFilterConfig::default());
        assert!(reducer.reduce(&context, &keyword).unwrap().is_empty());
    }

    #[test]
    fn test_singleton_extraction_is_idempotent() {
        let mut map = IssueLinkMap::new();
        map.insert("T-1", "c1");
        map.insert("T-2", "c2");
        map.insert("T-2", "c3");

        let once = map.singletons();
        let twice = once.singletons();
        assert_eq!(once, twice);
        assert_eq!(once.pair_count(), 1);
    }
}
