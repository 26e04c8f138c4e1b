//! The canonical issue-to-commits map used at every filter boundary.
//!
//! Every heuristic filter consumes and produces an [`IssueLinkMap`]; the
//! heterogeneous list/set/map shapes of ad hoc accumulation are converted
//! at the edges. Iteration order is insertion order so runs are
//! reproducible.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::core::types::{CommitHash, IssueId};

/// Issue id → set of commit hashes.
///
/// The final output of a run and the intermediate artifact at every filter
/// stage. Invariant: hashes in any stage's map are a subset of the hashes
/// visible to that stage's input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueLinkMap {
    entries: IndexMap<IssueId, IndexSet<CommitHash>>,
}

impl IssueLinkMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a link. Inserting the same pair twice is a no-op.
    pub fn insert(&mut self, issue: impl Into<IssueId>, commit: impl Into<CommitHash>) {
        self.entries
            .entry(issue.into())
            .or_default()
            .insert(commit.into());
    }

    /// True when the pair is present.
    pub fn contains(&self, issue: &str, commit: &str) -> bool {
        self.entries
            .get(issue)
            .is_some_and(|commits| commits.contains(commit))
    }

    /// Commits linked to one issue, if any.
    pub fn commits_for(&self, issue: &str) -> Option<&IndexSet<CommitHash>> {
        self.entries.get(issue)
    }

    /// Iterate over (issue, commits) entries.
    pub fn iter(&self) -> impl Iterator<Item = (&IssueId, &IndexSet<CommitHash>)> {
        self.entries.iter()
    }

    /// All issue ids present in the map.
    pub fn issues(&self) -> impl Iterator<Item = &IssueId> {
        self.entries.keys()
    }

    /// Union of all linked commit hashes.
    pub fn all_commits(&self) -> IndexSet<CommitHash> {
        self.entries.values().flatten().cloned().collect()
    }

    /// Number of issues with at least one link.
    pub fn issue_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of (issue, commit) pairs.
    pub fn pair_count(&self) -> usize {
        self.entries.values().map(IndexSet::len).sum()
    }

    /// True when no links are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge another map into this one (set union per issue).
    pub fn merge(&mut self, other: &IssueLinkMap) {
        for (issue, commits) in other.iter() {
            for commit in commits {
                self.insert(issue.clone(), commit.clone());
            }
        }
    }

    /// Entries with exactly one linked commit.
    pub fn singletons(&self) -> IssueLinkMap {
        let mut result = IssueLinkMap::new();
        for (issue, commits) in self.iter() {
            if commits.len() == 1 {
                result.insert(issue.clone(), commits[0].clone());
            }
        }
        result
    }

    /// Strip one commit hash from every issue entry. Entries may be left
    /// empty; callers follow up with [`prune_empty`](Self::prune_empty).
    pub fn remove_commit(&mut self, hash: &str) {
        for commits in self.entries.values_mut() {
            commits.shift_remove(hash);
        }
    }

    /// Drop issues whose commit set became empty after hash removal
    /// (`insert` never creates empty sets itself).
    pub fn prune_empty(&mut self) {
        self.entries.retain(|_, commits| !commits.is_empty());
    }
}

impl FromIterator<(IssueId, CommitHash)> for IssueLinkMap {
    fn from_iter<T: IntoIterator<Item = (IssueId, CommitHash)>>(iter: T) -> Self {
        let mut map = IssueLinkMap::new();
        for (issue, commit) in iter {
            map.insert(issue, commit);
        }
        map
    }
}
