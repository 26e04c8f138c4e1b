//! Phantom expansion: propagate links to sibling commits.
//!
//! The same developer often splits one fix across several nearby commits,
//! only one of which carries the ticket reference. A non-linked commit is
//! adopted by a linked commit's issue when the two share a developer, land
//! on nearby days, and touch overlapping files.

use ahash::{AHashMap, AHashSet};
use chrono::Duration;
use tracing::debug;

use crate::core::config::PhantomConfig;
use crate::core::errors::Result;
use crate::core::linkmap::IssueLinkMap;
use crate::core::pipeline::{FilterOutcome, LinkContext, LinkFilter};
use crate::core::types::{Commit, CommitHash};

/// Expands a link map with phantom sibling commits.
#[derive(Debug, Clone)]
pub struct PhantomExpander {
    config: PhantomConfig,
}

impl PhantomExpander {
    /// Build an expander from its envelope configuration.
    pub fn new(config: PhantomConfig) -> Self {
        Self { config }
    }

    /// Same developer identity on both commits.
    fn same_developer(&self, linked: &Commit, other: &Commit) -> bool {
        linked.name(self.config.name_field) == other.name(self.config.name_field)
    }

    /// Day-granularity check: the linked commit's day lies within
    /// `[other_day - before, other_day + after]`.
    fn within_days(&self, linked: &Commit, other: &Commit) -> bool {
        let linked_day = linked.commit_date.date_naive();
        let other_day = other.commit_date.date_naive();
        linked_day >= other_day - Duration::days(self.config.before_days)
            && linked_day <= other_day + Duration::days(self.config.after_days)
    }

    /// File-overlap check with the linked commit's file set as denominator.
    /// A linked commit with no files adopts nothing.
    fn shares_files(&self, linked: &Commit, other: &Commit) -> bool {
        if linked.files.is_empty() {
            return false;
        }
        let linked_set: AHashSet<&str> = linked.files.iter().map(String::as_str).collect();
        let other_set: AHashSet<&str> = other.files.iter().map(String::as_str).collect();
        let shared = linked_set.intersection(&other_set).count();
        shared as f64 / linked_set.len() as f64 >= self.config.duplicate_rate
    }

    /// For every linked commit, collect every non-linked commit surviving
    /// all three conditions.
    fn partners(
        &self,
        context: &LinkContext<'_>,
        input: &IssueLinkMap,
    ) -> Result<AHashMap<CommitHash, AHashSet<CommitHash>>> {
        let linked_hashes = input.all_commits();
        let mut partners: AHashMap<CommitHash, AHashSet<CommitHash>> = AHashMap::new();
        for linked_hash in &linked_hashes {
            let linked = context.commit(linked_hash)?;
            for (other_hash, other) in context.commits() {
                if linked_hashes.contains(other_hash.as_str()) {
                    continue;
                }
                if self.same_developer(linked, other)
                    && self.within_days(linked, other)
                    && self.shares_files(linked, other)
                {
                    partners
                        .entry(linked_hash.clone())
                        .or_default()
                        .insert(other_hash.clone());
                }
            }
        }
        Ok(partners)
    }

    /// Expand a link map: every issue entry gains all phantom partners of
    /// its linked commits.
    pub fn expand(
        &self,
        context: &LinkContext<'_>,
        input: &IssueLinkMap,
    ) -> Result<IssueLinkMap> {
        let partners = self.partners(context, input)?;

        let mut expanded = input.clone();
        for (issue_id, commits) in input.iter() {
            for hash in commits {
                if let Some(adopted) = partners.get(hash.as_str()) {
                    for phantom in adopted {
                        expanded.insert(issue_id.clone(), phantom.clone());
                    }
                }
            }
        }

        debug!(
            before = input.pair_count(),
            after = expanded.pair_count(),
            "phantom expansion"
        );
        Ok(expanded)
    }
}

impl LinkFilter for PhantomExpander {
    fn name(&self) -> &'static str {
        "phantom"
    }

    fn apply(&self, context: &LinkContext<'_>, input: &IssueLinkMap) -> Result<FilterOutcome> {
        Ok(FilterOutcome {
            retained: self.expand(context, input)?,
            removed: IssueLinkMap::new(),
        })
    }
}
