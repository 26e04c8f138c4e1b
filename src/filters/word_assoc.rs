//! Word-to-file association scoring.
//!
//! Learns, from the keyword-linked subset only, which issue vocabulary
//! tends to co-occur with which repository files, then generalizes that
//! association to the full candidate universe. This is the one heuristic
//! that can confirm a pair with zero direct text overlap.

use ahash::{AHashMap, AHashSet};
use tracing::debug;

use crate::core::config::WordAssocConfig;
use crate::core::errors::Result;
use crate::core::linkmap::IssueLinkMap;
use crate::core::pipeline::{FilterOutcome, LinkContext, LinkFilter};
use crate::core::types::{Commit, IssueId};
use crate::text::normalize::TextNormalizer;

/// Pointwise association between one file and one word.
///
/// `n_we / (1 + min(n_w, n_e))`: the co-occurrence count dampened by how
/// common the word and the file are on their own.
pub fn mu_ew(n_we: usize, n_w: usize, n_e: usize) -> f64 {
    n_we as f64 / (1 + n_w.min(n_e)) as f64
}

/// Fitted word-to-file association model.
#[derive(Debug)]
pub struct WordAssociationModel {
    threshold: f64,
    extensions: Vec<String>,
    issue_words: AHashMap<IssueId, AHashSet<String>>,
    // file path -> word -> mu_ew
    associations: AHashMap<String, AHashMap<String, f64>>,
}

impl WordAssociationModel {
    /// Train the model on the keyword-linked subset of the context.
    ///
    /// Word statistics come from every studied issue; co-occurrence counts
    /// come only from linked (issue, commit) pairs. File totals are counted
    /// over all studied commits.
    pub fn fit(
        config: &WordAssocConfig,
        context: &LinkContext<'_>,
        keyword_links: &IssueLinkMap,
        normalizer: &TextNormalizer,
    ) -> Result<Self> {
        let extensions = config.extensions.clone();

        let mut issue_words: AHashMap<IssueId, AHashSet<String>> = AHashMap::new();
        let mut word_issue_ids: AHashMap<String, AHashSet<IssueId>> = AHashMap::new();
        for (issue_id, issue) in context.issues() {
            let words = normalizer.token_set(&issue.full_text());
            for word in &words {
                word_issue_ids
                    .entry(word.clone())
                    .or_default()
                    .insert(issue_id.clone());
            }
            issue_words.insert(issue_id.clone(), words);
        }

        // n_e: how many studied commits touch each eligible file.
        let mut n_e: AHashMap<&str, usize> = AHashMap::new();
        for (_, commit) in context.commits() {
            for file in eligible_files(commit, &extensions) {
                *n_e.entry(file).or_insert(0) += 1;
            }
        }

        // n_we: linked-pair co-occurrence counts per (word, file).
        let mut n_we: AHashMap<&str, AHashMap<&str, usize>> = AHashMap::new();
        for (word, issue_ids) in &word_issue_ids {
            for issue_id in issue_ids {
                let Some(linked) = keyword_links.commits_for(issue_id) else {
                    continue;
                };
                for hash in linked {
                    let commit = context.commit(hash)?;
                    for file in eligible_files(commit, &extensions) {
                        *n_we
                            .entry(word.as_str())
                            .or_default()
                            .entry(file)
                            .or_insert(0) += 1;
                    }
                }
            }
        }

        let mut associations: AHashMap<String, AHashMap<String, f64>> = AHashMap::new();
        for (word, per_file) in &n_we {
            let n_w = word_issue_ids[*word].len();
            for (file, &count) in per_file {
                let score = mu_ew(count, n_w, n_e[file]);
                associations
                    .entry((*file).to_string())
                    .or_default()
                    .insert((*word).to_string(), score);
            }
        }

        debug!(
            files = associations.len(),
            vocabulary = word_issue_ids.len(),
            "fitted word-association model"
        );

        Ok(Self {
            threshold: config.threshold,
            extensions,
            issue_words,
            associations,
        })
    }

    /// Best association between one file and an issue's vocabulary
    /// (`mu_eB`), floored at zero.
    fn mu_eb(&self, file: &str, words: &AHashSet<String>) -> f64 {
        let Some(per_word) = self.associations.get(file) else {
            return 0.0;
        };
        words
            .iter()
            .filter_map(|word| per_word.get(word).copied())
            .fold(0.0, f64::max)
    }

    /// Best association between a commit's files and an issue (`mu_CB`).
    ///
    /// Unknown issues score zero: an issue with no recorded vocabulary has
    /// nothing to associate.
    pub fn score(&self, issue_id: &str, commit: &Commit) -> f64 {
        let Some(words) = self.issue_words.get(issue_id) else {
            return 0.0;
        };
        eligible_files(commit, &self.extensions)
            .map(|file| self.mu_eb(file, words))
            .fold(0.0, f64::max)
    }
}

impl LinkFilter for WordAssociationModel {
    fn name(&self) -> &'static str {
        "word_assoc"
    }

    fn apply(&self, context: &LinkContext<'_>, input: &IssueLinkMap) -> Result<FilterOutcome> {
        let mut retained = IssueLinkMap::new();
        let mut removed = IssueLinkMap::new();
        for (issue_id, commits) in input.iter() {
            for hash in commits {
                let commit = context.commit(hash)?;
                if self.score(issue_id, commit) >= self.threshold {
                    retained.insert(issue_id.clone(), hash.clone());
                } else {
                    removed.insert(issue_id.clone(), hash.clone());
                }
            }
        }
        Ok(FilterOutcome { retained, removed })
    }
}

fn eligible_files<'a>(
    commit: &'a Commit,
    extensions: &'a [String],
) -> impl Iterator<Item = &'a str> {
    commit.files.iter().map(String::as_str).filter(move |file| {
        extensions.is_empty() || extensions.iter().any(|ext| file.ends_with(ext.as_str()))
    })
}
