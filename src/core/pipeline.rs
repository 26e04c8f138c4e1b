//! Pipeline orchestration: contexts, the filter seam, and the end-to-end run.
//!
//! A [`LinkContext`] gives every stage keyed access to the studied records.
//! Heuristic stages plug into the [`LinkFilter`] seam and can be chained by
//! a [`FilterPipeline`]; the [`LinkPipeline`] wires the full run together:
//! keyword labels, optional blinding, feature extraction and the corrected
//! classifier.

use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::core::candidates::CandidateGenerator;
use crate::core::config::{ModelKind, TracelinkConfig};
use crate::core::errors::{Result, TracelinkError};
use crate::core::featureset::FeatureExtractor;
use crate::core::linkmap::IssueLinkMap;
use crate::core::types::{Commit, CommitHash, Issue, IssueId, PairKey};
use crate::filters::keyword::KeywordLinker;
use crate::filters::loner::LonerReducer;
use crate::filters::phantom::PhantomExpander;
use crate::filters::shared_files::SharedFileFilter;
use crate::filters::time::TimeFilter;
use crate::filters::word_assoc::WordAssociationModel;
use crate::io::diff::{nsd_text, DiffDiagnostics};
use crate::io::sources::{CommentSource, DiffSource};
use crate::learning::blinding::blind;
use crate::learning::classifier::GridSearchCv;
use crate::learning::pu::PuClassifier;
use crate::learning::supervised::SupervisedModel;
use crate::text::normalize::TextNormalizer;
use crate::text::tfidf::TfIdfVectorizer;

/// Read-only keyed view over one run's studied records.
#[derive(Debug, Clone, Copy)]
pub struct LinkContext<'a> {
    issues: &'a IndexMap<IssueId, Issue>,
    commits: &'a IndexMap<CommitHash, Commit>,
}

impl<'a> LinkContext<'a> {
    /// Wrap the studied record maps.
    pub fn new(
        issues: &'a IndexMap<IssueId, Issue>,
        commits: &'a IndexMap<CommitHash, Commit>,
    ) -> Self {
        Self { issues, commits }
    }

    /// Look up one issue; a dangling id in a link map is a data error.
    pub fn issue(&self, id: &str) -> Result<&'a Issue> {
        self.issues
            .get(id)
            .ok_or_else(|| TracelinkError::missing_issue(id))
    }

    /// Look up one commit; a dangling hash in a link map is a data error.
    pub fn commit(&self, hash: &str) -> Result<&'a Commit> {
        self.commits
            .get(hash)
            .ok_or_else(|| TracelinkError::missing_commit(hash))
    }

    /// Iterate over (id, issue) entries in insertion order.
    pub fn issues(&self) -> impl Iterator<Item = (&'a IssueId, &'a Issue)> + 'a {
        self.issues.iter()
    }

    /// Iterate over (hash, commit) entries in insertion order.
    pub fn commits(&self) -> impl Iterator<Item = (&'a CommitHash, &'a Commit)> + 'a {
        self.commits.iter()
    }

    /// Number of studied issues.
    pub fn issue_count(&self) -> usize {
        self.issues.len()
    }

    /// Number of studied commits.
    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }
}

/// What one filter stage kept and what it dropped.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    /// Pairs surviving the stage
    pub retained: IssueLinkMap,
    /// Pairs the stage rejected
    pub removed: IssueLinkMap,
}

/// The seam every heuristic stage plugs into.
pub trait LinkFilter {
    /// Short stable stage name, used in logs and reports.
    fn name(&self) -> &'static str;

    /// Partition the input map into retained and removed pairs. A stage may
    /// also grow the retained map (phantom expansion does).
    fn apply(&self, context: &LinkContext<'_>, input: &IssueLinkMap) -> Result<FilterOutcome>;
}

/// Per-stage pair counts for one chain run.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// Stage name
    pub stage: &'static str,
    /// Pairs retained after the stage
    pub retained: usize,
    /// Pairs the stage removed
    pub removed: usize,
}

/// An ordered chain of filters, each consuming the previous stage's
/// retained map.
#[derive(Default)]
pub struct FilterPipeline {
    filters: Vec<Box<dyn LinkFilter>>,
}

impl FilterPipeline {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage to the chain.
    pub fn push(&mut self, filter: Box<dyn LinkFilter>) {
        self.filters.push(filter);
    }

    /// Run the chain over a seed map.
    pub fn run(
        &self,
        context: &LinkContext<'_>,
        seed: IssueLinkMap,
    ) -> Result<(IssueLinkMap, Vec<StageReport>)> {
        let mut current = seed;
        let mut reports = Vec::with_capacity(self.filters.len());
        for filter in &self.filters {
            let outcome = filter.apply(context, &current)?;
            debug!(
                stage = filter.name(),
                retained = outcome.retained.pair_count(),
                removed = outcome.removed.pair_count(),
                "filter stage"
            );
            reports.push(StageReport {
                stage: filter.name(),
                retained: outcome.retained.pair_count(),
                removed: outcome.removed.pair_count(),
            });
            current = outcome.retained;
        }
        Ok((current, reports))
    }
}

/// The studied records for one run.
#[derive(Debug, Clone, Default)]
pub struct LinkInputs {
    /// Studied issues
    pub issues: Vec<Issue>,
    /// Studied commits
    pub commits: Vec<Commit>,
}

/// Score record for one candidate pair, in feature-row order.
///
/// For the PU model the probability is the corrected estimate `g(x) / c`
/// and may exceed one when `g(x)` lands above the labeling frequency.
#[derive(Debug, Clone, Serialize)]
pub struct PairScore {
    /// The scored pair
    pub pair: PairKey,
    /// Observed label fed to training (1 = keyword-linked)
    pub label: u8,
    /// Positive-class probability estimate
    pub probability: f64,
    /// Final decision for the pair
    pub accepted: bool,
}

/// Everything a finished run produced.
#[derive(Debug, Clone, Default)]
pub struct LinkOutcome {
    /// Recovered link map, keyword links included
    pub links: IssueLinkMap,
    /// Per-candidate score table
    pub scores: Vec<PairScore>,
    /// Fitted labeling-frequency estimate (PU model only)
    pub correction: Option<f64>,
    /// Diff anomalies encountered while extracting NSD text
    pub diagnostics: DiffDiagnostics,
}

/// End-to-end link recovery over one configuration.
pub struct LinkPipeline {
    config: TracelinkConfig,
    normalizer: TextNormalizer,
}

impl LinkPipeline {
    /// Validate the configuration and load the lexical resources.
    pub fn new(config: TracelinkConfig) -> Result<Self> {
        config.validate()?;
        let normalizer = TextNormalizer::from_config(&config.resources)?;
        Ok(Self { config, normalizer })
    }

    /// The validated configuration this pipeline runs with.
    pub fn config(&self) -> &TracelinkConfig {
        &self.config
    }

    /// Run the classification path: keyword labels, optional blinding,
    /// candidate features, and the configured decision model.
    ///
    /// The returned map is the union of the observed keyword links and
    /// every candidate pair the classifier accepted.
    pub fn run(&self, inputs: LinkInputs) -> Result<LinkOutcome> {
        if inputs.issues.is_empty() {
            return Err(TracelinkError::validation("no issues to study"));
        }
        if inputs.commits.is_empty() {
            return Err(TracelinkError::validation("no commits to study"));
        }

        let issues: IndexMap<IssueId, Issue> = inputs
            .issues
            .into_iter()
            .map(|issue| (issue.id.clone(), issue))
            .collect();
        let commits: IndexMap<CommitHash, Commit> = inputs
            .commits
            .into_iter()
            .map(|commit| (commit.hash.clone(), commit))
            .collect();
        let context = LinkContext::new(&issues, &commits);

        let linker = KeywordLinker::new(&self.config.project.issue_prefix, issues.keys().cloned())?;
        let mut keyword_links = IssueLinkMap::new();
        for (hash, commit) in context.commits() {
            for issue_id in linker.matches(&commit.message) {
                keyword_links.insert(issue_id, hash.clone());
            }
        }
        if let Some(rate) = self.config.learning.blind_rate {
            keyword_links = blind(&keyword_links, rate, self.config.learning.seed);
        }
        if keyword_links.is_empty() {
            return Err(TracelinkError::degenerate_training(
                "no commit message references a studied issue; there are no positive labels",
            ));
        }

        let extractor = FeatureExtractor::new(&self.config, &self.normalizer);
        let batch = extractor.extract(&context, &keyword_links, &linker)?;

        let search = self.grid_search();
        let (probabilities, decisions, correction) = match self.config.learning.model {
            ModelKind::Pu => {
                let mut model = PuClassifier::new(search);
                model.fit(batch.matrix.view(), &batch.labels)?;
                let probabilities = model.predict_prob(batch.matrix.view())?;
                let decisions = model.predict(batch.matrix.view())?;
                (probabilities, decisions, Some(model.correction()))
            }
            ModelKind::Supervised => {
                let mut model = SupervisedModel::new(search);
                model.fit(batch.matrix.view(), &batch.labels)?;
                let probabilities = model.predict_prob(batch.matrix.view())?;
                let decisions = model.predict(batch.matrix.view())?;
                (probabilities, decisions, None)
            }
        };

        let mut links = keyword_links;
        let mut scores = Vec::with_capacity(batch.len());
        for (row, pair) in batch.names.iter().enumerate() {
            let accepted = decisions[row];
            if accepted {
                links.insert(pair.issue.clone(), pair.commit.clone());
            }
            scores.push(PairScore {
                pair: pair.clone(),
                label: batch.labels[row],
                probability: probabilities[row],
                accepted,
            });
        }

        info!(
            candidates = batch.len(),
            positives = batch.positive_count(),
            linked_issues = links.issue_count(),
            linked_pairs = links.pair_count(),
            "link recovery finished"
        );

        Ok(LinkOutcome {
            links,
            scores,
            correction,
            diagnostics: DiffDiagnostics::default(),
        })
    }

    /// Run the agreement path: the candidate universe narrowed by the
    /// time, shared-file and word-association stages, expanded by phantom
    /// siblings, then merged with the keyword map and the loner singletons.
    pub fn heuristic_links(
        &self,
        inputs: &LinkInputs,
    ) -> Result<(IssueLinkMap, Vec<StageReport>)> {
        let issues: IndexMap<IssueId, Issue> = inputs
            .issues
            .iter()
            .map(|issue| (issue.id.clone(), issue.clone()))
            .collect();
        let commits: IndexMap<CommitHash, Commit> = inputs
            .commits
            .iter()
            .map(|commit| (commit.hash.clone(), commit.clone()))
            .collect();
        let context = LinkContext::new(&issues, &commits);

        let linker = KeywordLinker::new(&self.config.project.issue_prefix, issues.keys().cloned())?;
        let keyword_links = linker.link(&inputs.commits);

        let generator = CandidateGenerator::new(self.config.candidates.clone());
        let mut seed = IssueLinkMap::new();
        for (issue_id, issue) in context.issues() {
            for (hash, commit) in context.commits() {
                if generator.is_candidate(issue, commit) {
                    seed.insert(issue_id.clone(), hash.clone());
                }
            }
        }

        let word_assoc = WordAssociationModel::fit(
            &self.config.word_assoc,
            &context,
            &keyword_links,
            &self.normalizer,
        )?;

        let mut chain = FilterPipeline::new();
        chain.push(Box::new(TimeFilter::new(self.config.time_filter.clone())));
        chain.push(Box::new(SharedFileFilter::new(self.config.shared_files.clone())));
        chain.push(Box::new(word_assoc));
        chain.push(Box::new(PhantomExpander::new(self.config.phantom.clone())));
        let (mut confirmed, mut reports) = chain.run(&context, seed)?;

        let reducer = LonerReducer::new(self.config.time_filter.clone());
        let loners = reducer.reduce(&context, &keyword_links)?;
        reports.push(StageReport {
            stage: "loner",
            retained: loners.pair_count(),
            removed: 0,
        });

        confirmed.merge(&keyword_links);
        confirmed.merge(&loners);
        Ok((confirmed, reports))
    }

    /// Link candidate pairs whose issue text and masked commit message are
    /// cosine-similar above the message threshold.
    pub fn similarity_links(&self, inputs: &LinkInputs) -> Result<IssueLinkMap> {
        let linker = KeywordLinker::new(
            &self.config.project.issue_prefix,
            inputs.issues.iter().map(|issue| issue.id.clone()),
        )?;
        let issue_texts: Vec<String> = inputs
            .issues
            .iter()
            .map(|issue| self.normalizer.normalize(&issue.full_text()))
            .collect();
        let message_texts: Vec<String> = inputs
            .commits
            .iter()
            .map(|commit| self.normalizer.normalize(&linker.mask(&commit.message)))
            .collect();

        self.threshold_links(
            inputs,
            &issue_texts,
            &message_texts,
            self.config.similarity.message_threshold,
        )
    }

    /// Link candidate pairs whose issue text is cosine-similar to the
    /// added-plus-context text of the commit's changed non-source documents.
    pub fn nsd_links(
        &self,
        inputs: &LinkInputs,
        diffs: &dyn DiffSource,
    ) -> Result<(IssueLinkMap, DiffDiagnostics)> {
        let mut diagnostics = DiffDiagnostics::default();
        let issue_texts: Vec<String> = inputs
            .issues
            .iter()
            .map(|issue| self.normalizer.normalize(&issue.full_text()))
            .collect();
        let mut document_texts = Vec::with_capacity(inputs.commits.len());
        for commit in &inputs.commits {
            let diff = diffs.diff_text(&commit.hash, self.config.similarity.context_lines)?;
            let (text, commit_diagnostics) = nsd_text(
                &commit.hash,
                &commit.files,
                &diff,
                &self.config.similarity.nsd_extensions,
            );
            diagnostics.merge(commit_diagnostics);
            document_texts.push(self.normalizer.normalize(&text));
        }

        let links = self.threshold_links(
            inputs,
            &issue_texts,
            &document_texts,
            self.config.similarity.nsd_threshold,
        )?;
        Ok((links, diagnostics))
    }

    /// Link candidate pairs whose issue text is cosine-similar to the
    /// doc-comment text of the commit's changed source files.
    pub fn comment_links(
        &self,
        inputs: &LinkInputs,
        comments: &dyn CommentSource,
    ) -> Result<IssueLinkMap> {
        let issue_texts: Vec<String> = inputs
            .issues
            .iter()
            .map(|issue| self.normalizer.normalize(&issue.full_text()))
            .collect();
        let mut comment_texts = Vec::with_capacity(inputs.commits.len());
        for commit in &inputs.commits {
            let text =
                comments.comment_text(&commit.hash, &self.config.project.source_extensions)?;
            comment_texts.push(self.normalizer.normalize(&text));
        }

        self.threshold_links(
            inputs,
            &issue_texts,
            &comment_texts,
            self.config.similarity.comment_threshold,
        )
    }

    /// Candidate-bounded cosine thresholding over pre-normalized texts.
    fn threshold_links(
        &self,
        inputs: &LinkInputs,
        issue_texts: &[String],
        commit_texts: &[String],
        threshold: f64,
    ) -> Result<IssueLinkMap> {
        let mut corpus: Vec<String> = issue_texts.to_vec();
        corpus.extend(commit_texts.iter().cloned());
        let vectorizer = TfIdfVectorizer::fit(&corpus)?;
        debug!(
            documents = corpus.len(),
            vocabulary = vectorizer.vocabulary_size(),
            "fitted similarity vectorizer"
        );

        let issue_vectors: Vec<_> = issue_texts
            .iter()
            .map(|text| vectorizer.transform(text))
            .collect();
        let commit_vectors: Vec<_> = commit_texts
            .iter()
            .map(|text| vectorizer.transform(text))
            .collect();

        let generator = CandidateGenerator::new(self.config.candidates.clone());
        let mut links = IssueLinkMap::new();
        for (i, issue) in inputs.issues.iter().enumerate() {
            for (j, commit) in inputs.commits.iter().enumerate() {
                if !generator.is_candidate(issue, commit) {
                    continue;
                }
                if issue_vectors[i].cosine(&commit_vectors[j]) >= threshold {
                    links.insert(issue.id.clone(), commit.hash.clone());
                }
            }
        }
        Ok(links)
    }

    fn grid_search(&self) -> GridSearchCv {
        GridSearchCv {
            alphas: self.config.learning.alpha_grid.clone(),
            folds: self.config.learning.folds,
            epochs: self.config.learning.epochs,
            seed: self.config.learning.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::parse_datetime;

    fn issue(id: &str, text: &str, resolved: &str) -> Issue {
        let date = parse_datetime(resolved).unwrap();
        Issue {
            id: id.into(),
            description: Some(text.into()),
            comments: None,
            created: date,
            updated: date,
            resolved: date,
            patch_paths: vec![],
        }
    }

    fn commit(hash: &str, message: &str, committed: &str, files: &[&str]) -> Commit {
        let date = parse_datetime(committed).unwrap();
        Commit {
            hash: hash.into(),
            author: "alice".into(),
            committer: "alice".into(),
            author_date: date,
            commit_date: date,
            message: message.into(),
            files: files.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn pipeline() -> LinkPipeline {
        LinkPipeline::new(TracelinkConfig::default()).unwrap()
    }

    #[test]
    fn test_context_lookup_errors() {
        let issues: IndexMap<IssueId, Issue> = IndexMap::new();
        let commits: IndexMap<CommitHash, Commit> = IndexMap::new();
        let context = LinkContext::new(&issues, &commits);
        assert!(matches!(
            context.issue("HADOOP-1").unwrap_err(),
            TracelinkError::MissingData { .. }
        ));
        assert!(matches!(
            context.commit("deadbeef").unwrap_err(),
            TracelinkError::MissingData { .. }
        ));
    }

    #[test]
    fn test_filter_chain_narrows_and_reports() {
        let issues: IndexMap<IssueId, Issue> =
            [issue("HADOOP-1", "text", "2009-05-01T10:05:00+00:00")]
                .into_iter()
                .map(|i| (i.id.clone(), i))
                .collect();
        let commits: IndexMap<CommitHash, Commit> = [
            commit("c1", "", "2009-05-01T10:00:00+00:00", &[]),
            commit("c2", "", "2009-04-20T10:00:00+00:00", &[]),
        ]
        .into_iter()
        .map(|c| (c.hash.clone(), c))
        .collect();
        let context = LinkContext::new(&issues, &commits);

        let mut seed = IssueLinkMap::new();
        seed.insert("HADOOP-1", "c1");
        seed.insert("HADOOP-1", "c2");

        let mut chain = FilterPipeline::new();
        chain.push(Box::new(TimeFilter::new(
            crate::core::config::TimeFilterConfig::default(),
        )));
        let (retained, reports) = chain.run(&context, seed).unwrap();

        assert!(retained.contains("HADOOP-1", "c1"));
        assert!(!retained.contains("HADOOP-1", "c2"));
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].stage, "time");
        assert_eq!(reports[0].retained, 1);
        assert_eq!(reports[0].removed, 1);
    }

    #[test]
    fn test_run_rejects_empty_inputs() {
        let pipeline = pipeline();
        let err = pipeline.run(LinkInputs::default()).unwrap_err();
        assert!(matches!(err, TracelinkError::Validation { .. }));
    }

    #[test]
    fn test_run_without_positive_labels_is_degenerate() {
        let pipeline = pipeline();
        let inputs = LinkInputs {
            issues: vec![issue("HADOOP-1", "text", "2009-05-01T10:05:00+00:00")],
            commits: vec![commit("c1", "no reference", "2009-05-01T10:00:00+00:00", &[])],
        };
        assert!(matches!(
            pipeline.run(inputs).unwrap_err(),
            TracelinkError::DegenerateTraining { .. }
        ));
    }

    #[test]
    fn test_run_keeps_keyword_links_and_scores_every_candidate() {
        let pipeline = pipeline();
        let mut inputs = LinkInputs::default();
        // Ten issue/commit pairs, each resolved five minutes after its
        // commit, half of them carrying the ticket reference.
        for i in 0..10 {
            let day = format!("2009-05-{:02}", i + 1);
            inputs.issues.push(issue(
                &format!("HADOOP-{i}"),
                &format!("fix problem number {i} in the namenode"),
                &format!("{day}T10:05:00+00:00"),
            ));
            let message = if i % 2 == 0 {
                format!("HADOOP-{i}. Fix problem number {i} in the namenode.")
            } else {
                format!("Fix problem number {i} in the namenode.")
            };
            inputs.commits.push(commit(
                &format!("c{i}"),
                &message,
                &format!("{day}T10:00:00+00:00"),
                &["src/NameNode.java"],
            ));
        }

        let outcome = pipeline.run(inputs).unwrap();
        // Every keyword link survives into the final map.
        for i in (0..10).step_by(2) {
            assert!(outcome.links.contains(&format!("HADOOP-{i}"), &format!("c{i}")));
        }
        assert!(!outcome.scores.is_empty());
        let correction = outcome.correction.unwrap();
        assert!(correction > 0.0 && correction <= 1.0);
        for score in &outcome.scores {
            assert!(score.probability.is_finite());
        }
        assert!(outcome.diagnostics.is_empty());
    }

    #[test]
    fn test_heuristic_links_merge_keyword_and_loner() {
        let pipeline = pipeline();
        let inputs = LinkInputs {
            issues: vec![
                issue("HADOOP-1", "keyword linked", "2009-05-01T12:00:00+00:00"),
                // Resolved five minutes after the only unclaimed commit.
                issue("HADOOP-2", "quiet fix", "2009-05-02T10:05:00+00:00"),
            ],
            commits: vec![
                commit("c1", "HADOOP-1. Fix.", "2009-05-01T09:00:00+00:00", &[]),
                commit("c2", "cleanup", "2009-05-02T10:00:00+00:00", &[]),
            ],
        };

        let (links, reports) = pipeline.heuristic_links(&inputs).unwrap();
        assert!(links.contains("HADOOP-1", "c1"));
        assert!(links.contains("HADOOP-2", "c2"));
        assert!(reports.iter().any(|report| report.stage == "loner"));
    }

    #[test]
    fn test_similarity_links_threshold() {
        let pipeline = pipeline();
        let inputs = LinkInputs {
            issues: vec![issue(
                "HADOOP-1",
                "namenode restart deadlock",
                "2009-05-01T10:05:00+00:00",
            )],
            commits: vec![
                commit(
                    "c1",
                    "HADOOP-1. Resolve the namenode restart deadlock.",
                    "2009-05-01T10:00:00+00:00",
                    &[],
                ),
                commit(
                    "c2",
                    "Bump build script dependency versions.",
                    "2009-05-01T11:00:00+00:00",
                    &[],
                ),
            ],
        };

        let links = pipeline.similarity_links(&inputs).unwrap();
        assert!(links.contains("HADOOP-1", "c1"));
        assert!(!links.contains("HADOOP-1", "c2"));
    }

    #[test]
    fn test_nsd_links_use_document_text() {
        struct FixedDiff;
        impl DiffSource for FixedDiff {
            fn diff_text(&self, hash: &str, _context_lines: u32) -> Result<String> {
                Ok(match hash {
                    "c1" => "\
+++ docs/design.txt
@@ -1,1 +1,3 @@
 upgrade notes
+namenode restart deadlock resolved
+safe mode handling rewritten
"
                    .to_string(),
                    _ => String::new(),
                })
            }
        }

        let pipeline = pipeline();
        let inputs = LinkInputs {
            issues: vec![issue(
                "HADOOP-1",
                "namenode restart deadlock",
                "2009-05-01T10:05:00+00:00",
            )],
            commits: vec![commit(
                "c1",
                "Update upgrade notes.",
                "2009-05-01T10:00:00+00:00",
                &["docs/design.txt"],
            )],
        };

        let (links, diagnostics) = pipeline.nsd_links(&inputs, &FixedDiff).unwrap();
        assert!(links.contains("HADOOP-1", "c1"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_nsd_links_surface_missing_diff_files() {
        // The diff source knows nothing about the changed documents, so
        // every document file must come back as a recorded anomaly.
        struct EmptyDiff;
        impl DiffSource for EmptyDiff {
            fn diff_text(&self, _hash: &str, _context_lines: u32) -> Result<String> {
                Ok(String::new())
            }
        }

        let pipeline = pipeline();
        let inputs = LinkInputs {
            issues: vec![issue("HADOOP-1", "notes", "2009-05-01T10:05:00+00:00")],
            commits: vec![
                commit(
                    "c1",
                    "Update notes.",
                    "2009-05-01T10:00:00+00:00",
                    &["docs/a.txt"],
                ),
                commit(
                    "c2",
                    "Update more notes.",
                    "2009-05-01T11:00:00+00:00",
                    &["docs/b.md"],
                ),
            ],
        };

        let (links, diagnostics) = pipeline.nsd_links(&inputs, &EmptyDiff).unwrap();
        assert!(links.is_empty());
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics.warnings()[0].commit, "c1");
        assert_eq!(diagnostics.warnings()[0].file, "docs/a.txt");
        assert_eq!(diagnostics.warnings()[1].commit, "c2");
        assert_eq!(diagnostics.warnings()[1].file, "docs/b.md");
    }

    #[test]
    fn test_comment_links_use_doc_text() {
        struct FixedComments;
        impl CommentSource for FixedComments {
            fn comment_text(
                &self,
                hash: &str,
                _source_extensions: &[String],
            ) -> Result<String> {
                Ok(match hash {
                    "c1" => "Restarts the namenode after a deadlock.\n".to_string(),
                    _ => "Formats a byte count for display.\n".to_string(),
                })
            }
        }

        let pipeline = pipeline();
        let inputs = LinkInputs {
            issues: vec![issue(
                "HADOOP-1",
                "namenode restart deadlock",
                "2009-05-01T10:05:00+00:00",
            )],
            commits: vec![
                commit(
                    "c1",
                    "Fix restart handling.",
                    "2009-05-01T10:00:00+00:00",
                    &["src/NameNode.java"],
                ),
                commit(
                    "c2",
                    "Polish display helpers.",
                    "2009-05-01T11:00:00+00:00",
                    &["src/StringUtils.java"],
                ),
            ],
        };

        let links = pipeline.comment_links(&inputs, &FixedComments).unwrap();
        assert!(links.contains("HADOOP-1", "c1"));
        assert!(!links.contains("HADOOP-1", "c2"));
    }
}
