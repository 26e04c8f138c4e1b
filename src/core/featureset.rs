//! Feature assembly for the classification stage.
//!
//! Each surviving candidate pair becomes one row: source-file fraction,
//! source-file count, absolute time delta, and text similarity, z-scored
//! per batch, plus an unstandardized time-direction bit. Standardization
//! uses the batch's own mean and population stddev, so the same pair can
//! standardize differently across runs with different candidate batches;
//! that is a property of the method, carried over deliberately.

use ahash::AHashMap;
use ndarray::{Array2, Axis};
use tracing::info;

use crate::core::candidates::CandidateGenerator;
use crate::core::config::TracelinkConfig;
use crate::core::errors::{Result, TracelinkError};
use crate::core::linkmap::IssueLinkMap;
use crate::core::pipeline::LinkContext;
use crate::core::types::{Commit, PairKey};
use crate::filters::keyword::KeywordLinker;
use crate::text::normalize::TextNormalizer;
use crate::text::tfidf::TfIdfVectorizer;

/// Number of z-scored columns; the direction bit follows them.
pub const CONTINUOUS_FEATURES: usize = 4;

/// One batch of candidate-pair features ready for training.
#[derive(Debug)]
pub struct FeatureBatch {
    /// Row-per-pair matrix: four standardized columns plus the direction bit
    pub matrix: Array2<f64>,
    /// Observed-positive labels (1 = keyword-linked)
    pub labels: Vec<u8>,
    /// Pair identity for each row, in row order
    pub names: Vec<PairKey>,
}

impl FeatureBatch {
    /// Number of candidate pairs in the batch.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when the batch holds no pairs.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Number of rows carrying the positive label.
    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&label| label == 1).count()
    }
}

/// Builds [`FeatureBatch`]es from a link context.
pub struct FeatureExtractor<'a> {
    config: &'a TracelinkConfig,
    normalizer: &'a TextNormalizer,
}

impl<'a> FeatureExtractor<'a> {
    /// Create an extractor over one run's configuration and lexicon.
    pub fn new(config: &'a TracelinkConfig, normalizer: &'a TextNormalizer) -> Self {
        Self { config, normalizer }
    }

    /// Assemble the full candidate batch.
    ///
    /// Fails with a configuration error when no pair survives the
    /// candidate window; an empty universe means the window settings do
    /// not fit the data and training would be meaningless.
    pub fn extract(
        &self,
        context: &LinkContext<'_>,
        keyword_links: &IssueLinkMap,
        linker: &KeywordLinker,
    ) -> Result<FeatureBatch> {
        let generator = CandidateGenerator::new(self.config.candidates.clone());

        // Fit the vector space over every text that will be scored:
        // issue descriptions, issue comments, and masked commit messages.
        let mut corpus: Vec<String> = Vec::new();
        let mut issue_texts: AHashMap<&str, String> = AHashMap::new();
        for (issue_id, issue) in context.issues() {
            let description = self.normalizer.normalize_opt(issue.description.as_deref());
            let comments = self.normalizer.normalize_opt(issue.comments.as_deref());
            issue_texts.insert(issue_id, format!("{description} {comments}"));
            corpus.push(description);
            corpus.push(comments);
        }
        let mut message_texts: AHashMap<&str, String> = AHashMap::new();
        for (hash, commit) in context.commits() {
            let masked = linker.mask(&commit.message);
            let message = self.normalizer.normalize(&masked);
            corpus.push(message.clone());
            message_texts.insert(hash, message);
        }

        let vectorizer = TfIdfVectorizer::fit(&corpus)?;
        let message_vectors: AHashMap<&str, _> = message_texts
            .iter()
            .map(|(hash, text)| (*hash, vectorizer.transform(text)))
            .collect();

        let mut rows: Vec<f64> = Vec::new();
        let mut labels: Vec<u8> = Vec::new();
        let mut names: Vec<PairKey> = Vec::new();
        for (issue_id, issue) in context.issues() {
            let issue_vector = vectorizer.transform(&issue_texts[issue_id.as_str()]);
            for (hash, commit) in context.commits() {
                if !generator.is_candidate(issue, commit) {
                    continue;
                }
                let time = generator.time_features(issue, commit);
                let (fraction, count) =
                    source_file_features(commit, &self.config.project.source_extensions);
                let similarity = issue_vector.cosine(&message_vectors[hash.as_str()]);

                rows.extend([fraction, count as f64, time.delta_secs, similarity, time.direction]);
                labels.push(u8::from(keyword_links.contains(issue_id, hash)));
                names.push(PairKey::new(issue_id.clone(), hash.clone()));
            }
        }

        if names.is_empty() {
            return Err(TracelinkError::config(
                "candidate universe is empty: no issue/commit pair survives the time window",
            ));
        }

        let mut matrix = Array2::from_shape_vec((names.len(), CONTINUOUS_FEATURES + 1), rows)
            .map_err(|e| TracelinkError::internal(format!("feature matrix shape: {e}")))?;
        zscore_columns(&mut matrix, CONTINUOUS_FEATURES);

        info!(
            pairs = names.len(),
            positives = labels.iter().filter(|&&l| l == 1).count(),
            "extracted candidate feature batch"
        );

        Ok(FeatureBatch {
            matrix,
            labels,
            names,
        })
    }
}

/// Fraction and count of source files among a commit's changed files.
/// A commit with no files scores a zero fraction.
pub fn source_file_features(commit: &Commit, source_extensions: &[String]) -> (f64, usize) {
    let count = commit
        .files
        .iter()
        .filter(|file| source_extensions.iter().any(|ext| file.ends_with(ext.as_str())))
        .count();
    let fraction = if commit.files.is_empty() {
        0.0
    } else {
        count as f64 / commit.files.len() as f64
    };
    (fraction, count)
}

/// Z-score the first `columns` columns in place using the batch mean and
/// population standard deviation. A zero-variance column becomes all
/// zeros so every component stays finite.
pub fn zscore_columns(matrix: &mut Array2<f64>, columns: usize) {
    for mut column in matrix
        .axis_iter_mut(Axis(1))
        .take(columns)
    {
        let len = column.len() as f64;
        let mean = column.sum() / len;
        let variance = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / len;
        let stddev = variance.sqrt();
        if stddev > 0.0 {
            column.mapv_inplace(|v| (v - mean) / stddev);
        } else {
            column.fill(0.0);
        }
    }
}
