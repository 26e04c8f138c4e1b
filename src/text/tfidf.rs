//! TF-IDF vector space and cosine similarity.
//!
//! The vectorizer is fitted once per run over a corpus that must include
//! every text that will later be scored; the fitted vocabulary is then
//! read-only. Out-of-vocabulary terms contribute nothing, so unseen text
//! collapses toward zero similarity, which is the intended conservative
//! behavior. Thresholding is the caller's responsibility.

use ahash::AHashMap;

use crate::core::errors::{Result, TracelinkError};

/// Sparse L2-normalized document vector over the fitted vocabulary.
#[derive(Debug, Clone, Default)]
pub struct DocVector {
    /// (term index, weight) pairs sorted by term index
    entries: Vec<(usize, f64)>,
}

impl DocVector {
    /// Cosine similarity between two vectors from the same vocabulary.
    ///
    /// Both vectors are already L2-normalized, so this is a sparse dot
    /// product. Result is clamped into [0, 1] against rounding noise.
    pub fn cosine(&self, other: &DocVector) -> f64 {
        let mut dot = 0.0;
        let (mut i, mut j) = (0, 0);
        while i < self.entries.len() && j < other.entries.len() {
            match self.entries[i].0.cmp(&other.entries[j].0) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    dot += self.entries[i].1 * other.entries[j].1;
                    i += 1;
                    j += 1;
                }
            }
        }
        dot.clamp(0.0, 1.0)
    }

    /// True when the vector has no in-vocabulary terms.
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Term-frequency / inverse-document-frequency vectorizer.
///
/// Uses the smooth IDF `ln((1 + n) / (1 + df)) + 1` and L2 output
/// normalization, matching the reference vectorizer the association and
/// similarity studies were calibrated against.
#[derive(Debug, Default)]
pub struct TfIdfVectorizer {
    vocabulary: AHashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfIdfVectorizer {
    /// Fit the vocabulary and IDF weights over a corpus of pre-normalized
    /// (space-joined) documents.
    pub fn fit(corpus: &[String]) -> Result<Self> {
        if corpus.is_empty() {
            return Err(TracelinkError::validation(
                "cannot fit a TF-IDF vectorizer on an empty corpus",
            ));
        }

        let mut vocabulary: AHashMap<String, usize> = AHashMap::new();
        let mut document_frequencies: Vec<usize> = Vec::new();

        for document in corpus {
            let mut seen: Vec<usize> = Vec::new();
            for term in document.split_whitespace() {
                let next_index = vocabulary.len();
                let index = *vocabulary.entry(term.to_string()).or_insert(next_index);
                if index == document_frequencies.len() {
                    document_frequencies.push(0);
                }
                if !seen.contains(&index) {
                    seen.push(index);
                }
            }
            for index in seen {
                document_frequencies[index] += 1;
            }
        }

        let n = corpus.len() as f64;
        let idf = document_frequencies
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        Ok(Self { vocabulary, idf })
    }

    /// Transform a pre-normalized document into a sparse vector.
    pub fn transform(&self, document: &str) -> DocVector {
        let mut counts: AHashMap<usize, f64> = AHashMap::new();
        for term in document.split_whitespace() {
            if let Some(&index) = self.vocabulary.get(term) {
                *counts.entry(index).or_insert(0.0) += 1.0;
            }
        }

        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(index, tf)| (index, tf * self.idf[index]))
            .collect();
        entries.sort_unstable_by_key(|&(index, _)| index);

        let norm = entries.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut entries {
                *w /= norm;
            }
        }
        DocVector { entries }
    }

    /// Cosine similarity of two raw documents in this vector space.
    pub fn score(&self, text_a: &str, text_b: &str) -> f64 {
        self.transform(text_a).cosine(&self.transform(text_b))
    }

    /// Number of distinct terms in the fitted vocabulary.
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn corpus() -> Vec<String> {
        vec![
            "namenod failur restart".to_string(),
            "datanod block report".to_string(),
            "namenod block replic".to_string(),
        ]
    }

    #[test]
    fn test_identical_documents_score_one() {
        let v = TfIdfVectorizer::fit(&corpus()).unwrap();
        assert_relative_eq!(
            v.score("namenod failur restart", "namenod failur restart"),
            1.0,
            max_relative = 1e-9
        );
    }

    #[test]
    fn test_disjoint_documents_score_zero() {
        let v = TfIdfVectorizer::fit(&corpus()).unwrap();
        assert_eq!(v.score("namenod failur", "datanod report"), 0.0);
    }

    #[test]
    fn test_out_of_vocabulary_collapses_to_zero() {
        let v = TfIdfVectorizer::fit(&corpus()).unwrap();
        let vec = v.transform("completely unseen words");
        assert!(vec.is_zero());
        assert_eq!(v.score("completely unseen", "namenod failur"), 0.0);
    }

    #[test]
    fn test_partial_overlap_is_between_zero_and_one() {
        let v = TfIdfVectorizer::fit(&corpus()).unwrap();
        let score = v.score("namenod failur restart", "namenod block replic");
        assert!(score > 0.0 && score < 1.0, "got {score}");
    }

    #[test]
    fn test_rare_terms_weigh_more_than_common() {
        let v = TfIdfVectorizer::fit(&corpus()).unwrap();
        // "namenod" appears in two documents, "failur" in one; sharing the
        // rarer term must score at least as high as sharing the common one.
        let rare = v.score("failur report", "namenod failur restart");
        let common = v.score("namenod report", "namenod failur restart");
        assert!(rare >= common, "rare {rare} vs common {common}");
    }

    #[test]
    fn test_empty_corpus_is_error() {
        assert!(TfIdfVectorizer::fit(&[]).is_err());
    }
}
