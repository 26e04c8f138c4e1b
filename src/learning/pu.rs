//! Positive-unlabeled correction (Elkan & Noto, 2008).
//!
//! A classifier `g` is trained to predict the noisy observed label `s`.
//! Under the PU assumption the labeled examples are a uniform random
//! sample of the true positives, so the mean of `g` over the labeled
//! subset estimates the labeling frequency `c`, and `g(x) / c` estimates
//! the true-link probability.

use ndarray::ArrayView2;
use tracing::info;

use crate::core::errors::{Result, TracelinkError};
use crate::learning::classifier::{GridSearchCv, SgdLogistic};

/// Strategy for estimating the labeling frequency `c` from the
/// classifier's outputs on the labeled positives.
///
/// The canonical estimator is the in-sample mean; the trait seam exists so
/// a held-out variant can be substituted without touching the classifier.
pub trait CorrectionEstimator: Send + Sync {
    /// Estimate `c` from `g(x)` over every labeled-positive example.
    fn estimate(&self, positive_probs: &[f64]) -> Result<f64>;
}

/// The estimator from the original formulation: `c = e1`, the mean of
/// `g(x)` over the labeled positives of the training batch itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanOnLabeled;

impl CorrectionEstimator for MeanOnLabeled {
    fn estimate(&self, positive_probs: &[f64]) -> Result<f64> {
        if positive_probs.is_empty() {
            return Err(TracelinkError::degenerate_training(
                "no example carries the positive label; the correction constant is undefined",
            ));
        }
        Ok(positive_probs.iter().sum::<f64>() / positive_probs.len() as f64)
    }
}

/// PU-corrected classifier: the canonical final decision stage.
pub struct PuClassifier {
    search: GridSearchCv,
    estimator: Box<dyn CorrectionEstimator>,
    model: Option<SgdLogistic>,
    c: f64,
}

impl PuClassifier {
    /// Build an unfitted classifier with the canonical `c` estimator.
    pub fn new(search: GridSearchCv) -> Self {
        Self::with_estimator(search, Box::new(MeanOnLabeled))
    }

    /// Build an unfitted classifier with a custom `c` estimator.
    pub fn with_estimator(search: GridSearchCv, estimator: Box<dyn CorrectionEstimator>) -> Self {
        Self {
            search,
            estimator,
            model: None,
            c: 0.0,
        }
    }

    /// Train `g` on the noisy labels and estimate the correction constant.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, s: &[u8]) -> Result<()> {
        let model = self.search.fit(x, s)?;

        let probs = model.predict_proba(x);
        let positive_probs: Vec<f64> = probs
            .iter()
            .zip(s)
            .filter(|(_, &label)| label == 1)
            .map(|(p, _)| *p)
            .collect();
        self.c = self.estimator.estimate(&positive_probs)?;
        info!(c = self.c, positives = positive_probs.len(), "fitted PU correction");

        self.model = Some(model);
        Ok(())
    }

    /// The fitted labeling-frequency estimate.
    pub fn correction(&self) -> f64 {
        self.c
    }

    /// Raw `g(x)` per row.
    pub fn predict_raw(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        let model = self.fitted()?;
        Ok(model.predict_proba(x).to_vec())
    }

    /// Corrected true-link probability estimate `g(x) / c` per row.
    pub fn predict_prob(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        let raw = self.predict_raw(x)?;
        Ok(raw.into_iter().map(|p| p / self.c).collect())
    }

    /// Boolean decision per row: `g(x) >= 0.5 * c`, equivalent to the
    /// corrected probability reaching one half.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<bool>> {
        let threshold = 0.5 * self.c;
        let raw = self.predict_raw(x)?;
        Ok(raw.into_iter().map(|p| p >= threshold).collect())
    }

    fn fitted(&self) -> Result<&SgdLogistic> {
        self.model
            .as_ref()
            .ok_or_else(|| TracelinkError::internal("PU classifier used before fitting"))
    }
}
