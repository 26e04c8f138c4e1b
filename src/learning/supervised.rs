//! Plain supervised baseline over the keyword labels.
//!
//! Treats the observed labels as ordinary ground truth, ignoring the PU
//! bias. Exists for comparison and ablation only; the corrected
//! classifier in [`crate::learning::pu`] is the primary inference path.

use ndarray::ArrayView2;

use crate::core::errors::{Result, TracelinkError};
use crate::learning::classifier::{GridSearchCv, SgdLogistic};

/// Tuned classifier with a fixed 0.5 decision threshold.
#[derive(Debug)]
pub struct SupervisedModel {
    search: GridSearchCv,
    model: Option<SgdLogistic>,
}

impl SupervisedModel {
    /// Build an unfitted baseline model.
    pub fn new(search: GridSearchCv) -> Self {
        Self {
            search,
            model: None,
        }
    }

    /// Grid-search and fit on the labels as-is.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<()> {
        self.model = Some(self.search.fit(x, y)?);
        Ok(())
    }

    /// Positive-class probability per row.
    pub fn predict_prob(&self, x: ArrayView2<'_, f64>) -> Result<Vec<f64>> {
        let model = self.fitted()?;
        Ok(model.predict_proba(x).to_vec())
    }

    /// Boolean decision per row at probability >= 0.5.
    pub fn predict(&self, x: ArrayView2<'_, f64>) -> Result<Vec<bool>> {
        let probs = self.predict_prob(x)?;
        Ok(probs.into_iter().map(|p| p >= 0.5).collect())
    }

    fn fitted(&self) -> Result<&SgdLogistic> {
        self.model
            .as_ref()
            .ok_or_else(|| TracelinkError::internal("supervised model used before fitting"))
    }
}
