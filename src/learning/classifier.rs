//! Logistic regression trained by SGD, with cross-validated grid search.
//!
//! The probabilistic base classifier behind both decision stages. Grid
//! search fans the regularization grid out across worker threads; each
//! task trains on an immutable view of the feature matrix and returns a
//! score, and the caller reduces by max-score selection.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::debug;

use crate::core::errors::{Result, TracelinkError};

fn sigmoid(z: f64) -> f64 {
    // Clamp to keep exp() finite on separable data.
    1.0 / (1.0 + (-z.clamp(-500.0, 500.0)).exp())
}

/// L2-regularized logistic regression fitted by stochastic gradient
/// descent.
#[derive(Debug, Clone)]
pub struct SgdLogistic {
    /// L2 regularization strength
    pub alpha: f64,
    /// Passes over the training data
    pub epochs: usize,
    /// Shuffle seed
    pub seed: u64,
    weights: Array1<f64>,
    bias: f64,
}

impl SgdLogistic {
    /// Create an unfitted model.
    pub fn new(alpha: f64, epochs: usize, seed: u64) -> Self {
        Self {
            alpha,
            epochs,
            seed,
            weights: Array1::zeros(0),
            bias: 0.0,
        }
    }

    /// Fit on a feature matrix and 0/1 labels.
    pub fn fit(&mut self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(TracelinkError::validation(format!(
                "feature/label length mismatch: {} rows vs {} labels",
                x.nrows(),
                y.len()
            )));
        }
        if x.nrows() == 0 {
            return Err(TracelinkError::validation(
                "cannot fit a classifier on an empty batch",
            ));
        }

        self.weights = Array1::zeros(x.ncols());
        self.bias = 0.0;

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        for epoch in 0..self.epochs {
            order.shuffle(&mut rng);
            let eta = 0.5 / (1.0 + epoch as f64);
            for &i in &order {
                let row = x.row(i);
                let p = sigmoid(row.dot(&self.weights) + self.bias);
                let gradient = p - f64::from(y[i]);
                ndarray::Zip::from(&mut self.weights)
                    .and(&row)
                    .for_each(|w, &v| *w -= eta * (gradient * v + self.alpha * *w));
                self.bias -= eta * gradient;
            }
        }
        Ok(())
    }

    /// Probability of the positive class per row.
    pub fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        x.rows()
            .into_iter()
            .map(|row| sigmoid(row.dot(&self.weights) + self.bias))
            .collect()
    }

    /// Probability of the positive class for one row.
    pub fn predict_proba_one(&self, row: ArrayView1<'_, f64>) -> f64 {
        sigmoid(row.dot(&self.weights) + self.bias)
    }
}

/// Cross-validated search over an L2-strength grid.
#[derive(Debug, Clone)]
pub struct GridSearchCv {
    /// Regularization strengths to evaluate
    pub alphas: Vec<f64>,
    /// Cross-validation folds
    pub folds: usize,
    /// SGD epochs per candidate fit
    pub epochs: usize,
    /// Seed for fold assignment and SGD shuffling
    pub seed: u64,
}

impl GridSearchCv {
    /// Evaluate every grid point and refit the winner on the full batch.
    /// Ties resolve to the earliest grid entry so runs are reproducible.
    pub fn fit(&self, x: ArrayView2<'_, f64>, y: &[u8]) -> Result<SgdLogistic> {
        if self.alphas.is_empty() {
            return Err(TracelinkError::config_field(
                "hyperparameter grid must not be empty",
                "learning.alpha_grid",
            ));
        }

        let folds = self.folds.clamp(2, x.nrows().max(2));
        let mut order: Vec<usize> = (0..x.nrows()).collect();
        order.shuffle(&mut StdRng::seed_from_u64(self.seed));

        let scored: Vec<(usize, f64)> = self
            .alphas
            .par_iter()
            .enumerate()
            .map(|(index, &alpha)| {
                let score = self.cv_score(x, y, alpha, folds, &order)?;
                Ok((index, score))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut best = scored[0];
        for candidate in &scored[1..] {
            if candidate.1 > best.1 {
                best = *candidate;
            }
        }
        let alpha = self.alphas[best.0];
        debug!(alpha, score = best.1, "grid search selected alpha");

        let mut model = SgdLogistic::new(alpha, self.epochs, self.seed);
        model.fit(x, y)?;
        Ok(model)
    }

    /// Mean held-out accuracy of one grid point.
    fn cv_score(
        &self,
        x: ArrayView2<'_, f64>,
        y: &[u8],
        alpha: f64,
        folds: usize,
        order: &[usize],
    ) -> Result<f64> {
        let chunk = order.len().div_ceil(folds);
        let mut scores = Vec::with_capacity(folds);
        for test in order.chunks(chunk) {
            let train: Vec<usize> = order
                .iter()
                .copied()
                .filter(|i| !test.contains(i))
                .collect();
            if train.is_empty() || test.is_empty() {
                continue;
            }

            let train_x = x.select(Axis(0), &train);
            let train_y: Vec<u8> = train.iter().map(|&i| y[i]).collect();
            let mut model = SgdLogistic::new(alpha, self.epochs, self.seed);
            model.fit(train_x.view(), &train_y)?;

            let correct = test
                .iter()
                .filter(|&&i| {
                    let predicted = model.predict_proba_one(x.row(i)) >= 0.5;
                    predicted == (y[i] == 1)
                })
                .count();
            scores.push(correct as f64 / test.len() as f64);
        }
        if scores.is_empty() {
            return Err(TracelinkError::validation(
                "batch too small for cross-validation",
            ));
        }
        Ok(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}
