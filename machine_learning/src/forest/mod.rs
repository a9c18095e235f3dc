mod builder;
mod tree;

pub use builder::ForestBuilder;
pub use tree::{DecisionTree, TreeParams};

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rayon::prelude::*;

use crate::error::{MlErr, Result};

/// A bagged ensemble of `DecisionTree`s for binary classification.
///
/// Once fitted it's immutable, the probability of a sample is the mean of the leaf probabilities
/// of every tree.
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    pub(crate) fn new(trees: Vec<DecisionTree>, n_features: usize) -> Self {
        Self { trees, n_features }
    }

    /// Returns the amount of trees in the ensemble.
    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    /// Returns the amount of features the forest was fitted with.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Computes the class probabilities of a single sample.
    ///
    /// # Arguments
    /// * `row` - The sample's features.
    ///
    /// # Returns
    /// `[P(class = 0), P(class = 1)]` or an error if `row` has the wrong length.
    pub fn predict_proba_one(&self, row: &[f64]) -> Result<[f64; 2]> {
        self.check_width("sample", row.len())?;
        let p1 = self.positive_proba(ArrayView1::from(row));
        Ok([1.0 - p1, p1])
    }

    /// Computes the class probabilities of every row of `x`.
    ///
    /// # Arguments
    /// * `x` - The feature matrix, shaped `(samples, features)`.
    ///
    /// # Returns
    /// A `(samples, 2)` matrix with the probabilities of class `0` and `1` per row.
    pub fn predict_proba(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        self.check_width("feature matrix", x.ncols())?;

        let p1: Vec<f64> = x
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| self.positive_proba(row))
            .collect();

        let mut out = Array2::zeros((p1.len(), 2));
        for (mut dst, p) in out.axis_iter_mut(Axis(0)).zip(p1) {
            dst[0] = 1.0 - p;
            dst[1] = p;
        }

        Ok(out)
    }

    /// Predicts the class of every row of `x`, `1` when its probability is above one half.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Vec<u8>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.column(1).iter().map(|&p| u8::from(p > 0.5)).collect())
    }

    fn positive_proba(&self, row: ArrayView1<f64>) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_proba(row)).sum();
        sum / self.trees.len() as f64
    }

    fn check_width(&self, what: &'static str, got: usize) -> Result<()> {
        if got != self.n_features {
            return Err(MlErr::SizeMismatch {
                a: what,
                b: "fitted features",
                got,
                expected: self.n_features,
            });
        }

        Ok(())
    }
}
