use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::error::{MlErr, Result};

/// A labeled, in-memory binary classification dataset.
///
/// Features are stored row-major, one sample per row. Labels are `0` or `1`.
#[derive(Debug, Clone)]
pub struct Dataset {
    x: Array2<f64>,
    y: Vec<u8>,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `x` - The feature matrix, shaped `(samples, features)`.
    /// * `y` - One binary label per sample.
    ///
    /// # Returns
    /// A new `Dataset` or an error if the shapes disagree, the dataset is empty or a label
    /// isn't binary.
    pub fn new(x: Array2<f64>, y: Vec<u8>) -> Result<Self> {
        let (nrows, ncols) = x.dim();

        if nrows != y.len() {
            return Err(MlErr::SizeMismatch {
                a: "labels",
                b: "feature rows",
                got: y.len(),
                expected: nrows,
            });
        }

        if nrows == 0 {
            return Err(MlErr::EmptyDataset);
        }

        if ncols == 0 {
            return Err(MlErr::NoFeatures);
        }

        if let Some((index, &value)) = y.iter().enumerate().find(|(_, l)| **l > 1) {
            return Err(MlErr::InvalidLabel { index, value });
        }

        Ok(Self { x, y })
    }

    /// Creates a new `Dataset` from a flat row-major buffer.
    ///
    /// # Arguments
    /// * `data` - The flattened feature matrix.
    /// * `n_features` - The amount of features per sample.
    /// * `y` - One binary label per sample.
    pub fn from_flat(data: Vec<f64>, n_features: usize, y: Vec<u8>) -> Result<Self> {
        if n_features == 0 {
            return Err(MlErr::NoFeatures);
        }

        let x = Array2::from_shape_vec((data.len() / n_features, n_features), data)?;
        Self::new(x, y)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.y.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    #[inline]
    pub fn x(&self) -> ArrayView2<'_, f64> {
        self.x.view()
    }

    #[inline]
    pub fn y(&self) -> &[u8] {
        &self.y
    }

    /// Returns the features of the `idx`-th sample (panics if out of bounds).
    #[inline]
    pub fn row(&self, idx: usize) -> ArrayView1<'_, f64> {
        self.x.row(idx)
    }

    /// Counts the samples of each class.
    ///
    /// # Returns
    /// `[negatives, positives]`.
    pub fn class_counts(&self) -> [usize; 2] {
        let positives = self.y.iter().filter(|&&l| l == 1).count();
        [self.y.len() - positives, positives]
    }
}
