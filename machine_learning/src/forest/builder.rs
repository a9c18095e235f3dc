use std::num::NonZeroUsize;

use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;

use super::{DecisionTree, RandomForest, TreeParams};
use crate::{
    dataset::Dataset,
    error::{MlErr, Result},
};

const DEFAULT_ESTIMATORS: NonZeroUsize = NonZeroUsize::new(100).unwrap();

/// Fits `RandomForest`s given a set of hyperparameters.
///
/// Every tree draws its bootstrap sample and feature subsets from its own rng, seeded from the
/// builder's seed and the tree's index, so the trees can be grown in parallel and a fixed seed
/// always yields the same forest.
#[derive(Debug, Clone)]
pub struct ForestBuilder {
    n_estimators: NonZeroUsize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    max_features: Option<usize>,
    seed: Option<u64>,
}

impl Default for ForestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ForestBuilder {
    /// Creates a new `ForestBuilder` with 100 fully grown trees and no fixed seed.
    pub fn new() -> Self {
        Self {
            n_estimators: DEFAULT_ESTIMATORS,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            seed: None,
        }
    }

    pub fn n_estimators(mut self, n_estimators: NonZeroUsize) -> Self {
        self.n_estimators = n_estimators;
        self
    }

    pub fn max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Nodes with fewer samples than this become leaves, values below 2 are raised to 2.
    pub fn min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split.max(2);
        self
    }

    /// Amount of features sampled per node, defaults to the square root of the feature count.
    pub fn max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    /// Fits a new forest on `dataset`.
    ///
    /// # Arguments
    /// * `dataset` - The labeled samples.
    ///
    /// # Returns
    /// The fitted `RandomForest` or `MlErr::SingleClass` if only one class is present.
    pub fn fit(&self, dataset: &Dataset) -> Result<RandomForest> {
        match dataset.class_counts() {
            [0, _] => return Err(MlErr::SingleClass { class: 1 }),
            [_, 0] => return Err(MlErr::SingleClass { class: 0 }),
            _ => {}
        }

        let n_features = dataset.n_features();
        let params = TreeParams {
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split,
            max_features: self.resolve_max_features(n_features),
        };

        let base_seed = self.generate_seed();
        let n_samples = dataset.len();
        log::debug!(
            "fitting {} trees over {n_samples} samples and {n_features} features",
            self.n_estimators
        );

        let trees = (0..self.n_estimators.get())
            .into_par_iter()
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(i as u64));
                let bootstrap = (0..n_samples)
                    .map(|_| rng.random_range(0..n_samples))
                    .collect();

                DecisionTree::fit(dataset.x(), dataset.y(), bootstrap, &params, &mut rng)
            })
            .collect();

        Ok(RandomForest::new(trees, n_features))
    }

    fn resolve_max_features(&self, n_features: usize) -> usize {
        match self.max_features {
            Some(n) => n.clamp(1, n_features),
            None => ((n_features as f64).sqrt().ceil() as usize).max(1),
        }
    }

    fn generate_seed(&self) -> u64 {
        match self.seed {
            Some(seed) => seed,
            None => StdRng::from_os_rng().random(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well separated blobs, label 1 around the origin.
    fn blobs() -> Dataset {
        let mut data = Vec::new();
        let mut labels = Vec::new();

        for i in 0..20 {
            let d = i as f64 * 0.1;
            data.extend([d, -d]);
            labels.push(1);
            data.extend([10.0 + d, 10.0 - d]);
            labels.push(0);
        }

        Dataset::from_flat(data, 2, labels).unwrap()
    }

    #[test]
    fn forest_fits_separable_data() {
        let dataset = blobs();
        let forest = ForestBuilder::new()
            .n_estimators(NonZeroUsize::new(10).unwrap())
            .seed(Some(42))
            .fit(&dataset)
            .unwrap();

        assert_eq!(forest.n_estimators(), 10);
        assert_eq!(forest.predict(dataset.x()).unwrap(), dataset.y());

        let [p0, p1] = forest.predict_proba_one(&[0.5, -0.5]).unwrap();
        assert!(p1 > 0.5);
        assert!((p0 + p1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn forest_is_deterministic_for_a_seed() {
        let dataset = blobs();
        let builder = ForestBuilder::new()
            .n_estimators(NonZeroUsize::new(16).unwrap())
            .seed(Some(7));

        let a = builder.fit(&dataset).unwrap();
        let b = builder.fit(&dataset).unwrap();

        let samples = ndarray::array![[5.0, 5.0], [3.0, 1.0], [8.0, 9.0]];
        assert_eq!(
            a.predict_proba(samples.view()).unwrap(),
            b.predict_proba(samples.view()).unwrap()
        );
    }

    #[test]
    fn forest_rejects_single_class() {
        let dataset = Dataset::from_flat(vec![1.0, 2.0, 3.0], 1, vec![1, 1, 1]).unwrap();
        let res = ForestBuilder::new().seed(Some(1)).fit(&dataset);
        assert!(matches!(res, Err(MlErr::SingleClass { class: 1 })));
    }

    #[test]
    fn forest_rejects_wrong_sample_width() {
        let forest = ForestBuilder::new()
            .n_estimators(NonZeroUsize::new(2).unwrap())
            .seed(Some(0))
            .fit(&blobs())
            .unwrap();

        let res = forest.predict_proba_one(&[1.0]);
        assert!(matches!(
            res,
            Err(MlErr::SizeMismatch {
                got: 1,
                expected: 2,
                ..
            })
        ));
    }
}
