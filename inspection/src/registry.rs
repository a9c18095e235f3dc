use std::sync::Arc;

use machine_learning::RandomForest;
use parking_lot::RwLock;

use crate::{
    error::{InspectError, Result},
    schema::FeatureSchema,
};

/// A fitted classifier together with the feature schema it was fitted with.
///
/// Immutable once built, it's shared with in-flight predictions through an `Arc`.
#[derive(Debug)]
pub struct TrainedModel {
    forest: RandomForest,
    schema: FeatureSchema,
}

impl TrainedModel {
    pub fn new(forest: RandomForest, schema: FeatureSchema) -> Self {
        Self { forest, schema }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn n_estimators(&self) -> usize {
        self.forest.n_estimators()
    }

    /// Computes the class probabilities of a feature vector.
    ///
    /// # Arguments
    /// * `features` - The feature values, in schema order.
    ///
    /// # Returns
    /// `[P(class = 0), P(class = 1)]` or `FeatureCount` if the vector doesn't match the schema.
    pub fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        if features.len() != self.schema.len() {
            return Err(InspectError::FeatureCount {
                got: features.len(),
                expected: self.schema.len(),
            });
        }

        Ok(self.forest.predict_proba_one(features)?)
    }
}

/// Holds the single active model of the process.
///
/// Publishing swaps the whole `(model, schema)` pair at once, readers either see the previous
/// pair or the new one.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    current: RwLock<Option<Arc<TrainedModel>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active model.
    ///
    /// # Returns
    /// A shared handle to the published model.
    pub fn publish(&self, model: TrainedModel) -> Arc<TrainedModel> {
        let model = Arc::new(model);
        *self.current.write() = Some(Arc::clone(&model));
        model
    }

    /// Returns the active model, `None` while untrained.
    pub fn current(&self) -> Option<Arc<TrainedModel>> {
        self.current.read().clone()
    }

    pub fn is_trained(&self) -> bool {
        self.current.read().is_some()
    }

    /// Drops the active model, going back to the untrained state.
    pub fn clear(&self) {
        *self.current.write() = None;
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use machine_learning::{Dataset, ForestBuilder};

    use super::*;

    fn model(threshold: f64) -> TrainedModel {
        let data = vec![threshold - 1.0, threshold - 2.0, threshold + 1.0, threshold + 2.0];
        let dataset = Dataset::from_flat(data, 1, vec![0, 0, 1, 1]).unwrap();
        let forest = ForestBuilder::new()
            .n_estimators(NonZeroUsize::new(3).unwrap())
            .seed(Some(0))
            .fit(&dataset)
            .unwrap();

        TrainedModel::new(forest, FeatureSchema::new(["Temperature"]).unwrap())
    }

    #[test]
    fn registry_starts_untrained() {
        let registry = ModelRegistry::new();
        assert!(!registry.is_trained());
        assert!(registry.current().is_none());
    }

    #[test]
    fn publish_replaces_and_keeps_readers_consistent() {
        let registry = ModelRegistry::new();
        registry.publish(model(10.0));
        let in_flight = registry.current().unwrap();

        registry.publish(model(100.0));

        assert_eq!(in_flight.schema().names(), ["Temperature"]);
        assert!(!Arc::ptr_eq(&in_flight, &registry.current().unwrap()));

        registry.clear();
        assert!(!registry.is_trained());
    }

    #[test]
    fn predict_proba_checks_the_vector_length() {
        let model = model(10.0);
        let res = model.predict_proba(&[1.0, 2.0]);
        assert!(matches!(
            res,
            Err(InspectError::FeatureCount {
                got: 2,
                expected: 1
            })
        ));
    }
}
