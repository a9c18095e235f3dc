use std::{num::NonZeroUsize, str::FromStr};

use machine_learning::ForestBuilder;

use crate::error::InspectError;

const DEFAULT_ESTIMATORS: NonZeroUsize = NonZeroUsize::new(100).unwrap();
const DEFAULT_EPOCHS: NonZeroUsize = NonZeroUsize::new(10).unwrap();

/// How the simulation cursor decides a supplied record set is a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SnapshotKey {
    /// Only a different record count replaces the snapshot.
    #[default]
    Length,
    /// Any difference in the normalized content replaces the snapshot.
    Content,
}

impl FromStr for SnapshotKey {
    type Err = InspectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "length" => Ok(Self::Length),
            "content" => Ok(Self::Content),
            other => Err(InspectError::InvalidConfig(format!(
                "unknown snapshot key {other:?}, expected length or content"
            ))),
        }
    }
}

/// The three sensor readings echoed back with every prediction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sensors {
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
}

/// A normal distribution's parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub mean: f64,
    pub std_dev: f64,
}

/// Distributions the synthetic sensor readings are drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticSpec {
    pub temperature: Gaussian,
    pub pressure: Gaussian,
    pub humidity: Gaussian,
}

/// Immutable settings of an inspection service instance.
#[derive(Debug, Clone)]
pub struct InspectionConfig {
    estimators: NonZeroUsize,
    seed: Option<u64>,
    max_depth: Option<usize>,
    min_samples_split: usize,
    epochs: NonZeroUsize,
    fallback_count: usize,
    sensor_defaults: Sensors,
    synthetic: SyntheticSpec,
    snapshot_key: SnapshotKey,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            estimators: DEFAULT_ESTIMATORS,
            seed: Some(42),
            max_depth: None,
            min_samples_split: 2,
            epochs: DEFAULT_EPOCHS,
            fallback_count: 1000,
            sensor_defaults: Sensors {
                temperature: 25.0,
                pressure: 1013.0,
                humidity: 50.0,
            },
            synthetic: SyntheticSpec {
                temperature: Gaussian {
                    mean: 25.0,
                    std_dev: 5.0,
                },
                pressure: Gaussian {
                    mean: 1013.0,
                    std_dev: 10.0,
                },
                humidity: Gaussian {
                    mean: 50.0,
                    std_dev: 15.0,
                },
            },
            snapshot_key: SnapshotKey::Length,
        }
    }
}

impl InspectionConfig {
    pub fn with_estimators(mut self, estimators: NonZeroUsize) -> Self {
        self.estimators = estimators;
        self
    }

    /// `None` seeds every training from OS entropy, making it non reproducible.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn with_epochs(mut self, epochs: NonZeroUsize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_fallback_count(mut self, fallback_count: usize) -> Self {
        self.fallback_count = fallback_count;
        self
    }

    pub fn with_sensor_defaults(mut self, sensor_defaults: Sensors) -> Self {
        self.sensor_defaults = sensor_defaults;
        self
    }

    pub fn with_synthetic(mut self, synthetic: SyntheticSpec) -> Self {
        self.synthetic = synthetic;
        self
    }

    pub fn with_snapshot_key(mut self, snapshot_key: SnapshotKey) -> Self {
        self.snapshot_key = snapshot_key;
        self
    }

    pub fn estimators(&self) -> usize {
        self.estimators.get()
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Returns the amount of points of the reported training curve.
    pub fn epochs(&self) -> usize {
        self.epochs.get()
    }

    /// Returns the simulation size reported when no records are supplied.
    pub fn fallback_count(&self) -> usize {
        self.fallback_count
    }

    pub fn sensor_defaults(&self) -> Sensors {
        self.sensor_defaults
    }

    pub fn synthetic(&self) -> SyntheticSpec {
        self.synthetic
    }

    pub fn snapshot_key(&self) -> SnapshotKey {
        self.snapshot_key
    }

    /// Returns a classifier builder following this configuration.
    pub fn forest_builder(&self) -> ForestBuilder {
        ForestBuilder::new()
            .n_estimators(self.estimators)
            .max_depth(self.max_depth)
            .min_samples_split(self.min_samples_split)
            .seed(self.seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_key_parses() {
        assert_eq!("Length".parse::<SnapshotKey>().unwrap(), SnapshotKey::Length);
        assert_eq!(" content ".parse::<SnapshotKey>().unwrap(), SnapshotKey::Content);
        assert!("hash".parse::<SnapshotKey>().is_err());
    }

    #[test]
    fn defaults_match_the_service_contract() {
        let config = InspectionConfig::default();
        assert_eq!(config.estimators(), 100);
        assert_eq!(config.seed(), Some(42));
        assert_eq!(config.epochs(), 10);
        assert_eq!(config.fallback_count(), 1000);
        assert_eq!(config.snapshot_key(), SnapshotKey::Length);
    }
}
