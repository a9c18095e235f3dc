use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    config::InspectionConfig,
    error::{InspectError, Result},
    normalizer::{self, DatasetSummary, RawRecord, Role},
    period::DateRange,
    prediction::{self, PredictionResult},
    registry::ModelRegistry,
    simulation::SimulationCursor,
    training::{self, TrainingMetrics},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationCount {
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    pub model_trained: bool,
    pub feature_schema: Option<Vec<String>>,
    pub estimators: Option<usize>,
    pub snapshot_length: Option<usize>,
    pub cursor_index: Option<usize>,
}

/// The inspection service, owning the active model and the simulation cursor.
///
/// Every operation takes `&self`, the registry and the cursor synchronize internally so the
/// service can be shared across threads.
#[derive(Debug)]
pub struct InspectionService {
    config: InspectionConfig,
    registry: ModelRegistry,
    cursor: SimulationCursor,
}

impl InspectionService {
    /// Creates a new untrained `InspectionService`.
    ///
    /// # Returns
    /// An error if the configuration can't be used.
    pub fn new(config: InspectionConfig) -> Result<Self> {
        let cursor = SimulationCursor::new(&config)?;

        Ok(Self {
            config,
            registry: ModelRegistry::new(),
            cursor,
        })
    }

    pub fn config(&self) -> &InspectionConfig {
        &self.config
    }

    /// Trains a new model and publishes it.
    ///
    /// A failure leaves the previously active model, if any, in place.
    ///
    /// # Arguments
    /// * `training` - The labeled training records.
    /// * `testing` - The labeled testing records.
    /// * `training_period` - Where the training records come from, only logged.
    /// * `testing_period` - Where the testing records come from, only logged.
    ///
    /// # Returns
    /// The training metrics, a schema error or a training error.
    pub fn train(
        &self,
        training: &[RawRecord],
        testing: &[RawRecord],
        training_period: &DateRange,
        testing_period: &DateRange,
    ) -> Result<TrainingMetrics> {
        info!(
            training_records = training.len(),
            testing_records = testing.len();
            "training requested: training={training_period}, testing={testing_period}"
        );

        let res = self.fit(training, testing);
        if let Err(e) = &res {
            warn!("training failed: {e}");
        }

        res
    }

    fn fit(&self, training: &[RawRecord], testing: &[RawRecord]) -> Result<TrainingMetrics> {
        if training.is_empty() {
            return Err(InspectError::EmptySet {
                role: Role::Training,
            });
        }

        if testing.is_empty() {
            return Err(InspectError::EmptySet {
                role: Role::Testing,
            });
        }

        let (training, schema) = normalizer::normalize_labeled(training, Role::Training)?;
        let testing = normalizer::normalize(testing, Role::Testing)?;

        let (model, metrics) = training::train(&self.config, &training, &testing, schema)?;
        let model = self.registry.publish(model);
        info!("model published, features={}", model.schema());

        Ok(metrics)
    }

    /// Returns how many records the simulation will go through.
    pub fn simulation_count(
        &self,
        period: &DateRange,
        records: Option<&[RawRecord]>,
    ) -> SimulationCount {
        let total_records = self.cursor.count(records);
        info!("simulation count for {period}: {total_records}");

        SimulationCount { total_records }
    }

    /// Classifies the next simulation sample with the active model.
    ///
    /// # Arguments
    /// * `period` - The simulation period, only logged.
    /// * `records` - The simulation records, replacing the replayed set when they differ from it.
    ///
    /// # Returns
    /// The prediction, `ModelNotTrained` before any successful training or a data shape error.
    /// The cursor only moves on success.
    pub fn predict_next(
        &self,
        period: &DateRange,
        records: Option<&[RawRecord]>,
    ) -> Result<PredictionResult> {
        let model = self.registry.current().ok_or(InspectError::ModelNotTrained)?;
        debug!("predicting next sample of {period}");

        self.cursor
            .next_with(records, |draw| prediction::predict(&model, draw))
            .inspect_err(|e| warn!("prediction failed: {e}"))
    }

    pub fn status(&self) -> Status {
        let model = self.registry.current();
        let position = self.cursor.position();

        Status {
            model_trained: model.is_some(),
            feature_schema: model.as_ref().map(|m| m.schema().names().to_vec()),
            estimators: model.as_ref().map(|m| m.n_estimators()),
            snapshot_length: position.map(|(_, len)| len),
            cursor_index: position.map(|(idx, _)| idx),
        }
    }

    /// Drops the active model and the simulation snapshot.
    pub fn reset(&self) {
        self.registry.clear();
        self.cursor.reset();
        info!("inspection state reset");
    }

    /// Describes a record set the way an uploaded dataset is reported.
    pub fn summarize(&self, records: &[RawRecord]) -> DatasetSummary {
        normalizer::summarize(records)
    }
}
