use log::{debug, info};
use machine_learning::{ConfusionMatrix, Dataset};
use serde::Serialize;

use crate::{
    config::InspectionConfig,
    error::{InspectError, Result},
    normalizer::{CanonicalTable, Role},
    registry::TrainedModel,
    schema::FeatureSchema,
};

const LOSS_START: f64 = 1.0;
const LOSS_STEP: f64 = 0.08;
const LOSS_FLOOR: f64 = 0.1;

/// Confusion counts of the testing evaluation, class `1` being the positive one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfusionCounts {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl From<ConfusionMatrix> for ConfusionCounts {
    fn from(cm: ConfusionMatrix) -> Self {
        Self {
            true_positives: cm.true_positives,
            true_negatives: cm.true_negatives,
            false_positives: cm.false_positives,
            false_negatives: cm.false_negatives,
        }
    }
}

impl ConfusionCounts {
    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }
}

/// What a training run reports, percentages in `[0, 100]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub training_loss: Vec<f64>,
    pub training_accuracy: Vec<f64>,
    pub epochs: Vec<u32>,
    pub confusion_matrix: ConfusionCounts,
}

/// Fits a classifier on the training table and evaluates it on the testing table.
///
/// The forest is fitted once. The reported curve has one point per configured epoch, the loss
/// decays linearly down to a floor and the accuracy is the fitted model re-scored on its own
/// training set.
///
/// # Arguments
/// * `config` - The classifier settings.
/// * `training` - The normalized training table.
/// * `testing` - The normalized testing table, projected onto `schema` before scoring.
/// * `schema` - The training table's feature schema.
///
/// # Returns
/// The trained model together with its metrics, or a training error.
pub fn train(
    config: &InspectionConfig,
    training: &CanonicalTable,
    testing: &CanonicalTable,
    schema: FeatureSchema,
) -> Result<(TrainedModel, TrainingMetrics)> {
    let train_set = labeled_dataset(training, &schema, Role::Training)?;
    let test_set = labeled_dataset(testing, &schema, Role::Testing)?;

    debug!(
        "fitting {} trees on {} records, features={schema}",
        config.estimators(),
        train_set.len()
    );

    let forest = config.forest_builder().fit(&train_set)?;

    let train_pred = forest.predict(train_set.x())?;
    let training_accuracy = ConfusionMatrix::from_labels(train_set.y(), &train_pred)?.accuracy();

    let test_pred = forest.predict(test_set.x())?;
    let cm = ConfusionMatrix::from_labels(test_set.y(), &test_pred)?;

    let epochs = config.epochs();
    let metrics = TrainingMetrics {
        accuracy: cm.accuracy() * 100.0,
        precision: cm.precision() * 100.0,
        recall: cm.recall() * 100.0,
        f1_score: cm.f1() * 100.0,
        training_loss: (1..=epochs).map(loss_at).collect(),
        training_accuracy: vec![training_accuracy * 100.0; epochs],
        epochs: (1..=epochs as u32).collect(),
        confusion_matrix: cm.into(),
    };

    info!(
        "training finished: accuracy={:.2}, f1={:.2}, test records={}",
        metrics.accuracy,
        metrics.f1_score,
        test_set.len()
    );

    Ok((TrainedModel::new(forest, schema), metrics))
}

fn labeled_dataset(table: &CanonicalTable, schema: &FeatureSchema, role: Role) -> Result<Dataset> {
    if table.is_empty() {
        return Err(InspectError::EmptySet { role });
    }

    let labels = table
        .labels()
        .ok_or(InspectError::MissingResponse { role })?
        .to_vec();

    Ok(Dataset::new(table.project(schema)?, labels)?)
}

fn loss_at(epoch: usize) -> f64 {
    (LOSS_START - LOSS_STEP * epoch as f64).max(LOSS_FLOOR)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use machine_learning::MlErr;
    use serde_json::{Value, json};

    use super::*;
    use crate::normalizer::{self, RawRecord};

    fn records(values: Value) -> Vec<RawRecord> {
        serde_json::from_value(values).unwrap()
    }

    fn config() -> InspectionConfig {
        InspectionConfig::default().with_estimators(NonZeroUsize::new(15).unwrap())
    }

    fn tables(train: Value, test: Value) -> (CanonicalTable, CanonicalTable, FeatureSchema) {
        let (training, schema) =
            normalizer::normalize_labeled(&records(train), Role::Training).unwrap();
        let testing = normalizer::normalize(&records(test), Role::Testing).unwrap();
        (training, testing, schema)
    }

    #[test]
    fn loss_decays_to_the_floor() {
        assert!((loss_at(1) - 0.92).abs() < 1e-12);
        assert!((loss_at(10) - 0.2).abs() < 1e-12);
        assert_eq!(loss_at(12), LOSS_FLOOR);
        assert_eq!(loss_at(40), LOSS_FLOOR);
    }

    #[test]
    fn train_reports_a_full_curve_and_counts() {
        let (training, testing, schema) = tables(
            json!([
                { "Temperature": 10, "Response": 1 },
                { "Temperature": 11, "Response": 1 },
                { "Temperature": 12, "Response": 1 },
                { "Temperature": 13, "Response": 1 },
                { "Temperature": 14, "Response": 1 },
                { "Temperature": 40, "Response": 0 },
                { "Temperature": 41, "Response": 0 },
                { "Temperature": 42, "Response": 0 },
                { "Temperature": 43, "Response": 0 },
                { "Temperature": 44, "Response": 0 },
            ]),
            json!([
                { "Temperature": 9, "Response": 1 },
                { "Temperature": 12.5, "Response": 1 },
                { "Temperature": 45, "Response": 0 },
                { "Temperature": 39, "Response": 0 },
                { "Temperature": 42.5, "Response": 0 },
            ]),
        );

        let (model, metrics) = train(&config(), &training, &testing, schema).unwrap();

        assert_eq!(model.n_estimators(), 15);
        assert_eq!(metrics.epochs, (1..=10).collect::<Vec<u32>>());
        assert_eq!(metrics.training_loss.len(), 10);
        assert_eq!(metrics.training_accuracy, vec![100.0; 10]);
        assert_eq!(metrics.confusion_matrix.total(), 5);
        assert_eq!(metrics.accuracy, 100.0);
    }

    #[test]
    fn train_rejects_a_single_class() {
        let (training, testing, schema) = tables(
            json!([
                { "Temperature": 10, "Response": 1 },
                { "Temperature": 11, "Response": 1 },
            ]),
            json!([{ "Temperature": 10, "Response": 0 }]),
        );

        let res = train(&config(), &training, &testing, schema);
        assert!(matches!(
            res,
            Err(InspectError::Fit(MlErr::SingleClass { class: 1 }))
        ));
    }

    #[test]
    fn train_requires_the_schema_in_the_testing_set() {
        let (training, testing, schema) = tables(
            json!([
                { "Temperature": 10, "Pressure": 1000, "Response": 1 },
                { "Temperature": 40, "Pressure": 1010, "Response": 0 },
            ]),
            json!([{ "Temperature": 10, "Response": 0 }]),
        );

        let res = train(&config(), &training, &testing, schema);
        assert!(matches!(res, Err(InspectError::MissingColumn { column }) if column == "Pressure"));
    }
}
