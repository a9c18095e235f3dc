use std::fmt;

use log::info;
use serde::Serialize;
use uuid::Uuid;

use crate::{error::Result, registry::TrainedModel, simulation::SimulationDraw};

const PASS_THRESHOLD: f64 = 0.5;
const SAMPLE_ID_PREFIX: &str = "SAMPLE_";
const SAMPLE_ID_LEN: usize = 8;

/// The inspection outcome of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "Pass"),
            Verdict::Fail => write!(f, "Fail"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub timestamp: String,
    pub sample_id: String,
    pub prediction: Verdict,
    /// The winning class probability, in `[0, 100]`.
    pub confidence: f64,
    pub temperature: f64,
    pub pressure: f64,
    pub humidity: f64,
}

/// Classifies a simulation sample with `model`.
///
/// # Arguments
/// * `model` - The active model.
/// * `draw` - The sample, its features are laid out following the model's schema.
///
/// # Returns
/// The labeled result or a data shape error if the feature vector can't be built.
pub fn predict(model: &TrainedModel, draw: SimulationDraw) -> Result<PredictionResult> {
    let features = draw.feature_vector(model.schema().iter())?;
    let [p0, p1] = model.predict_proba(&features)?;

    let prediction = if p1 > PASS_THRESHOLD {
        Verdict::Pass
    } else {
        Verdict::Fail
    };

    let result = PredictionResult {
        timestamp: draw.timestamp,
        sample_id: sample_id(),
        prediction,
        confidence: p0.max(p1) * 100.0,
        temperature: draw.sensors.temperature,
        pressure: draw.sensors.pressure,
        humidity: draw.sensors.humidity,
    };

    info!(
        "{} predicted {} with {:.1}% confidence",
        result.sample_id, result.prediction, result.confidence
    );

    Ok(result)
}

/// A fresh `SAMPLE_XXXXXXXX` identifier, unique with high probability.
fn sample_id() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{SAMPLE_ID_PREFIX}{}", &hex[..SAMPLE_ID_LEN])
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use machine_learning::{Dataset, ForestBuilder};

    use super::*;
    use crate::{
        config::Sensors,
        error::InspectError,
        schema::{FeatureSchema, PRESSURE, TEMPERATURE},
        simulation::Origin,
    };

    fn model() -> TrainedModel {
        let data = vec![
            10.0, 1013.0, //
            11.0, 1013.0, //
            12.0, 1013.0, //
            40.0, 1013.0, //
            41.0, 1013.0, //
            42.0, 1013.0,
        ];
        let dataset = Dataset::from_flat(data, 2, vec![1, 1, 1, 0, 0, 0]).unwrap();
        let forest = ForestBuilder::new()
            .n_estimators(NonZeroUsize::new(10).unwrap())
            .seed(Some(7))
            .fit(&dataset)
            .unwrap();

        TrainedModel::new(forest, FeatureSchema::new([TEMPERATURE, PRESSURE]).unwrap())
    }

    fn draw(temperature: f64, features: Vec<(String, f64)>) -> SimulationDraw {
        SimulationDraw {
            origin: Origin::Snapshot { index: 0 },
            features,
            sensors: Sensors {
                temperature,
                pressure: 1013.0,
                humidity: 50.0,
            },
            timestamp: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn predict_labels_and_echoes_the_sample() {
        let model = model();

        let res = predict(&model, draw(11.0, vec![(TEMPERATURE.into(), 11.0)])).unwrap();

        assert_eq!(res.prediction, Verdict::Pass);
        assert!(res.confidence > 50.0 && res.confidence <= 100.0);
        assert_eq!(res.timestamp, "2024-01-01 00:00:00");
        assert_eq!(res.pressure, 1013.0);

        let res = predict(&model, draw(41.0, Vec::new())).unwrap();
        assert_eq!(res.prediction, Verdict::Fail);
    }

    #[test]
    fn predict_reports_unresolvable_features() {
        let forest = ForestBuilder::new()
            .n_estimators(NonZeroUsize::new(2).unwrap())
            .seed(Some(0))
            .fit(&Dataset::from_flat(vec![0.0, 1.0], 1, vec![0, 1]).unwrap())
            .unwrap();
        let model = TrainedModel::new(forest, FeatureSchema::new(["Vibration"]).unwrap());

        let res = predict(&model, draw(20.0, Vec::new()));
        assert!(matches!(res, Err(InspectError::MissingFeature { .. })));
    }

    #[test]
    fn sample_ids_are_prefixed_upper_hex() {
        let id = sample_id();
        assert_eq!(id.len(), SAMPLE_ID_PREFIX.len() + SAMPLE_ID_LEN);
        assert!(id.starts_with(SAMPLE_ID_PREFIX));
        assert!(
            id[SAMPLE_ID_PREFIX.len()..]
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
        assert_ne!(id, sample_id());
    }
}
