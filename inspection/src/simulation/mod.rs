mod cursor;
mod synthetic;

pub use cursor::SimulationCursor;
pub use synthetic::SyntheticSensors;

use crate::{
    config::Sensors,
    error::{InspectError, Result},
    schema::{HUMIDITY, PRESSURE, TEMPERATURE},
};

/// Where a simulation sample came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// The `index`-th row of the replayed snapshot.
    Snapshot { index: usize },
    /// Randomly drawn, no snapshot available.
    Synthetic,
}

/// One sample handed to the prediction engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationDraw {
    pub origin: Origin,
    pub features: Vec<(String, f64)>,
    pub sensors: Sensors,
    pub timestamp: String,
}

impl SimulationDraw {
    /// Builds the feature vector of this sample laid out in `schema` order.
    ///
    /// Temperature, pressure and humidity always resolve, falling back to the echoed sensor
    /// values. Any other schema feature must be present in the sample.
    ///
    /// # Arguments
    /// * `schema` - The feature names, in order.
    ///
    /// # Returns
    /// The feature vector or `MissingFeature` for the first unresolved feature.
    pub fn feature_vector<'a, I>(&self, schema: I) -> Result<Vec<f64>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        schema
            .into_iter()
            .map(|name| {
                if let Some((_, value)) = self.features.iter().find(|(n, _)| n == name) {
                    return Ok(*value);
                }

                match name {
                    TEMPERATURE => Ok(self.sensors.temperature),
                    PRESSURE => Ok(self.sensors.pressure),
                    HUMIDITY => Ok(self.sensors.humidity),
                    _ => Err(InspectError::MissingFeature {
                        feature: name.to_string(),
                    }),
                }
            })
            .collect()
    }
}

/// Wall-clock time formatted as `YYYY-MM-DD HH:MM:SS`.
pub fn now_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_vector_follows_schema_and_falls_back_to_sensors() {
        let draw = SimulationDraw {
            origin: Origin::Snapshot { index: 0 },
            features: vec![("Vibration".into(), 0.3), (TEMPERATURE.into(), 31.0)],
            sensors: Sensors {
                temperature: 31.0,
                pressure: 1013.0,
                humidity: 50.0,
            },
            timestamp: now_timestamp(),
        };

        let v = draw
            .feature_vector([PRESSURE, "Vibration", TEMPERATURE])
            .unwrap();
        assert_eq!(v, vec![1013.0, 0.3, 31.0]);

        let res = draw.feature_vector(["Torque"]);
        assert!(matches!(res, Err(InspectError::MissingFeature { feature }) if feature == "Torque"));
    }

    #[test]
    fn timestamp_has_the_expected_layout() {
        let ts = now_timestamp();
        assert_eq!(ts.len(), 19);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
    }
}
