use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::{Origin, SimulationDraw, now_timestamp};
use crate::{
    config::{Gaussian, Sensors, SyntheticSpec},
    error::{InspectError, Result},
};

/// Draws sensor readings from independent normal distributions.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticSensors {
    temperature: Normal<f64>,
    pressure: Normal<f64>,
    humidity: Normal<f64>,
}

impl SyntheticSensors {
    /// Creates a new `SyntheticSensors`.
    ///
    /// # Returns
    /// An error if any standard deviation is negative or not finite.
    pub fn new(spec: &SyntheticSpec) -> Result<Self> {
        Ok(Self {
            temperature: normal("temperature", spec.temperature)?,
            pressure: normal("pressure", spec.pressure)?,
            humidity: normal("humidity", spec.humidity)?,
        })
    }

    /// Draws a transient sample stamped with the current time.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SimulationDraw {
        SimulationDraw {
            origin: Origin::Synthetic,
            features: Vec::new(),
            sensors: Sensors {
                temperature: self.temperature.sample(rng),
                pressure: self.pressure.sample(rng),
                humidity: self.humidity.sample(rng),
            },
            timestamp: now_timestamp(),
        }
    }
}

fn normal(sensor: &str, g: Gaussian) -> Result<Normal<f64>> {
    Normal::new(g.mean, g.std_dev).map_err(|e| {
        InspectError::InvalidConfig(format!("synthetic {sensor} distribution: {e}"))
    })
}
