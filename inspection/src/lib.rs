//! Quality inspection core: record normalization, random forest training, a process wide model
//! registry and a replaying simulation cursor feeding predictions.

pub mod config;
pub mod error;
pub mod normalizer;
pub mod period;
pub mod prediction;
pub mod registry;
pub mod schema;
pub mod service;
pub mod simulation;
pub mod training;

pub use config::{InspectionConfig, SnapshotKey};
pub use error::{ErrorKind, InspectError, Result};
pub use normalizer::{DatasetSummary, RawRecord};
pub use period::DateRange;
pub use prediction::{PredictionResult, Verdict};
pub use service::{InspectionService, SimulationCount, Status};
pub use training::{ConfusionCounts, TrainingMetrics};
