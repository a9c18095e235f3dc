use std::{error::Error, fmt};

use machine_learning::MlErr;
use serde::Serialize;

use crate::normalizer::Role;

/// The inspection module's result type.
pub type Result<T> = std::result::Result<T, InspectError>;

/// The coarse error families surfaced at the service boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    Schema,
    Training,
    ModelNotTrained,
    DataShape,
    Config,
}

/// Inspection service failures.
#[derive(Debug)]
pub enum InspectError {
    /// No column of the record set maps to the response label.
    MissingResponse { role: Role },
    /// No column of the record set has a single numeric value.
    NoFeatures { role: Role },
    /// A response value is missing or isn't `0`/`1`.
    InvalidLabel {
        role: Role,
        row: usize,
        value: String,
    },
    /// A training or testing set without records.
    EmptySet { role: Role },
    /// The testing set lacks a column the model is trained on.
    MissingColumn { column: String },
    /// The classifier rejected the data.
    Fit(MlErr),
    /// A prediction was requested before any successful training.
    ModelNotTrained,
    /// A feature of the active schema can't be resolved for the current sample.
    MissingFeature { feature: String },
    /// A feature vector's length differs from the active schema.
    FeatureCount { got: usize, expected: usize },
    /// The configuration can't be used as is.
    InvalidConfig(String),
}

impl InspectError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingResponse { .. } | Self::NoFeatures { .. } | Self::InvalidLabel { .. } => {
                ErrorKind::Schema
            }
            Self::EmptySet { .. } | Self::MissingColumn { .. } | Self::Fit(_) => {
                ErrorKind::Training
            }
            Self::ModelNotTrained => ErrorKind::ModelNotTrained,
            Self::MissingFeature { .. } | Self::FeatureCount { .. } => ErrorKind::DataShape,
            Self::InvalidConfig(_) => ErrorKind::Config,
        }
    }
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingResponse { role } => {
                write!(f, "the {role} records have no response column")
            }
            Self::NoFeatures { role } => {
                write!(f, "the {role} records have no usable numeric feature")
            }
            Self::InvalidLabel { role, row, value } => write!(
                f,
                "the {role} record {row} has response {value}, expected 0 or 1"
            ),
            Self::EmptySet { role } => write!(f, "the {role} set has no records"),
            Self::MissingColumn { column } => {
                write!(f, "the testing records lack the trained feature {column}")
            }
            Self::Fit(e) => write!(f, "training failed: {e}"),
            Self::ModelNotTrained => {
                write!(f, "model not trained, please train the model first")
            }
            Self::MissingFeature { feature } => {
                write!(f, "the simulation sample has no value for feature {feature}")
            }
            Self::FeatureCount { got, expected } => write!(
                f,
                "feature vector has {got} values, the model expects {expected}"
            ),
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl Error for InspectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Fit(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MlErr> for InspectError {
    fn from(value: MlErr) -> Self {
        Self::Fit(value)
    }
}
