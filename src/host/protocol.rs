//! JSON lines wire format, one request per line in, one response per line out.

use inspection::{DateRange, ErrorKind, InspectError, RawRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    Train {
        training_records: Vec<RawRecord>,
        testing_records: Vec<RawRecord>,
        #[serde(default)]
        training_period: DateRange,
        #[serde(default)]
        testing_period: DateRange,
    },
    SimulationCount {
        #[serde(default)]
        simulation_period: DateRange,
        simulation_records: Option<Vec<RawRecord>>,
    },
    PredictNext {
        #[serde(default)]
        simulation_period: DateRange,
        simulation_records: Option<Vec<RawRecord>>,
    },
    Status,
    Reset,
    Summarize {
        records: Vec<RawRecord>,
    },
}

/// Error families on the wire, the service ones plus malformed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Schema,
    Training,
    ModelNotTrained,
    DataShape,
    Config,
    Request,
}

impl From<ErrorKind> for FailureKind {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Schema => Self::Schema,
            ErrorKind::Training => Self::Training,
            ErrorKind::ModelNotTrained => Self::ModelNotTrained,
            ErrorKind::DataShape => Self::DataShape,
            ErrorKind::Config => Self::Config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Response {
    Result(Value),
    Error(Failure),
}

impl Response {
    /// Serializes an operation's payload, `null` for operations without one.
    pub fn ok<T: Serialize>(payload: &T) -> serde_json::Result<Self> {
        Ok(Self::Result(serde_json::to_value(payload)?))
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Error(Failure {
            kind: FailureKind::Request,
            message: message.into(),
        })
    }
}

impl From<InspectError> for Response {
    fn from(e: InspectError) -> Self {
        Self::Error(Failure {
            kind: e.kind().into(),
            message: e.to_string(),
        })
    }
}
