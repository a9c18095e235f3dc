use std::{
    error::Error,
    fmt::{self, Display},
};

use ndarray::ShapeError;

/// The result type used in the entire machine learning module.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The machine learning module's error type.
#[derive(Debug)]
pub enum MlErr {
    SizeMismatch {
        a: &'static str,
        b: &'static str,
        got: usize,
        expected: usize,
    },
    EmptyDataset,
    NoFeatures,
    InvalidLabel {
        index: usize,
        value: u8,
    },
    SingleClass {
        class: u8,
    },
    Shape(ShapeError),
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::SizeMismatch {
                a,
                b,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch between {a} and {b}, got {got} and expected {expected}"
            ),
            MlErr::EmptyDataset => write!(f, "The dataset has no samples"),
            MlErr::NoFeatures => write!(f, "The dataset has no feature columns"),
            MlErr::InvalidLabel { index, value } => write!(
                f,
                "The label at sample {index} is {value}, only binary labels (0 or 1) are supported"
            ),
            MlErr::SingleClass { class } => write!(
                f,
                "Every sample is labeled {class}, at least two classes are needed to fit a classifier"
            ),
            MlErr::Shape(e) => write!(f, "Invalid feature matrix shape: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Shape(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for MlErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}
