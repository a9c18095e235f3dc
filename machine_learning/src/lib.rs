pub mod dataset;
pub mod error;
pub mod forest;
pub mod metrics;

pub use dataset::Dataset;
pub use error::{MlErr, Result};
pub use forest::{ForestBuilder, RandomForest};
pub use metrics::ConfusionMatrix;
