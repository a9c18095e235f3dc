use std::{env, num::NonZeroUsize};

use anyhow::{Context, Result, bail};
use inspection::{InspectionConfig, SnapshotKey};

pub const ESTIMATORS: &str = "INSPECT_ESTIMATORS";
pub const SEED: &str = "INSPECT_SEED";
pub const MAX_DEPTH: &str = "INSPECT_MAX_DEPTH";
pub const SNAPSHOT_KEY: &str = "INSPECT_SNAPSHOT_KEY";

/// Builds the service configuration from the process environment.
pub fn from_env() -> Result<InspectionConfig> {
    from_lookup(|key| env::var(key).ok())
}

/// Builds the service configuration from `lookup`, unset keys keep their defaults.
///
/// # Arguments
/// * `lookup` - Resolves a variable name to its value, if set.
///
/// # Returns
/// The configuration or an error naming the offending variable.
pub fn from_lookup<F>(lookup: F) -> Result<InspectionConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = InspectionConfig::default();

    if let Some(raw) = lookup(ESTIMATORS) {
        let n: usize = raw
            .trim()
            .parse()
            .with_context(|| format!("{ESTIMATORS}={raw:?} is not a number"))?;
        let Some(n) = NonZeroUsize::new(n) else {
            bail!("{ESTIMATORS} must be greater than zero");
        };

        config = config.with_estimators(n);
    }

    if let Some(raw) = lookup(SEED) {
        let seed = match raw.trim() {
            "none" => None,
            s => Some(
                s.parse()
                    .with_context(|| format!("{SEED}={raw:?} is neither a number nor none"))?,
            ),
        };

        config = config.with_seed(seed);
    }

    if let Some(raw) = lookup(MAX_DEPTH) {
        let depth = raw
            .trim()
            .parse()
            .with_context(|| format!("{MAX_DEPTH}={raw:?} is not a number"))?;

        config = config.with_max_depth(Some(depth));
    }

    if let Some(raw) = lookup(SNAPSHOT_KEY) {
        let key: SnapshotKey = raw.parse().with_context(|| format!("invalid {SNAPSHOT_KEY}"))?;
        config = config.with_snapshot_key(key);
    }

    Ok(config)
}
