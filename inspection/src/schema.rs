use std::fmt;

pub const RESPONSE: &str = "Response";
pub const TEMPERATURE: &str = "Temperature";
pub const PRESSURE: &str = "Pressure";
pub const HUMIDITY: &str = "Humidity";

/// Lower-cased substrings and the canonical feature they stand for, checked in order after the
/// response alias.
const SENSOR_ALIASES: [(&str, &str); 3] = [
    ("temp", TEMPERATURE),
    ("pressure", PRESSURE),
    ("humidity", HUMIDITY),
];

/// Substrings that always mark a timestamp column.
const TIMESTAMP_TOKENS: [&str; 2] = ["timestamp", "datetime"];
/// Whole names that mark a timestamp column.
const TIMESTAMP_NAMES: [&str; 2] = ["time", "date"];
/// Substrings of columns that may hold timestamps, only treated as such when not numeric.
const TEMPORAL_HINTS: [&str; 2] = ["time", "date"];

/// The canonical identity of an input column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    /// The binary pass/fail label.
    Response,
    /// A numeric feature candidate, either a recognized sensor or a pass-through column.
    Feature(String),
    /// A timestamp-like column, never a feature, only echoed back.
    Timestamp,
}

/// Maps an arbitrary column name to its canonical identity.
///
/// Matching is case-insensitive, the first matching alias wins: `response`, `temp`, `pressure`,
/// `humidity` as substrings, then timestamps for names containing `timestamp`/`datetime` or named
/// exactly `time`/`date`. Anything else passes through under its original name, so numeric columns
/// such as `CycleTime` stay features.
pub fn canonicalize(name: &str) -> Column {
    let lower = name.to_lowercase();

    if lower.contains("response") {
        return Column::Response;
    }

    if let Some((_, canonical)) = SENSOR_ALIASES.iter().find(|(alias, _)| lower.contains(alias)) {
        return Column::Feature((*canonical).to_string());
    }

    if TIMESTAMP_TOKENS.iter().any(|token| lower.contains(token))
        || TIMESTAMP_NAMES.contains(&lower.as_str())
    {
        return Column::Timestamp;
    }

    Column::Feature(name.to_string())
}

/// Whether a pass-through column's name suggests it may carry timestamps.
///
/// Such a column is echoed as the row timestamp only when none of its values is numeric.
pub fn is_temporal_hint(name: &str) -> bool {
    let lower = name.to_lowercase();
    TEMPORAL_HINTS.iter().any(|hint| lower.contains(hint))
}

/// The ordered feature columns a model was trained with.
///
/// Never empty and never repeats a name. Feature vectors must follow this exact order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema(Vec<String>);

impl FeatureSchema {
    /// Creates a new `FeatureSchema`, dropping repeated names.
    ///
    /// # Returns
    /// `None` if there are no columns.
    pub fn new<I, S>(columns: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut names: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if !names.contains(&column) {
                names.push(column);
            }
        }

        (!names.is_empty()).then_some(Self(names))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|c| c == name)
    }
}

impl fmt::Display for FeatureSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalize_recognizes_sensor_aliases() {
        assert_eq!(canonicalize("temp_c"), Column::Feature(TEMPERATURE.into()));
        assert_eq!(canonicalize("AirTemperature"), Column::Feature(TEMPERATURE.into()));
        assert_eq!(canonicalize("PRESSURE_hpa"), Column::Feature(PRESSURE.into()));
        assert_eq!(canonicalize("rel_humidity"), Column::Feature(HUMIDITY.into()));
    }

    #[test]
    fn canonicalize_recognizes_response_first() {
        assert_eq!(canonicalize("Response"), Column::Response);
        assert_eq!(canonicalize("temp_response"), Column::Response);
    }

    #[test]
    fn canonicalize_flags_timestamps() {
        assert_eq!(canonicalize("synthetic_timestamp"), Column::Timestamp);
        assert_eq!(canonicalize("Date"), Column::Timestamp);
    }

    #[test]
    fn canonicalize_keeps_time_like_measurements_as_features() {
        assert_eq!(canonicalize("CycleTime"), Column::Feature("CycleTime".into()));
        assert_eq!(canonicalize("UpdateCount"), Column::Feature("UpdateCount".into()));
        assert_eq!(canonicalize("Runtime"), Column::Feature("Runtime".into()));
        assert_eq!(canonicalize("Validated"), Column::Feature("Validated".into()));
        assert_eq!(canonicalize("TIME"), Column::Timestamp);
        assert_eq!(canonicalize("created_datetime"), Column::Timestamp);

        assert!(is_temporal_hint("CycleTime"));
        assert!(is_temporal_hint("UpdateCount"));
        assert!(!is_temporal_hint("Vibration"));
    }

    #[test]
    fn canonicalize_passes_unknown_columns_through() {
        assert_eq!(canonicalize("Vibration"), Column::Feature("Vibration".into()));
    }

    #[test]
    fn schema_dedups_and_rejects_empty() {
        let schema = FeatureSchema::new([TEMPERATURE, PRESSURE, TEMPERATURE]).unwrap();
        assert_eq!(schema.names(), [TEMPERATURE, PRESSURE]);
        assert_eq!(schema.position(PRESSURE), Some(1));
        assert!(FeatureSchema::new(Vec::<String>::new()).is_none());
    }
}
