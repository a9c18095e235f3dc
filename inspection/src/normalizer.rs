//! Turns heterogeneous input records into canonical numeric tables.
//!
//! Every candidate feature is coerced to a number, columns without a single numeric value are
//! dropped and the remaining gaps are filled with the median of the same record set. A dropped
//! column whose name hints at a time or date still provides the row timestamp when the row has no
//! dedicated timestamp column.

use std::{collections::HashMap, fmt};

use ndarray::Array2;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    error::{InspectError, Result},
    period::{self, DateRange},
    schema::{self, Column, FeatureSchema},
};

/// A record as supplied by the caller, arbitrary keys to scalar values in the supplied order.
pub type RawRecord = Map<String, Value>;

/// What a record set is going to be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Training,
    Testing,
    Simulation,
}

impl Role {
    fn is_labeled(self) -> bool {
        matches!(self, Role::Training | Role::Testing)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::Training => "training",
            Role::Testing => "testing",
            Role::Simulation => "simulation",
        };

        write!(f, "{s}")
    }
}

/// A record set after column canonicalization, numeric coercion and median imputation.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalTable {
    columns: Vec<String>,
    values: Array2<f64>,
    labels: Option<Vec<u8>>,
    timestamps: Vec<Option<String>>,
}

impl CanonicalTable {
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The retained numeric columns, in first-seen order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The response labels, only present for training and testing tables.
    pub fn labels(&self) -> Option<&[u8]> {
        self.labels.as_deref()
    }

    /// Returns the `idx`-th row (panics if out of bounds).
    pub fn row(&self, idx: usize) -> CanonicalRow<'_> {
        assert!(idx < self.len(), "row {idx} is out of bounds");
        CanonicalRow { table: self, idx }
    }

    /// Builds the feature matrix of this table laid out in `schema` order.
    ///
    /// # Arguments
    /// * `schema` - The columns and their order.
    ///
    /// # Returns
    /// A `(rows, schema.len())` matrix or `MissingColumn` if the table lacks a schema column.
    pub fn project(&self, schema: &FeatureSchema) -> Result<Array2<f64>> {
        let mut out = Array2::zeros((self.len(), schema.len()));

        for (dst, name) in schema.iter().enumerate() {
            let src = self.column_index(name).ok_or_else(|| InspectError::MissingColumn {
                column: name.to_string(),
            })?;

            out.column_mut(dst).assign(&self.values.column(src));
        }

        Ok(out)
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// A borrowed view over a single row of a `CanonicalTable`.
#[derive(Debug, Clone, Copy)]
pub struct CanonicalRow<'a> {
    table: &'a CanonicalTable,
    idx: usize,
}

impl<'a> CanonicalRow<'a> {
    /// Returns the value of a canonical column, if the table retained it.
    pub fn get(&self, name: &str) -> Option<f64> {
        let col = self.table.column_index(name)?;
        Some(self.table.values[[self.idx, col]])
    }

    /// Iterates over the `(column, value)` pairs of this row.
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        let table = self.table;
        let row = table.values.row(self.idx);
        table
            .columns
            .iter()
            .map(String::as_str)
            .zip(row.into_iter().copied())
    }

    pub fn timestamp(&self) -> Option<&'a str> {
        self.table.timestamps[self.idx].as_deref()
    }
}

/// Dataset level metadata of a record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub total_records: usize,
    pub total_columns: usize,
    pub pass_rate: f64,
    /// First and last day covered by the records' timestamps, if any parses.
    pub date_range: Option<DateRange>,
}

/// Normalizes a record set into a `CanonicalTable`.
///
/// # Arguments
/// * `records` - The raw records.
/// * `role` - Training and testing sets must carry a binary response and a numeric feature,
///   simulation sets are accepted as they come.
///
/// # Returns
/// The canonical table or a schema error.
pub fn normalize(records: &[RawRecord], role: Role) -> Result<CanonicalTable> {
    let mut columns: Vec<String> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut has_response = false;

    for record in records {
        for key in record.keys() {
            match schema::canonicalize(key) {
                Column::Response => has_response = true,
                Column::Feature(name) if !index.contains_key(&name) => {
                    index.insert(name.clone(), columns.len());
                    columns.push(name);
                }
                _ => {}
            }
        }
    }

    if role.is_labeled() && !has_response {
        return Err(InspectError::MissingResponse { role });
    }

    let temporal: Vec<bool> = columns.iter().map(|c| schema::is_temporal_hint(c)).collect();

    let mut cells: Vec<Vec<Option<f64>>> = Vec::with_capacity(records.len());
    let mut raw_labels: Vec<Option<&Value>> = Vec::with_capacity(records.len());
    let mut timestamps: Vec<Option<String>> = Vec::with_capacity(records.len());
    let mut hinted: Vec<Vec<(usize, String)>> = Vec::with_capacity(records.len());

    for record in records {
        let mut row: Vec<Option<f64>> = vec![None; columns.len()];
        let mut label: Option<&Value> = None;
        let mut timestamp: Option<String> = None;
        let mut hints: Vec<(usize, String)> = Vec::new();

        for (key, value) in record {
            match schema::canonicalize(key) {
                Column::Feature(name) => {
                    let col = index[&name];
                    if temporal[col] {
                        hints.extend(display_scalar(value).map(|s| (col, s)));
                    }

                    let cell = &mut row[col];
                    if cell.is_none() {
                        *cell = coerce(value);
                    }
                }
                Column::Response => {
                    if label.is_none_or(|l: &Value| l.is_null()) {
                        label = Some(value);
                    }
                }
                Column::Timestamp => {
                    if timestamp.is_none() {
                        timestamp = display_scalar(value);
                    }
                }
            }
        }

        cells.push(row);
        raw_labels.push(label);
        timestamps.push(timestamp);
        hinted.push(hints);
    }

    let retained: Vec<usize> = (0..columns.len())
        .filter(|&c| cells.iter().any(|row| row[c].is_some()))
        .collect();

    for (timestamp, hints) in timestamps.iter_mut().zip(hinted) {
        if timestamp.is_none() {
            *timestamp = hints
                .into_iter()
                .find(|(col, _)| !retained.contains(col))
                .map(|(_, s)| s);
        }
    }

    if role.is_labeled() && retained.is_empty() {
        return Err(InspectError::NoFeatures { role });
    }

    let mut values = Array2::zeros((records.len(), retained.len()));
    for (dst, &src) in retained.iter().enumerate() {
        let present: Vec<f64> = cells.iter().filter_map(|row| row[src]).collect();
        let fill = median(present);

        for (r, row) in cells.iter().enumerate() {
            values[[r, dst]] = row[src].unwrap_or(fill);
        }
    }

    let labels = if role.is_labeled() {
        Some(parse_labels(&raw_labels, role)?)
    } else {
        None
    };

    let columns = retained.into_iter().map(|c| columns[c].clone()).collect();

    Ok(CanonicalTable {
        columns,
        values,
        labels,
        timestamps,
    })
}

/// Normalizes a labeled record set and derives its feature schema.
pub fn normalize_labeled(
    records: &[RawRecord],
    role: Role,
) -> Result<(CanonicalTable, FeatureSchema)> {
    let table = normalize(records, role)?;
    let schema =
        FeatureSchema::new(table.columns().iter().cloned()).ok_or(InspectError::NoFeatures { role })?;

    Ok((table, schema))
}

/// Summarizes a record set the way an uploaded dataset is described.
///
/// The pass rate is the percentage of records whose response is `1`.
pub fn summarize(records: &[RawRecord]) -> DatasetSummary {
    let total_records = records.len();
    let total_columns = records.first().map_or(0, Map::len);

    let passes = records
        .iter()
        .filter(|record| {
            record
                .iter()
                .find(|(key, _)| schema::canonicalize(key) == Column::Response)
                .and_then(|(_, value)| coerce(value))
                == Some(1.0)
        })
        .count();

    let pass_rate = if total_records == 0 {
        0.0
    } else {
        passes as f64 / total_records as f64 * 100.0
    };

    let date_range = DateRange::spanning(records.iter().filter_map(record_timestamp));

    DatasetSummary {
        total_records,
        total_columns,
        pass_rate,
        date_range,
    }
}

/// The first timestamp-like value of a record that parses as a date.
fn record_timestamp(record: &RawRecord) -> Option<&str> {
    record
        .iter()
        .filter(|(key, _)| {
            schema::canonicalize(key) == Column::Timestamp || schema::is_temporal_hint(key)
        })
        .filter_map(|(_, value)| value.as_str())
        .find(|raw| period::parse_timestamp(raw).is_some())
}

/// Coerces a scalar to a finite number, anything that doesn't parse is missing.
pub fn coerce(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }?;

    n.is_finite().then_some(n)
}

fn display_scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn parse_labels(raw: &[Option<&Value>], role: Role) -> Result<Vec<u8>> {
    raw.iter()
        .copied()
        .enumerate()
        .map(|(row, value)| match value.and_then(coerce) {
            Some(v) if v == 0.0 => Ok(0),
            Some(v) if v == 1.0 => Ok(1),
            _ => Err(InspectError::InvalidLabel {
                role,
                row,
                value: value.map_or_else(|| "null".to_string(), |v| v.to_string()),
            }),
        })
        .collect()
}

/// Median of the given values, the mean of the two middle ones for even counts.
fn median(mut values: Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;

    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
