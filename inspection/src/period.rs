use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A period as the caller chose it, never interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Spans the earliest and latest parseable timestamps as `YYYY-MM-DD` dates.
    ///
    /// # Returns
    /// `None` if none of the values parses.
    pub fn spanning<'a, I>(timestamps: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (first, last) = timestamps
            .into_iter()
            .filter_map(parse_timestamp)
            .fold(None, |acc: Option<(NaiveDateTime, NaiveDateTime)>, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            })?;

        Some(Self::new(
            first.format(DATE_FORMAT).to_string(),
            last.format(DATE_FORMAT).to_string(),
        ))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Parses RFC 3339, `YYYY-MM-DD[ T]HH:MM:SS[.f]` and plain `YYYY-MM-DD` timestamps.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_timestamp_accepts_common_layouts() {
        assert!(parse_timestamp("2021-01-01 00:00:00").is_some());
        assert!(parse_timestamp("2021-01-01T10:30:00").is_some());
        assert!(parse_timestamp("2021-01-01T10:30:00Z").is_some());
        assert!(parse_timestamp("2021-01-01").is_some());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("42").is_none());
    }

    #[test]
    fn spanning_uses_the_extremes() {
        let range = DateRange::spanning([
            "2021-03-04 10:00:00",
            "not a date",
            "2021-01-02 23:59:59",
            "2021-02-01",
        ])
        .unwrap();

        assert_eq!(range, DateRange::new("2021-01-02", "2021-03-04"));
        assert_eq!(DateRange::spanning(["nope"]), None);
    }
}
