// src/alignment/date.rs
//
// Timestamp parsing and right-open interval binning for date-keyed products.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d-%b-%Y", "%B %d, %Y", "%b %d, %Y"];

/// Parses the timestamp shapes found in review exports and release logs.
///
/// Offsets are converted to UTC and dropped. Date-only values map to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Sorted, de-duplicated release instants. Bucket `i` is `[edges[i], edges[i + 1])`
/// and the last bucket is unbounded.
#[derive(Debug, Clone, Default)]
pub struct DateBinner {
    edges: Vec<NaiveDateTime>,
}

impl DateBinner {
    pub fn new(instants: impl IntoIterator<Item = NaiveDateTime>) -> Self {
        let mut edges: Vec<NaiveDateTime> = instants.into_iter().collect();
        edges.sort();
        edges.dedup();
        Self { edges }
    }

    pub fn edges(&self) -> &[NaiveDateTime] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Start of the interval containing `at`, or `None` if `at` predates every edge.
    pub fn bin(&self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let idx = self.edges.partition_point(|edge| *edge <= at);
        idx.checked_sub(1).map(|i| self.edges[i])
    }
}
