// src/models/cluster.rs

use chrono::{NaiveDateTime, Timelike};
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

use crate::models::review::ReviewId;

/// A cleaned version string such as `"51.01"` or `"43.5.0"`.
///
/// Ordering is numeric by dot-separated component, so `"9.0" < "10.0"` and
/// `"5.3" < "5.3.1"`. Keys with non-numeric parts sort after every numeric key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionKey(String);

impl VersionKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric_parts(&self) -> Option<Vec<u64>> {
        self.0.split('.').map(|p| p.parse::<u64>().ok()).collect()
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric_parts(), other.numeric_parts()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies the release a review is attributed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BucketKey {
    /// Exact match on a cleaned version string.
    Version(VersionKey),
    /// Start of the half-open interval `[release, next release)`.
    Released(NaiveDateTime),
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Version(v) => write!(f, "{}", v),
            BucketKey::Released(at) => {
                if at.time().num_seconds_from_midnight() == 0 && at.time().nanosecond() == 0 {
                    write!(f, "{}", at.format("%Y-%m-%d"))
                } else {
                    write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S"))
                }
            }
        }
    }
}

/// Per-review result of a clustering pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterAssignment {
    Member(usize),
    /// Noise point: not part of any dense group.
    Outlier,
}

impl ClusterAssignment {
    pub fn cluster_id(&self) -> Option<usize> {
        match self {
            ClusterAssignment::Member(id) => Some(*id),
            ClusterAssignment::Outlier => None,
        }
    }
}

/// An accepted theme within one bucket. Only built once the group has passed the
/// size check and its label has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub bucket_key: BucketKey,
    pub cluster_id: usize,
    pub member_ids: Vec<ReviewId>,
    pub label: String,
    /// Mean rating over all members; `None` if no member carries a rating.
    pub avg_rating: Option<f64>,
    pub size: usize,
}

/// One row of the cluster summary table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterSummaryRecord {
    pub version: String,
    pub cluster_id: usize,
    pub cluster_label: String,
    pub num_reviews: usize,
    pub avg_score: Option<f64>,
}

impl From<&Cluster> for ClusterSummaryRecord {
    fn from(cluster: &Cluster) -> Self {
        Self {
            version: cluster.bucket_key.to_string(),
            cluster_id: cluster.cluster_id,
            cluster_label: cluster.label.clone(),
            num_reviews: cluster.size,
            avg_score: cluster.avg_rating,
        }
    }
}

/// One row of the labeled-reviews table: the original columns plus cluster info.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledReviewRecord {
    pub review_id: ReviewId,
    pub original_values: Vec<String>,
    pub clean_version: String,
    pub cluster_id: usize,
    pub cluster_label: String,
}

/// Columns appended after the original review columns.
pub const LABELED_REVIEW_EXTRA_COLUMNS: [&str; 3] = ["clean_version", "cluster", "cluster_label"];

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_version_key_numeric_ordering() {
        let mut keys: Vec<VersionKey> = ["10.0", "9.0", "5.3.1", "5.3", "beta"]
            .iter()
            .map(|s| VersionKey::new(*s))
            .collect();
        keys.sort();
        let sorted: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        assert_eq!(sorted, vec!["5.3", "5.3.1", "9.0", "10.0", "beta"]);
    }

    #[test]
    fn test_version_key_equal_numbers_distinct_strings() {
        let a = VersionKey::new("51.01");
        let b = VersionKey::new("51.1");
        assert_ne!(a, b);
        assert_ne!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_bucket_key_display() {
        let day = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
        let midnight = BucketKey::Released(day.and_hms_opt(0, 0, 0).unwrap());
        let afternoon = BucketKey::Released(day.and_hms_opt(14, 30, 0).unwrap());
        assert_eq!(midnight.to_string(), "2021-03-01");
        assert_eq!(afternoon.to_string(), "2021-03-01 14:30:00");
        assert_eq!(BucketKey::Version(VersionKey::new("5.3")).to_string(), "5.3");
    }

    #[test]
    fn test_summary_record_from_cluster() {
        let cluster = Cluster {
            bucket_key: BucketKey::Version(VersionKey::new("5.3")),
            cluster_id: 2,
            member_ids: vec![1, 4, 7, 8, 9],
            label: "crashes startup update".to_string(),
            avg_rating: Some(1.4),
            size: 5,
        };
        let record = ClusterSummaryRecord::from(&cluster);
        assert_eq!(record.version, "5.3");
        assert_eq!(record.cluster_id, 2);
        assert_eq!(record.num_reviews, 5);
        assert_eq!(record.avg_score, Some(1.4));
    }
}
