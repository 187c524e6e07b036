// src/alignment/mod.rs

pub mod aligner;
pub mod date;
pub mod version;

use serde::Serialize;
use std::fmt;

use crate::models::BucketKey;

pub use aligner::{Bucket, Partition, VersionAligner};
pub use date::{parse_timestamp, DateBinner};
pub use version::{clean_version, extract_major_minor};

/// How reviews are attributed to releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentStrategy {
    /// Cleaned review version must equal a cleaned release version.
    ExactVersion,
    /// Reviews only carry `major.minor`; release versions are reduced to match.
    MajorMinor,
    /// No usable version: reviews fall into `[release_i, release_{i+1})` by timestamp.
    ReleaseDate,
}

impl AlignmentStrategy {
    pub fn is_date_keyed(&self) -> bool {
        matches!(self, AlignmentStrategy::ReleaseDate)
    }
}

impl fmt::Display for AlignmentStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlignmentStrategy::ExactVersion => "exact version",
            AlignmentStrategy::MajorMinor => "major.minor version",
            AlignmentStrategy::ReleaseDate => "release date interval",
        };
        f.write_str(name)
    }
}

/// Outcome of looking up a review's bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResolution {
    Bucketed(BucketKey),
    /// A key was derived, but no release carries it (or it predates every release).
    Unmatched,
    /// No version or timestamp could be parsed from the review.
    Unresolved,
}

impl KeyResolution {
    pub fn bucket_key(self) -> Option<BucketKey> {
        match self {
            KeyResolution::Bucketed(key) => Some(key),
            _ => None,
        }
    }
}
