// src/alignment/aligner.rs
//
// Maps reviews onto release buckets and partitions them before clustering.

use std::collections::{BTreeMap, BTreeSet};

use crate::alignment::date::{parse_timestamp, DateBinner};
use crate::alignment::version::{clean_version, extract_major_minor};
use crate::alignment::{AlignmentStrategy, KeyResolution};
use crate::models::{BucketKey, NormalizedReview, Release, Review, VersionKey};

#[derive(Debug, Clone)]
enum ReleaseKeys {
    Versions(BTreeSet<VersionKey>),
    Dates(DateBinner),
}

/// Resolves each review to at most one release bucket.
#[derive(Debug, Clone)]
pub struct VersionAligner {
    strategy: AlignmentStrategy,
    keys: ReleaseKeys,
}

/// All reviews of one release, in input order.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub key: BucketKey,
    pub reviews: Vec<NormalizedReview>,
}

impl Bucket {
    pub fn informative_count(&self) -> usize {
        self.reviews.iter().filter(|r| r.informative).count()
    }
}

/// Buckets in key order, plus the reviews that fell outside every bucket.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub buckets: Vec<Bucket>,
    pub excluded: usize,
}

impl Partition {
    pub fn bucketed_reviews(&self) -> usize {
        self.buckets.iter().map(|b| b.reviews.len()).sum()
    }
}

impl VersionAligner {
    /// Derives the release keys for `strategy`. Releases whose version or date
    /// cannot be read are ignored.
    pub fn from_releases(strategy: AlignmentStrategy, releases: &[Release]) -> Self {
        let keys = match strategy {
            AlignmentStrategy::ReleaseDate => ReleaseKeys::Dates(DateBinner::new(
                releases
                    .iter()
                    .filter_map(|r| r.raw_date.as_deref().and_then(parse_timestamp)),
            )),
            AlignmentStrategy::ExactVersion | AlignmentStrategy::MajorMinor => {
                let versions = releases
                    .iter()
                    .filter_map(|r| r.raw_version.as_deref())
                    .filter_map(|raw| release_version_key(strategy, raw))
                    .collect();
                ReleaseKeys::Versions(versions)
            }
        };
        Self { strategy, keys }
    }

    pub fn strategy(&self) -> AlignmentStrategy {
        self.strategy
    }

    pub fn release_key_count(&self) -> usize {
        match &self.keys {
            ReleaseKeys::Versions(v) => v.len(),
            ReleaseKeys::Dates(binner) => binner.edges().len(),
        }
    }

    /// Every bucket key in order, including ones no review maps to.
    pub fn bucket_keys(&self) -> Vec<BucketKey> {
        match &self.keys {
            ReleaseKeys::Versions(v) => v.iter().cloned().map(BucketKey::Version).collect(),
            ReleaseKeys::Dates(binner) => {
                binner.edges().iter().copied().map(BucketKey::Released).collect()
            }
        }
    }

    pub fn resolve(&self, review: &Review) -> KeyResolution {
        match &self.keys {
            ReleaseKeys::Dates(binner) => {
                let Some(at) = review.raw_timestamp.as_deref().and_then(parse_timestamp) else {
                    return KeyResolution::Unresolved;
                };
                match binner.bin(at) {
                    Some(start) => KeyResolution::Bucketed(BucketKey::Released(start)),
                    None => KeyResolution::Unmatched,
                }
            }
            ReleaseKeys::Versions(known) => {
                let Some(key) = review
                    .raw_version
                    .as_deref()
                    .and_then(|raw| review_version_key(self.strategy, raw))
                else {
                    return KeyResolution::Unresolved;
                };
                if known.contains(&key) {
                    KeyResolution::Bucketed(BucketKey::Version(key))
                } else {
                    KeyResolution::Unmatched
                }
            }
        }
    }

    /// Groups reviews by their resolved key. Each review with a key lands in
    /// exactly one bucket; buckets come out in key order.
    pub fn partition(&self, reviews: Vec<NormalizedReview>) -> Partition {
        let mut grouped: BTreeMap<BucketKey, Vec<NormalizedReview>> = self
            .bucket_keys()
            .into_iter()
            .map(|key| (key, Vec::new()))
            .collect();
        let mut excluded = 0;

        for review in reviews {
            match review.bucket_key.clone().and_then(|k| grouped.get_mut(&k)) {
                Some(members) => members.push(review),
                None => excluded += 1,
            }
        }

        Partition {
            buckets: grouped
                .into_iter()
                .map(|(key, reviews)| Bucket { key, reviews })
                .collect(),
            excluded,
        }
    }
}

fn review_version_key(strategy: AlignmentStrategy, raw: &str) -> Option<VersionKey> {
    let key = match strategy {
        AlignmentStrategy::MajorMinor => extract_major_minor(raw)?,
        _ => clean_version(raw),
    };
    (!key.is_empty()).then(|| VersionKey::new(key))
}

fn release_version_key(strategy: AlignmentStrategy, raw: &str) -> Option<VersionKey> {
    let key = match strategy {
        AlignmentStrategy::MajorMinor => {
            extract_major_minor(raw).unwrap_or_else(|| clean_version(raw))
        }
        _ => clean_version(raw),
    };
    (!key.is_empty()).then(|| VersionKey::new(key))
}
