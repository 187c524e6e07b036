// src/output/timeline.rs
//
// Feature counts per release: grouped by cleaned version for version-keyed
// products, by release date otherwise.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::alignment::{clean_version, parse_timestamp, AlignmentStrategy};
use crate::models::{BucketKey, Release, VersionKey};

#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub release: String,
    pub feature_count: usize,
    pub features: Vec<String>,
}

/// Releases without a usable key are left out.
pub fn build_timeline(strategy: AlignmentStrategy, releases: &[Release]) -> Vec<TimelineEntry> {
    let mut grouped: BTreeMap<BucketKey, Vec<String>> = BTreeMap::new();
    for release in releases {
        let key = if strategy.is_date_keyed() {
            release
                .raw_date
                .as_deref()
                .and_then(parse_timestamp)
                .map(BucketKey::Released)
        } else {
            release
                .raw_version
                .as_deref()
                .map(clean_version)
                .filter(|v| !v.is_empty())
                .map(|v| BucketKey::Version(VersionKey::new(v)))
        };
        if let Some(key) = key {
            grouped
                .entry(key)
                .or_default()
                .push(release.description.clone().unwrap_or_default());
        }
    }

    grouped
        .into_iter()
        .map(|(key, features)| TimelineEntry {
            release: key.to_string(),
            feature_count: features.len(),
            features,
        })
        .collect()
}

pub fn write_timeline(path: &Path, entries: &[TimelineEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("Failed to create {}", path.display()))?;
    writer.write_record(["release", "feature_count", "features"])?;
    for entry in entries {
        writer.write_record([
            entry.release.clone(),
            entry.feature_count.to_string(),
            entry.features.join(" | "),
        ])?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}
