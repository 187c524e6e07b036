// src/output/report.rs
//
// JSON run report written next to the result tables.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

use crate::alignment::AlignmentStrategy;
use crate::models::stats_models::{BucketReport, RunOutcome, RunStats};
use crate::utils::pipeline_config::PipelineConfig;

#[derive(Debug, Clone, Serialize)]
pub struct OutputDigest {
    pub path: String,
    pub rows: usize,
    pub sha256: String,
}

impl OutputDigest {
    /// Hashes the file as written. Identical tables give identical digests.
    pub fn of_file(path: &Path, rows: usize) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read {} for digest", path.display()))?;
        Ok(Self {
            path: path.display().to_string(),
            rows,
            sha256: hex::encode(Sha256::digest(&bytes)),
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub app_name: String,
    pub strategy: AlignmentStrategy,
    pub embedding_provider: String,
    pub config: PipelineConfig,
    pub stats: RunStats,
    pub outcome: RunOutcome,
    pub buckets: Vec<BucketReport>,
    pub outputs: Vec<OutputDigest>,
}

impl RunReport {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize run report")?;
        fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
    }
}
