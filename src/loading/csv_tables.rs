// src/loading/csv_tables.rs
//
// Reads the review and release exports. Files are decoded as UTF-8 and
// fall back to Latin-1 when that fails.

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord};
use log::{debug, warn};
use std::fs;
use std::path::Path;

use crate::models::{Release, Review};
use crate::utils::products::{ReleaseColumns, ReviewColumns};

/// Loaded reviews plus the original header row, kept for the labeled output.
#[derive(Debug, Clone, Default)]
pub struct ReviewTable {
    pub headers: Vec<String>,
    pub reviews: Vec<Review>,
}

/// UTF-8 when valid, otherwise each byte is taken as a Latin-1 code point.
pub fn decode_bytes(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|b| char::from(*b)).collect(),
    }
}

fn read_table(path: &Path) -> Result<(Vec<String>, Vec<StringRecord>)> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    if std::str::from_utf8(&bytes).is_err() {
        warn!("{} is not valid UTF-8, decoding as Latin-1", path.display());
    }
    let text = decode_bytes(&bytes);

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read header row of {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let records = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!("Read {} rows from {}", records.len(), path.display());
    Ok((headers, records))
}

fn column_index(headers: &[String], name: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("{} has no '{}' column (found: {:?})", path.display(), name, headers))
}

fn field(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Ratings outside 1..=5 are treated as missing.
fn parse_rating(raw: Option<String>) -> Option<f64> {
    raw.and_then(|r| r.parse::<f64>().ok())
        .filter(|r| (1.0..=5.0).contains(r))
}

pub fn load_reviews(path: &Path, columns: &ReviewColumns) -> Result<ReviewTable> {
    let (headers, records) = read_table(path)?;
    let rating_idx = column_index(&headers, &columns.rating, path)?;
    let timestamp_idx = column_index(&headers, &columns.timestamp, path)?;
    let version_idx = column_index(&headers, &columns.version, path)?;
    let content_idx = column_index(&headers, &columns.content, path)?;

    let reviews = records
        .iter()
        .enumerate()
        .map(|(id, record)| Review {
            id,
            raw_version: field(record, version_idx),
            raw_timestamp: field(record, timestamp_idx),
            rating: parse_rating(field(record, rating_idx)),
            raw_content: record.get(content_idx).map(str::to_string),
            raw_record: (0..headers.len())
                .map(|i| record.get(i).unwrap_or_default().to_string())
                .collect(),
        })
        .collect();

    Ok(ReviewTable { headers, reviews })
}

/// The version column is optional; date-keyed products may not publish one.
pub fn load_releases(path: &Path, columns: &ReleaseColumns) -> Result<Vec<Release>> {
    let (headers, records) = read_table(path)?;
    let date_idx = column_index(&headers, &columns.date, path)?;
    let description_idx = column_index(&headers, &columns.description, path)?;
    let version_idx = headers.iter().position(|h| *h == columns.version);

    Ok(records
        .iter()
        .map(|record| Release {
            raw_date: field(record, date_idx),
            raw_version: version_idx.and_then(|idx| field(record, idx)),
            description: field(record, description_idx),
        })
        .collect())
}
