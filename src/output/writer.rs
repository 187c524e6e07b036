// src/output/writer.rs
//
// CSV writers for the two result tables. Empty inputs still produce a header row.

use anyhow::{Context, Result};
use csv::{Writer, WriterBuilder};
use std::fs;
use std::path::Path;

use crate::models::cluster::LABELED_REVIEW_EXTRA_COLUMNS;
use crate::models::{ClusterSummaryRecord, LabeledReviewRecord};

pub const SUMMARY_COLUMNS: [&str; 5] = [
    "version",
    "cluster_id",
    "cluster_label",
    "num_reviews",
    "avg_score",
];

fn create_writer(path: &Path) -> Result<Writer<fs::File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }
    // Headers are written explicitly so empty tables still get one.
    WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))
}

pub fn write_summary(path: &Path, rows: &[ClusterSummaryRecord]) -> Result<()> {
    let mut writer = create_writer(path)?;
    writer.write_record(SUMMARY_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Original review columns followed by `clean_version`, `cluster`, `cluster_label`.
pub fn write_labeled_reviews(
    path: &Path,
    original_headers: &[String],
    rows: &[LabeledReviewRecord],
) -> Result<()> {
    let mut writer = create_writer(path)?;
    let header: Vec<&str> = original_headers
        .iter()
        .map(String::as_str)
        .chain(LABELED_REVIEW_EXTRA_COLUMNS)
        .collect();
    writer.write_record(&header)?;

    for row in rows {
        let mut values = row.original_values.clone();
        values.resize(original_headers.len(), String::new());
        values.push(row.clean_version.clone());
        values.push(row.cluster_id.to_string());
        values.push(row.cluster_label.clone());
        writer.write_record(&values)?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_tables_have_headers_only() {
        let dir = tempdir().unwrap();
        let summary = dir.path().join("out/App_cluster_summary.csv");
        let labeled = dir.path().join("out/App_clustered_reviews_output.csv");

        write_summary(&summary, &[]).unwrap();
        write_labeled_reviews(&labeled, &["score".to_string(), "content".to_string()], &[]).unwrap();

        assert_eq!(
            fs::read_to_string(&summary).unwrap(),
            "version,cluster_id,cluster_label,num_reviews,avg_score\n"
        );
        assert_eq!(
            fs::read_to_string(&labeled).unwrap(),
            "score,content,clean_version,cluster,cluster_label\n"
        );
    }

    #[test]
    fn test_rows_are_written() {
        let dir = tempdir().unwrap();
        let summary = dir.path().join("summary.csv");
        let labeled = dir.path().join("labeled.csv");

        write_summary(
            &summary,
            &[ClusterSummaryRecord {
                version: "5.3".to_string(),
                cluster_id: 0,
                cluster_label: "app crashes startup, crashes startup update".to_string(),
                num_reviews: 6,
                avg_score: Some(1.5),
            }],
        )
        .unwrap();
        write_labeled_reviews(
            &labeled,
            &["score".to_string(), "content".to_string()],
            &[LabeledReviewRecord {
                review_id: 3,
                original_values: vec!["1".to_string(), "it crashes".to_string()],
                clean_version: "5.3".to_string(),
                cluster_id: 0,
                cluster_label: "crash label".to_string(),
            }],
        )
        .unwrap();

        let summary_text = fs::read_to_string(&summary).unwrap();
        assert!(summary_text
            .contains("5.3,0,\"app crashes startup, crashes startup update\",6,1.5\n"));
        let labeled_text = fs::read_to_string(&labeled).unwrap();
        assert!(labeled_text.ends_with("1,it crashes,5.3,0,crash label\n"));
    }

    #[test]
    fn test_whole_average_keeps_decimal_and_missing_is_blank() {
        let dir = tempdir().unwrap();
        let summary = dir.path().join("summary.csv");
        let row = |cluster_id, avg_score| ClusterSummaryRecord {
            version: "5.2".to_string(),
            cluster_id,
            cluster_label: "audio drops".to_string(),
            num_reviews: 5,
            avg_score,
        };

        write_summary(&summary, &[row(0, Some(2.0)), row(1, None)]).unwrap();

        assert_eq!(
            fs::read_to_string(&summary).unwrap(),
            "version,cluster_id,cluster_label,num_reviews,avg_score\n\
             5.2,0,audio drops,5,2.0\n\
             5.2,1,audio drops,5,\n"
        );
    }
}
