// src/output/assembler.rs

use crate::clustering::BucketResult;
use crate::models::stats_models::{BucketReport, RunOutcome};
use crate::models::{Cluster, ClusterSummaryRecord, LabeledReviewRecord};

/// Collects bucket results in bucket order.
#[derive(Debug, Default)]
pub struct OutputAssembler {
    clusters: Vec<Cluster>,
    labeled_reviews: Vec<LabeledReviewRecord>,
    bucket_reports: Vec<BucketReport>,
}

/// Final rows of both tables.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledOutput {
    pub summary: Vec<ClusterSummaryRecord>,
    pub labeled_reviews: Vec<LabeledReviewRecord>,
    pub bucket_reports: Vec<BucketReport>,
    pub outcome: RunOutcome,
}

impl OutputAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results must be added in bucket-key order.
    pub fn add(&mut self, mut result: BucketResult) {
        result.clusters.sort_by_key(|c| c.cluster_id);
        result
            .labeled_reviews
            .sort_by_key(|r| (r.cluster_id, r.review_id));
        self.clusters.extend(result.clusters);
        self.labeled_reviews.extend(result.labeled_reviews);
        self.bucket_reports.push(result.report);
    }

    pub fn finish(self) -> AssembledOutput {
        let outcome = if self.clusters.is_empty() {
            RunOutcome::NoClusters
        } else {
            RunOutcome::Completed {
                clusters: self.clusters.len(),
                labeled_reviews: self.labeled_reviews.len(),
            }
        };
        AssembledOutput {
            summary: self.clusters.iter().map(ClusterSummaryRecord::from).collect(),
            labeled_reviews: self.labeled_reviews,
            bucket_reports: self.bucket_reports,
            outcome,
        }
    }
}
