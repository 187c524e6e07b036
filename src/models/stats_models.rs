// src/models/stats_models.rs

use log::info;
use serde::Serialize;

/// Why a clustered group did not become an accepted theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscardReason {
    /// The backend reported a group below the minimum cluster size.
    Undersized,
    /// No member text survived the stock-phrase and informativeness filters.
    NoInformativeText,
    /// The extracted label did not look like English.
    InvalidLabel,
}

impl DiscardReason {
    pub fn description(&self) -> &'static str {
        match self {
            DiscardReason::Undersized => "below minimum cluster size",
            DiscardReason::NoInformativeText => "not enough informative reviews",
            DiscardReason::InvalidLabel => "nonsensical label",
        }
    }
}

/// What happened to a single bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BucketOutcome {
    /// Too few informative reviews to cluster.
    Skipped,
    /// Embedding or clustering failed; the bucket contributes nothing.
    Failed { reason: String },
    Processed {
        clusters_found: usize,
        outliers: usize,
        accepted: usize,
        discarded_undersized: usize,
        discarded_no_text: usize,
        discarded_invalid_label: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketReport {
    pub bucket: String,
    pub reviews: usize,
    pub informative_reviews: usize,
    pub outcome: BucketOutcome,
}

/// Counters for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunStats {
    pub reviews_loaded: usize,
    pub releases_loaded: usize,
    pub release_keys: usize,
    pub informative_reviews: usize,
    /// Version or timestamp could not be parsed at all.
    pub unresolved_reviews: usize,
    /// Parsed, but no release bucket matches.
    pub unmatched_reviews: usize,
    pub bucketed_reviews: usize,
    pub buckets_total: usize,
    pub buckets_processed: usize,
    pub buckets_skipped: usize,
    pub buckets_failed: usize,
    pub clusters_found: usize,
    pub clusters_accepted: usize,
    pub clusters_discarded_undersized: usize,
    pub clusters_discarded_no_text: usize,
    pub clusters_discarded_invalid_label: usize,
    pub labeled_reviews: usize,
}

impl RunStats {
    pub fn absorb(&mut self, report: &BucketReport) {
        match &report.outcome {
            BucketOutcome::Skipped => self.buckets_skipped += 1,
            BucketOutcome::Failed { .. } => self.buckets_failed += 1,
            BucketOutcome::Processed {
                clusters_found,
                accepted,
                discarded_undersized,
                discarded_no_text,
                discarded_invalid_label,
                ..
            } => {
                self.buckets_processed += 1;
                self.clusters_found += clusters_found;
                self.clusters_accepted += accepted;
                self.clusters_discarded_undersized += discarded_undersized;
                self.clusters_discarded_no_text += discarded_no_text;
                self.clusters_discarded_invalid_label += discarded_invalid_label;
            }
        }
    }

    pub fn log_summary(&self) {
        info!("=== Pipeline Summary ===");
        info!("Reviews loaded: {}", self.reviews_loaded);
        info!("Informative reviews: {}", self.informative_reviews);
        info!(
            "Reviews bucketed: {} (unresolved: {}, unmatched: {})",
            self.bucketed_reviews, self.unresolved_reviews, self.unmatched_reviews
        );
        info!(
            "Releases loaded: {} ({} distinct release keys)",
            self.releases_loaded, self.release_keys
        );
        info!(
            "Buckets: {} total, {} processed, {} skipped, {} failed",
            self.buckets_total, self.buckets_processed, self.buckets_skipped, self.buckets_failed
        );
        info!(
            "Clusters: {} found, {} accepted",
            self.clusters_found, self.clusters_accepted
        );
        info!(
            "Clusters discarded: {} undersized, {} without informative text, {} with invalid labels",
            self.clusters_discarded_undersized,
            self.clusters_discarded_no_text,
            self.clusters_discarded_invalid_label
        );
        info!("Labeled reviews: {}", self.labeled_reviews);
    }
}

/// How a run ended. Both variants are successful runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed {
        clusters: usize,
        labeled_reviews: usize,
    },
    /// Nothing survived the filters; outputs were written as empty tables.
    NoClusters,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: BucketOutcome) -> BucketReport {
        BucketReport {
            bucket: "5.3".to_string(),
            reviews: 10,
            informative_reviews: 6,
            outcome,
        }
    }

    #[test]
    fn test_absorb_counts_each_outcome() {
        let mut stats = RunStats::default();
        stats.absorb(&report(BucketOutcome::Skipped));
        stats.absorb(&report(BucketOutcome::Failed {
            reason: "embedding backend unreachable".to_string(),
        }));
        stats.absorb(&report(BucketOutcome::Processed {
            clusters_found: 4,
            outliers: 3,
            accepted: 1,
            discarded_undersized: 1,
            discarded_no_text: 1,
            discarded_invalid_label: 1,
        }));

        assert_eq!(stats.buckets_skipped, 1);
        assert_eq!(stats.buckets_failed, 1);
        assert_eq!(stats.buckets_processed, 1);
        assert_eq!(stats.clusters_found, 4);
        assert_eq!(stats.clusters_accepted, 1);
        assert_eq!(stats.clusters_discarded_undersized, 1);
        assert_eq!(stats.clusters_discarded_no_text, 1);
        assert_eq!(stats.clusters_discarded_invalid_label, 1);
    }

    #[test]
    fn test_outcome_serialization_is_tagged() {
        let json = serde_json::to_value(RunOutcome::NoClusters).unwrap();
        assert_eq!(json["outcome"], "no_clusters");

        let json = serde_json::to_value(&report(BucketOutcome::Skipped)).unwrap();
        assert_eq!(json["outcome"]["status"], "skipped");
    }
}
