// src/clustering/bucket_clusterer.rs
//
// Per-bucket processing: embed, cluster, drop outliers, label and validate.

use anyhow::{Context, Result};
use ndarray::Array2;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::alignment::Bucket;
use crate::clustering::Clusterer;
use crate::embedding::EmbeddingProvider;
use crate::labeling::{is_valid_label, EnglishLexicon, LabelExtractor};
use crate::models::stats_models::{BucketOutcome, BucketReport, DiscardReason};
use crate::models::{Cluster, ClusterAssignment, LabeledReviewRecord, NormalizedReview};
use crate::utils::logging::{PipelineStage, StageLogger};
use crate::utils::pipeline_config::PipelineConfig;

/// Everything one bucket contributes to the run.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub clusters: Vec<Cluster>,
    pub labeled_reviews: Vec<LabeledReviewRecord>,
    pub report: BucketReport,
}

#[derive(Default)]
struct ProcessedBucket {
    clusters: Vec<Cluster>,
    labeled_reviews: Vec<LabeledReviewRecord>,
    clusters_found: usize,
    outliers: usize,
    discarded_undersized: usize,
    discarded_no_text: usize,
    discarded_invalid_label: usize,
}

impl ProcessedBucket {
    fn discard(&mut self, reason: DiscardReason) {
        match reason {
            DiscardReason::Undersized => self.discarded_undersized += 1,
            DiscardReason::NoInformativeText => self.discarded_no_text += 1,
            DiscardReason::InvalidLabel => self.discarded_invalid_label += 1,
        }
    }

    fn outcome(&self) -> BucketOutcome {
        BucketOutcome::Processed {
            clusters_found: self.clusters_found,
            outliers: self.outliers,
            accepted: self.clusters.len(),
            discarded_undersized: self.discarded_undersized,
            discarded_no_text: self.discarded_no_text,
            discarded_invalid_label: self.discarded_invalid_label,
        }
    }
}

/// Shared by all bucket tasks of a run.
#[derive(Clone)]
pub struct BucketClusterer {
    embedder: Arc<dyn EmbeddingProvider>,
    clusterer: Arc<dyn Clusterer>,
    labels: LabelExtractor,
    lexicon: Arc<EnglishLexicon>,
    min_bucket_reviews: usize,
    min_cluster_size: usize,
    validity_threshold: f64,
    logger: StageLogger,
    label_logger: StageLogger,
}

impl BucketClusterer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        clusterer: Arc<dyn Clusterer>,
        labels: LabelExtractor,
        lexicon: Arc<EnglishLexicon>,
        config: &PipelineConfig,
    ) -> Self {
        Self {
            embedder,
            clusterer,
            labels,
            lexicon,
            min_bucket_reviews: config.min_bucket_reviews,
            min_cluster_size: config.min_cluster_size,
            validity_threshold: config.label_validity_threshold,
            logger: StageLogger::new(PipelineStage::Cluster),
            label_logger: StageLogger::new(PipelineStage::Label),
        }
    }

    /// Never fails: embedding or clustering errors become `BucketOutcome::Failed`.
    pub async fn process(&self, bucket: Bucket) -> BucketResult {
        let name = bucket.key.to_string();
        let informative = bucket.informative_count();
        let mut report = BucketReport {
            bucket: name.clone(),
            reviews: bucket.reviews.len(),
            informative_reviews: informative,
            outcome: BucketOutcome::Skipped,
        };

        if informative < self.min_bucket_reviews {
            self.logger
                .log_bucket_skipped(&name, informative, self.min_bucket_reviews);
            return BucketResult {
                clusters: Vec::new(),
                labeled_reviews: Vec::new(),
                report,
            };
        }

        self.logger
            .log_bucket_start(&name, bucket.reviews.len(), informative);

        match self.cluster_bucket(&name, &bucket).await {
            Ok(processed) => {
                report.outcome = processed.outcome();
                BucketResult {
                    clusters: processed.clusters,
                    labeled_reviews: processed.labeled_reviews,
                    report,
                }
            }
            Err(e) => {
                self.logger
                    .log_error(&format!("Bucket {} failed: {:#}", name, e));
                report.outcome = BucketOutcome::Failed {
                    reason: format!("{:#}", e),
                };
                BucketResult {
                    clusters: Vec::new(),
                    labeled_reviews: Vec::new(),
                    report,
                }
            }
        }
    }

    async fn cluster_bucket(&self, name: &str, bucket: &Bucket) -> Result<ProcessedBucket> {
        let texts: Vec<String> = bucket
            .reviews
            .iter()
            .map(|r| r.cleaned_content.clone())
            .collect();

        let vectors = self
            .embedder
            .embed(&texts)
            .await
            .with_context(|| format!("Embedding with {} failed", self.embedder.name()))?;
        let matrix = to_matrix(vectors, texts.len())?;

        let clusterer = Arc::clone(&self.clusterer);
        let min_size = self.min_cluster_size;
        let assignments = tokio::task::spawn_blocking(move || clusterer.cluster(&matrix, min_size))
            .await
            .context("Clustering task panicked")??;

        if assignments.len() != bucket.reviews.len() {
            anyhow::bail!(
                "Clusterer returned {} assignments for {} reviews",
                assignments.len(),
                bucket.reviews.len()
            );
        }

        let mut groups: BTreeMap<usize, Vec<&NormalizedReview>> = BTreeMap::new();
        let mut processed = ProcessedBucket::default();
        for (review, assignment) in bucket.reviews.iter().zip(&assignments) {
            match assignment {
                ClusterAssignment::Member(id) => groups.entry(*id).or_default().push(review),
                ClusterAssignment::Outlier => processed.outliers += 1,
            }
        }
        processed.clusters_found = groups.len();
        self.logger
            .log_clusters_found(name, groups.len(), processed.outliers);

        for (cluster_id, members) in groups {
            match self.label_group(bucket, cluster_id, &members)? {
                Ok(cluster) => {
                    self.label_logger.log_cluster_accepted(
                        name,
                        cluster_id,
                        &cluster.label,
                        cluster.avg_rating,
                    );
                    processed
                        .labeled_reviews
                        .extend(labeled_records(&cluster, &members));
                    processed.clusters.push(cluster);
                }
                Err(reason) => {
                    self.label_logger
                        .log_cluster_discarded(name, cluster_id, reason.description());
                    processed.discard(reason);
                }
            }
        }

        Ok(processed)
    }

    /// Outer error: the keyword backend failed. Inner error: the group was discarded.
    fn label_group(
        &self,
        bucket: &Bucket,
        cluster_id: usize,
        members: &[&NormalizedReview],
    ) -> Result<std::result::Result<Cluster, DiscardReason>> {
        if members.len() < self.min_cluster_size {
            return Ok(Err(DiscardReason::Undersized));
        }

        let Some(label) = self
            .labels
            .extract(members.iter().map(|r| r.cleaned_content.as_str()))?
        else {
            return Ok(Err(DiscardReason::NoInformativeText));
        };

        if !is_valid_label(&label, &self.lexicon, self.validity_threshold) {
            self.label_logger.log_debug(&format!("Rejected label: {}", label));
            return Ok(Err(DiscardReason::InvalidLabel));
        }

        Ok(Ok(Cluster {
            bucket_key: bucket.key.clone(),
            cluster_id,
            member_ids: members.iter().map(|r| r.id()).collect(),
            label,
            avg_rating: mean_rating(members),
            size: members.len(),
        }))
    }
}

fn to_matrix(vectors: Vec<Vec<f32>>, expected_rows: usize) -> Result<Array2<f32>> {
    if vectors.len() != expected_rows {
        anyhow::bail!(
            "Embedding backend returned {} vectors for {} texts",
            vectors.len(),
            expected_rows
        );
    }
    let dim = vectors.first().map_or(0, Vec::len);
    if vectors.iter().any(|v| v.len() != dim) {
        anyhow::bail!("Embedding backend returned vectors of differing length");
    }
    let flat: Vec<f32> = vectors.into_iter().flatten().collect();
    Array2::from_shape_vec((expected_rows, dim), flat).context("Failed to shape embedding matrix")
}

/// Mean over members that carry a rating.
fn mean_rating(members: &[&NormalizedReview]) -> Option<f64> {
    let ratings: Vec<f64> = members.iter().filter_map(|r| r.rating()).collect();
    if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }
}

fn labeled_records(cluster: &Cluster, members: &[&NormalizedReview]) -> Vec<LabeledReviewRecord> {
    let clean_version = cluster.bucket_key.to_string();
    members
        .iter()
        .map(|r| LabeledReviewRecord {
            review_id: r.id(),
            original_values: r.review.raw_record.clone(),
            clean_version: clean_version.clone(),
            cluster_id: cluster.cluster_id,
            cluster_label: cluster.label.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::models::{BucketKey, Review, VersionKey};
    use async_trait::async_trait;

    /// Assigns every informative review to group 0 and the rest to outliers.
    struct InformativeClusterer {
        informative: Vec<bool>,
    }

    impl Clusterer for InformativeClusterer {
        fn cluster(&self, _vectors: &Array2<f32>, _min_size: usize) -> Result<Vec<ClusterAssignment>> {
            Ok(self
                .informative
                .iter()
                .map(|i| {
                    if *i {
                        ClusterAssignment::Member(0)
                    } else {
                        ClusterAssignment::Outlier
                    }
                })
                .collect())
        }
    }

    struct FailingEmbedder;

    #[async_trait]
    impl EmbeddingProvider for FailingEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            anyhow::bail!("connection refused")
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    fn bucket(texts: &[(&str, f64)]) -> Bucket {
        let key = BucketKey::Version(VersionKey::new("5.3"));
        let reviews = texts
            .iter()
            .enumerate()
            .map(|(id, (text, rating))| NormalizedReview {
                review: Review {
                    id,
                    raw_version: Some("5.3".to_string()),
                    raw_timestamp: None,
                    rating: Some(*rating),
                    raw_content: Some(text.to_string()),
                    raw_record: vec![rating.to_string(), text.to_string()],
                },
                cleaned_content: text.to_string(),
                informative: crate::normalization::is_informative(text),
                bucket_key: Some(key.clone()),
            })
            .collect();
        Bucket { key, reviews }
    }

    fn clusterer_for(bucket: &Bucket, embedder: Arc<dyn EmbeddingProvider>) -> BucketClusterer {
        let informative = bucket.reviews.iter().map(|r| r.informative).collect();
        BucketClusterer::new(
            embedder,
            Arc::new(InformativeClusterer { informative }),
            LabelExtractor::default(),
            Arc::new(EnglishLexicon::bundled()),
            &PipelineConfig::default(),
        )
    }

    const CRASH: &str = "app crashes on startup after update";

    #[tokio::test]
    async fn test_four_informative_reviews_are_skipped() {
        let b = bucket(&[(CRASH, 1.0), (CRASH, 1.0), (CRASH, 2.0), (CRASH, 1.0), ("good", 5.0)]);
        let processor = clusterer_for(&b, Arc::new(HashingEmbedder::default()));
        let result = processor.process(b).await;
        assert!(result.clusters.is_empty());
        assert_eq!(result.report.outcome, BucketOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_five_identical_reviews_form_a_cluster() {
        let b = bucket(&[(CRASH, 1.0), (CRASH, 2.0), (CRASH, 1.0), (CRASH, 2.0), (CRASH, 4.0)]);
        let processor = clusterer_for(&b, Arc::new(HashingEmbedder::default()));
        let result = processor.process(b).await;

        assert_eq!(result.clusters.len(), 1);
        let cluster = &result.clusters[0];
        assert_eq!(cluster.size, 5);
        assert_eq!(cluster.avg_rating, Some(2.0));
        assert!(cluster.label.contains("crashes startup"));
        assert_eq!(result.labeled_reviews.len(), 5);
        assert!(result.labeled_reviews.iter().all(|r| r.clean_version == "5.3"));
    }

    #[tokio::test]
    async fn test_gibberish_label_is_discarded() {
        let text = "xqzt blorp fnarg zzkq wibblo";
        let b = bucket(&[(text, 3.0); 5]);
        let processor = clusterer_for(&b, Arc::new(HashingEmbedder::default()));
        let result = processor.process(b).await;

        assert!(result.clusters.is_empty());
        assert!(result.labeled_reviews.is_empty());
        match result.report.outcome {
            BucketOutcome::Processed {
                discarded_invalid_label,
                accepted,
                ..
            } => {
                assert_eq!(discarded_invalid_label, 1);
                assert_eq!(accepted, 0);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_embedding_failure_is_local() {
        let b = bucket(&[(CRASH, 1.0); 6]);
        let processor = clusterer_for(&b, Arc::new(FailingEmbedder));
        let result = processor.process(b).await;
        assert!(result.clusters.is_empty());
        match result.report.outcome {
            BucketOutcome::Failed { reason } => assert!(reason.contains("connection refused")),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_to_matrix_rejects_ragged_vectors() {
        assert!(to_matrix(vec![vec![1.0, 0.0], vec![1.0]], 2).is_err());
        assert!(to_matrix(vec![vec![1.0, 0.0]], 2).is_err());
        assert_eq!(to_matrix(vec![vec![1.0, 0.0], vec![0.0, 1.0]], 2).unwrap().dim(), (2, 2));
    }
}
