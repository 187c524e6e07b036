// src/pipeline.rs
//
// One run: load, normalize and align, fan buckets out across tasks, merge in
// bucket order and write the result tables.

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::alignment::{KeyResolution, Partition, VersionAligner};
use crate::clustering::{BucketClusterer, BucketResult, Clusterer, DbscanClusterer};
use crate::embedding::{build_provider, EmbeddingProvider};
use crate::labeling::{EnglishLexicon, KeywordExtractor, LabelExtractor, NgramTfIdfExtractor};
use crate::loading::{load_releases, load_reviews, ReviewTable};
use crate::models::stats_models::{BucketOutcome, BucketReport, RunOutcome, RunStats};
use crate::models::{NormalizedReview, Release};
use crate::normalization::{is_informative, BasicNormalizer, TextNormalizer};
use crate::output::{write_labeled_reviews, write_summary, AssembledOutput, OutputAssembler, OutputDigest, RunReport};
use crate::utils::get_memory_usage;
use crate::utils::logging::{PipelineStage, StageLogger};
use crate::utils::pipeline_config::PipelineConfig;
use crate::utils::products::ProductProfile;
use crate::utils::progress_config::ProgressConfig;

/// Everything a run needs, built once per invocation.
#[derive(Clone)]
pub struct RunContext {
    pub run_id: String,
    pub profile: ProductProfile,
    pub config: PipelineConfig,
    pub progress: ProgressConfig,
    pub normalizer: Arc<dyn TextNormalizer>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub clusterer: Arc<dyn Clusterer>,
    pub keywords: Arc<dyn KeywordExtractor>,
    pub lexicon: Arc<EnglishLexicon>,
}

impl RunContext {
    /// Default backends: the configured embedder, DBSCAN, n-gram TF-IDF and
    /// the word list at `config.english_words_path`.
    pub fn from_config(
        profile: ProductProfile,
        config: PipelineConfig,
        progress: ProgressConfig,
    ) -> Result<Self> {
        let embedder = build_provider(&config).context("Failed to set up embedding backend")?;
        let lexicon = EnglishLexicon::load_or_bundled(std::path::Path::new(&config.english_words_path));
        Ok(Self {
            run_id: Uuid::new_v4().to_string(),
            profile,
            progress,
            normalizer: Arc::new(BasicNormalizer),
            embedder,
            clusterer: Arc::new(DbscanClusterer::new(config.dbscan_tolerance)),
            keywords: Arc::new(NgramTfIdfExtractor::default()),
            lexicon: Arc::new(lexicon),
            config,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub run_id: String,
    pub outcome: RunOutcome,
    pub stats: RunStats,
    pub output: AssembledOutput,
    pub summary_path: PathBuf,
    pub labeled_reviews_path: PathBuf,
    pub report_path: PathBuf,
}

/// Loads the profile's input files and runs the pipeline on them.
pub async fn run_pipeline(ctx: &RunContext) -> Result<RunSummary> {
    let logger = StageLogger::new(PipelineStage::Load);
    logger.log_start(&ctx.run_id, ctx.profile.product.app_name());

    let table = load_reviews(&ctx.profile.reviews_path, &ctx.profile.review_columns)
        .context("Failed to load reviews")?;
    logger.log_data_loaded(table.reviews.len(), "review");
    let releases = load_releases(&ctx.profile.releases_path, &ctx.profile.release_columns)
        .context("Failed to load releases")?;
    logger.log_data_loaded(releases.len(), "release");

    run_on_tables(ctx, table, releases).await
}

/// Cleans every review and resolves its bucket.
pub fn normalize_reviews(
    table: &ReviewTable,
    normalizer: &dyn TextNormalizer,
    aligner: &VersionAligner,
    stats: &mut RunStats,
) -> Vec<NormalizedReview> {
    table
        .reviews
        .iter()
        .map(|review| {
            let cleaned_content = normalizer.clean(review.raw_content.as_deref());
            let informative = is_informative(&cleaned_content);
            if informative {
                stats.informative_reviews += 1;
            }
            let bucket_key = match aligner.resolve(review) {
                KeyResolution::Bucketed(key) => Some(key),
                KeyResolution::Unmatched => {
                    stats.unmatched_reviews += 1;
                    None
                }
                KeyResolution::Unresolved => {
                    stats.unresolved_reviews += 1;
                    None
                }
            };
            NormalizedReview {
                review: review.clone(),
                cleaned_content,
                informative,
                bucket_key,
            }
        })
        .collect()
}

async fn process_buckets(ctx: &RunContext, partition: Partition) -> Vec<BucketResult> {
    let processor = Arc::new(BucketClusterer::new(
        Arc::clone(&ctx.embedder),
        Arc::clone(&ctx.clusterer),
        LabelExtractor::new(Arc::clone(&ctx.keywords), ctx.config.label_top_terms),
        Arc::clone(&ctx.lexicon),
        &ctx.config,
    ));
    let semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent_buckets));
    let multi_progress = ctx.progress.create_multi_progress();
    let pb = ctx
        .progress
        .bucket_bar(multi_progress.as_ref(), partition.buckets.len() as u64);

    let mut handles: Vec<(BucketReport, JoinHandle<BucketResult>)> = Vec::new();
    for bucket in partition.buckets {
        let placeholder = BucketReport {
            bucket: bucket.key.to_string(),
            reviews: bucket.reviews.len(),
            informative_reviews: bucket.informative_count(),
            outcome: BucketOutcome::Skipped,
        };
        let processor_clone = Arc::clone(&processor);
        let semaphore_clone = Arc::clone(&semaphore);
        let pb_clone = pb.clone();

        let handle: JoinHandle<BucketResult> = tokio::spawn(async move {
            let _permit = semaphore_clone.acquire_owned().await;
            let result = processor_clone.process(bucket).await;
            if let Some(pb) = &pb_clone {
                pb.set_message(format!("bucket {}", result.report.bucket));
                pb.inc(1);
            }
            result
        });
        handles.push((placeholder, handle));
    }

    let (placeholders, handles): (Vec<BucketReport>, Vec<JoinHandle<BucketResult>>) =
        handles.into_iter().unzip();
    let joined = join_all(handles).await;

    let mut results = Vec::with_capacity(joined.len());
    for (mut placeholder, outcome) in placeholders.into_iter().zip(joined) {
        match outcome {
            Ok(result) => results.push(result),
            Err(e) => {
                warn!("Bucket {} task failed: {}", placeholder.bucket, e);
                placeholder.outcome = BucketOutcome::Failed {
                    reason: format!("task failed: {}", e),
                };
                results.push(BucketResult {
                    clusters: Vec::new(),
                    labeled_reviews: Vec::new(),
                    report: placeholder,
                });
            }
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("all buckets processed");
    }
    results
}

/// Runs every stage after loading. Buckets are independent; one failing
/// never stops the others.
pub async fn run_on_tables(
    ctx: &RunContext,
    table: ReviewTable,
    releases: Vec<Release>,
) -> Result<RunSummary> {
    let app_name = ctx.profile.product.app_name();
    let mut stats = RunStats {
        reviews_loaded: table.reviews.len(),
        releases_loaded: releases.len(),
        ..RunStats::default()
    };

    let align_logger = StageLogger::new(PipelineStage::Align);
    align_logger.log_start(&ctx.run_id, app_name);
    let aligner = VersionAligner::from_releases(ctx.profile.strategy, &releases);
    stats.release_keys = aligner.release_key_count();
    if stats.release_keys == 0 {
        align_logger.log_warning("No usable release versions or dates; every review is unmatched");
    }

    let normalize_logger = StageLogger::new(PipelineStage::Normalize);
    normalize_logger.log_phase("Cleaning review text", None);
    let normalized = normalize_reviews(&table, ctx.normalizer.as_ref(), &aligner, &mut stats);
    normalize_logger.log_completion(&format!(
        "{} of {} reviews informative",
        stats.informative_reviews, stats.reviews_loaded
    ));

    let partition = aligner.partition(normalized);
    stats.bucketed_reviews = partition.bucketed_reviews();
    stats.buckets_total = partition.buckets.len();
    align_logger.log_completion(&format!(
        "{} reviews in {} buckets ({} unresolved, {} unmatched)",
        stats.bucketed_reviews,
        stats.buckets_total,
        stats.unresolved_reviews,
        stats.unmatched_reviews
    ));

    let cluster_logger = StageLogger::new(PipelineStage::Cluster);
    cluster_logger.log_phase(
        "Clustering buckets",
        Some(&format!(
            "{} buckets, up to {} at a time, embeddings via {}",
            stats.buckets_total,
            ctx.config.max_concurrent_buckets,
            ctx.embedder.name()
        )),
    );
    let results = process_buckets(ctx, partition).await;

    let mut assembler = OutputAssembler::new();
    for result in results {
        stats.absorb(&result.report);
        assembler.add(result);
    }
    let output = assembler.finish();
    stats.labeled_reviews = output.labeled_reviews.len();
    cluster_logger.log_completion(&format!(
        "{} clusters accepted",
        stats.clusters_accepted
    ));

    let output_logger = StageLogger::new(PipelineStage::Output);
    let summary_path = ctx.profile.summary_output_path();
    let labeled_reviews_path = ctx.profile.labeled_reviews_output_path();
    let report_path = ctx.profile.report_output_path();

    write_summary(&summary_path, &output.summary)?;
    write_labeled_reviews(&labeled_reviews_path, &table.headers, &output.labeled_reviews)?;
    if output.outcome == RunOutcome::NoClusters {
        output_logger.log_warning("No clusters accepted; wrote empty tables");
    }

    let report = RunReport {
        run_id: ctx.run_id.clone(),
        generated_at: Utc::now(),
        app_name: app_name.to_string(),
        strategy: ctx.profile.strategy,
        embedding_provider: ctx.embedder.name().to_string(),
        config: ctx.config.clone(),
        stats: stats.clone(),
        outcome: output.outcome,
        buckets: output.bucket_reports.clone(),
        outputs: vec![
            OutputDigest::of_file(&summary_path, output.summary.len())?,
            OutputDigest::of_file(&labeled_reviews_path, output.labeled_reviews.len())?,
        ],
    };
    report.write(&report_path)?;
    output_logger.log_completion(&format!(
        "wrote {} and {}",
        summary_path.display(),
        labeled_reviews_path.display()
    ));

    stats.log_summary();
    if ctx.progress.should_show_memory() {
        info!("Memory usage: {} MB", get_memory_usage().await);
    }

    Ok(RunSummary {
        run_id: ctx.run_id.clone(),
        outcome: output.outcome,
        stats,
        output,
        summary_path,
        labeled_reviews_path,
        report_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::models::{ClusterAssignment, Review};
    use crate::utils::products::Product;
    use crate::utils::pipeline_config::EmbeddingBackend;
    use ndarray::Array2;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    /// Rows whose first component is positive form group 0, the rest are noise.
    struct SignClusterer;

    impl Clusterer for SignClusterer {
        fn cluster(&self, vectors: &Array2<f32>, min_size: usize) -> Result<Vec<ClusterAssignment>> {
            let raw: Vec<Option<usize>> = vectors
                .rows()
                .into_iter()
                .map(|row| (row[0] > 0.0).then_some(0))
                .collect();
            Ok(crate::clustering::dbscan::compact_assignments(&raw, min_size))
        }
    }

    /// Long texts point one way, short texts the other.
    struct LengthEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| {
                    if t.split_whitespace().count() >= 5 {
                        vec![1.0, 0.0]
                    } else {
                        vec![-1.0, 0.0]
                    }
                })
                .collect())
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    fn context(dir: &Path, product: Product) -> RunContext {
        let profile = ProductProfile::new(product, dir, dir, &dir.join("Clusters"));
        RunContext {
            run_id: "test-run".to_string(),
            profile,
            config: PipelineConfig {
                max_concurrent_buckets: 2,
                ..PipelineConfig::default()
            },
            progress: ProgressConfig::disabled(),
            normalizer: Arc::new(BasicNormalizer),
            embedder: Arc::new(LengthEmbedder),
            clusterer: Arc::new(SignClusterer),
            keywords: Arc::new(NgramTfIdfExtractor::default()),
            lexicon: Arc::new(EnglishLexicon::bundled()),
        }
    }

    fn review(id: usize, version: &str, at: &str, rating: f64, content: &str) -> Review {
        Review {
            id,
            raw_version: Some(version.to_string()),
            raw_timestamp: Some(at.to_string()),
            rating: Some(rating),
            raw_content: Some(content.to_string()),
            raw_record: vec![
                rating.to_string(),
                at.to_string(),
                version.to_string(),
                content.to_string(),
            ],
        }
    }

    fn headers() -> Vec<String> {
        ["score", "at", "appVersion", "content"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn release(date: &str, version: &str) -> Release {
        Release {
            raw_date: Some(date.to_string()),
            raw_version: Some(version.to_string()),
            description: Some("Improvements".to_string()),
        }
    }

    fn crash_bucket_table() -> ReviewTable {
        let crash_texts = [
            "The app crashes on startup after update",
            "app crashes on startup after the update",
            "Since the update the app crashes on startup",
            "app crashes on startup after update every time",
            "after update app crashes on startup constantly",
            "The app crashes on startup after update 😡",
        ];
        let mut reviews: Vec<Review> = crash_texts
            .iter()
            .enumerate()
            .map(|(id, text)| review(id, "version 5.3 (1234)", "2021-03-02", (id % 2 + 1) as f64, text))
            .collect();
        for (offset, text) in ["good", "nice", "ok", "fine"].iter().enumerate() {
            reviews.push(review(6 + offset, "5.3", "2021-03-02", 5.0, text));
        }
        ReviewTable {
            headers: headers(),
            reviews,
        }
    }

    #[tokio::test]
    async fn test_crash_bucket_end_to_end() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), Product::Zoom);
        let releases = vec![release("2021-03-01", "Version 5.3"), release("2021-02-01", "5.2")];

        let summary = run_on_tables(&ctx, crash_bucket_table(), releases).await.unwrap();

        assert_eq!(
            summary.outcome,
            RunOutcome::Completed {
                clusters: 1,
                labeled_reviews: 6
            }
        );
        let row = &summary.output.summary[0];
        assert_eq!(row.version, "5.3");
        assert_eq!(row.num_reviews, 6);
        assert_eq!(row.avg_score, Some(1.5));
        assert!(row.cluster_label.contains("crashes startup"));

        let labeled_ids: Vec<usize> = summary
            .output
            .labeled_reviews
            .iter()
            .map(|r| r.review_id)
            .collect();
        assert_eq!(labeled_ids, vec![0, 1, 2, 3, 4, 5]);

        assert_eq!(summary.stats.reviews_loaded, 10);
        assert_eq!(summary.stats.informative_reviews, 6);
        assert_eq!(summary.stats.bucketed_reviews, 10);
        assert_eq!(summary.stats.buckets_skipped, 1);

        let labeled_csv = fs::read_to_string(&summary.labeled_reviews_path).unwrap();
        assert!(labeled_csv.starts_with("score,at,appVersion,content,clean_version,cluster,cluster_label\n"));
        assert!(!labeled_csv.contains(",good,"));
        assert!(summary.report_path.exists());
    }

    #[tokio::test]
    async fn test_four_qualifying_reviews_never_cluster() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), Product::Zoom);
        let mut table = crash_bucket_table();
        table.reviews.drain(0..2);

        let summary = run_on_tables(&ctx, table, vec![release("2021-03-01", "5.3")])
            .await
            .unwrap();

        assert_eq!(summary.outcome, RunOutcome::NoClusters);
        assert!(summary.output.summary.is_empty());
        assert_eq!(
            fs::read_to_string(&summary.summary_path).unwrap(),
            "version,cluster_id,cluster_label,num_reviews,avg_score\n"
        );
    }

    #[tokio::test]
    async fn test_date_keyed_buckets() {
        let dir = tempdir().unwrap();
        let ctx = context(dir.path(), Product::Firefox);
        let mut table = crash_bucket_table();
        for r in table.reviews.iter_mut() {
            r.raw_version = None;
            r.raw_timestamp = Some("2021-03-01 00:00:00".to_string());
        }
        table.reviews[9].raw_timestamp = Some("garbage".to_string());
        let releases = vec![release("2021-01-01", ""), release("2021-03-01", "")];

        let summary = run_on_tables(&ctx, table, releases).await.unwrap();

        assert_eq!(summary.output.summary.len(), 1);
        assert_eq!(summary.output.summary[0].version, "2021-03-01");
        assert_eq!(summary.stats.unresolved_reviews, 1);
        assert_eq!(summary.stats.buckets_total, 2);
    }

    #[tokio::test]
    async fn test_rerun_is_identical_with_deterministic_backends() {
        let dir = tempdir().unwrap();
        let mut ctx = context(dir.path(), Product::Zoom);
        ctx.embedder = Arc::new(HashingEmbedder::default());
        ctx.clusterer = Arc::new(DbscanClusterer::new(
            EmbeddingBackend::Hashing.default_dbscan_tolerance(),
        ));
        let releases = vec![release("2021-03-01", "5.3")];

        let first = run_on_tables(&ctx, crash_bucket_table(), releases.clone()).await.unwrap();
        assert_eq!(
            first.outcome,
            RunOutcome::Completed {
                clusters: 1,
                labeled_reviews: 6
            }
        );
        let first_summary = fs::read(&first.summary_path).unwrap();
        let first_labeled = fs::read(&first.labeled_reviews_path).unwrap();

        let second = run_on_tables(&ctx, crash_bucket_table(), releases).await.unwrap();
        assert_eq!(first.output.summary, second.output.summary);
        assert_eq!(first_summary, fs::read(&second.summary_path).unwrap());
        assert_eq!(first_labeled, fs::read(&second.labeled_reviews_path).unwrap());
    }
}
