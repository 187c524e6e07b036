use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Instant;
use themes_lib::models::stats_models::RunOutcome;
use themes_lib::pipeline::{run_pipeline, RunContext};
use themes_lib::utils::env::load_env;
use themes_lib::utils::pipeline_config::{EmbeddingBackend, PipelineConfig};
use themes_lib::utils::products::{Product, ProductProfile};
use themes_lib::utils::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about = "Cluster app reviews into labeled themes per release", long_about = None)]
struct Args {
    /// Product whose reviews and releases are processed
    #[arg(value_enum)]
    product: Product,

    /// Directory holding <App>_reviews.csv (default: $REVIEWS_DIR or Reviews)
    #[arg(long)]
    reviews_dir: Option<PathBuf>,

    /// Directory holding <App>_releases.csv (default: $RELEASES_DIR or Releases)
    #[arg(long)]
    releases_dir: Option<PathBuf>,

    /// Output directory (default: $CLUSTERS_DIR or Clusters)
    #[arg(long)]
    clusters_dir: Option<PathBuf>,

    /// Embedding backend: ollama or hashing (default: $EMBEDDING_BACKEND or ollama)
    #[arg(long)]
    embedding_backend: Option<EmbeddingBackend>,

    /// Disable progress bars
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = Args::parse();
    let start = Instant::now();
    info!("Starting review theme clustering for {}", args.product);

    let mut profile = ProductProfile::from_env(args.product);
    if let Some(dir) = &args.reviews_dir {
        profile.reviews_path = dir.join(format!("{}_reviews.csv", args.product.app_name()));
    }
    if let Some(dir) = &args.releases_dir {
        profile.releases_path = dir.join(format!("{}_releases.csv", args.product.app_name()));
    }
    if let Some(dir) = args.clusters_dir {
        profile.clusters_dir = dir;
    }
    profile.log_config();

    let backend_flag = args.embedding_backend.map(|b| b.as_str().to_string());
    let config = PipelineConfig::from_lookup(|key| match key {
        "EMBEDDING_BACKEND" if backend_flag.is_some() => backend_flag.clone(),
        _ => std::env::var(key).ok(),
    });
    config.log_config();

    let progress = if args.no_progress {
        ProgressConfig::disabled()
    } else {
        ProgressConfig::from_env()
    };

    let ctx = RunContext::from_config(profile, config, progress)
        .context("Failed to prepare pipeline run")?;
    let summary = run_pipeline(&ctx).await.context("Pipeline run failed")?;

    match summary.outcome {
        RunOutcome::Completed {
            clusters,
            labeled_reviews,
        } => {
            info!(
                "✅ {} clusters covering {} reviews saved to {} and {}",
                clusters,
                labeled_reviews,
                summary.summary_path.display(),
                summary.labeled_reviews_path.display()
            );
        }
        RunOutcome::NoClusters => {
            warn!(
                "🤷 No clusters survived filtering; empty tables written to {}",
                summary.summary_path.display()
            );
        }
    }
    info!("Run report: {}", summary.report_path.display());
    info!("Run {} finished in {:.2?}", summary.run_id, start.elapsed());
    Ok(())
}
