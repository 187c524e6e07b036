use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use themes_lib::loading::load_releases;
use themes_lib::output::{build_timeline, write_timeline};
use themes_lib::utils::env::load_env;
use themes_lib::utils::products::{Product, ProductProfile};

#[derive(Parser)]
#[command(author, version, about = "Write per-release feature counts for a product", long_about = None)]
struct TimelineArgs {
    #[arg(value_enum)]
    product: Product,

    /// Directory holding <App>_releases.csv
    #[arg(long)]
    releases_dir: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    clusters_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    load_env();
    let args = TimelineArgs::parse();

    let mut profile = ProductProfile::from_env(args.product);
    if let Some(dir) = &args.releases_dir {
        profile.releases_path = dir.join(format!("{}_releases.csv", args.product.app_name()));
    }
    if let Some(dir) = args.clusters_dir {
        profile.clusters_dir = dir;
    }

    let releases = load_releases(&profile.releases_path, &profile.release_columns)
        .context("Failed to load releases")?;
    info!("📂 Loaded {} releases for {}", releases.len(), profile.product);

    let timeline = build_timeline(profile.strategy, &releases);
    let path = profile.timeline_output_path();
    write_timeline(&path, &timeline)?;
    info!(
        "🗓️  Wrote {} timeline entries ({}) to {}",
        timeline.len(),
        if profile.strategy.is_date_keyed() { "by release date" } else { "by version" },
        path.display()
    );
    Ok(())
}
