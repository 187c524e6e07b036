// src/utils/products.rs
//
// Static per-product configuration: which files to read, what the columns are
// called, and how reviews are aligned to releases.

use clap::ValueEnum;
use log::info;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::alignment::AlignmentStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Product {
    Zoom,
    Webex,
    Firefox,
}

impl Product {
    /// Display name, also used as the prefix of every file name.
    pub fn app_name(&self) -> &'static str {
        match self {
            Product::Zoom => "Zoom",
            Product::Webex => "Webex",
            Product::Firefox => "Firefox",
        }
    }

    /// Zoom review versions line up with release versions exactly, Webex reviews
    /// only carry major.minor, and Firefox reviews have no usable version at all.
    pub fn alignment_strategy(&self) -> AlignmentStrategy {
        match self {
            Product::Zoom => AlignmentStrategy::ExactVersion,
            Product::Webex => AlignmentStrategy::MajorMinor,
            Product::Firefox => AlignmentStrategy::ReleaseDate,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.app_name())
    }
}

/// Column names in the review export (Google Play scraper naming).
#[derive(Debug, Clone)]
pub struct ReviewColumns {
    pub rating: String,
    pub timestamp: String,
    pub version: String,
    pub content: String,
}

impl Default for ReviewColumns {
    fn default() -> Self {
        Self {
            rating: "score".to_string(),
            timestamp: "at".to_string(),
            version: "appVersion".to_string(),
            content: "content".to_string(),
        }
    }
}

/// Column names in the release log.
#[derive(Debug, Clone)]
pub struct ReleaseColumns {
    pub date: String,
    pub version: String,
    pub description: String,
}

impl Default for ReleaseColumns {
    fn default() -> Self {
        Self {
            date: "Release Date".to_string(),
            version: "Release Version".to_string(),
            description: "Feature Description".to_string(),
        }
    }
}

/// Everything the pipeline needs to know about one product's inputs and outputs.
#[derive(Debug, Clone)]
pub struct ProductProfile {
    pub product: Product,
    pub strategy: AlignmentStrategy,
    pub reviews_path: PathBuf,
    pub releases_path: PathBuf,
    pub clusters_dir: PathBuf,
    pub review_columns: ReviewColumns,
    pub release_columns: ReleaseColumns,
}

impl ProductProfile {
    pub fn new(
        product: Product,
        reviews_dir: &Path,
        releases_dir: &Path,
        clusters_dir: &Path,
    ) -> Self {
        let app = product.app_name();
        Self {
            product,
            strategy: product.alignment_strategy(),
            reviews_path: reviews_dir.join(format!("{}_reviews.csv", app)),
            releases_path: releases_dir.join(format!("{}_releases.csv", app)),
            clusters_dir: clusters_dir.to_path_buf(),
            review_columns: ReviewColumns::default(),
            release_columns: ReleaseColumns::default(),
        }
    }

    /// Directories default to `Reviews/`, `Releases/` and `Clusters/`, overridable
    /// through `REVIEWS_DIR`, `RELEASES_DIR` and `CLUSTERS_DIR`.
    pub fn from_env(product: Product) -> Self {
        let reviews_dir = env::var("REVIEWS_DIR").unwrap_or_else(|_| "Reviews".to_string());
        let releases_dir = env::var("RELEASES_DIR").unwrap_or_else(|_| "Releases".to_string());
        let clusters_dir = env::var("CLUSTERS_DIR").unwrap_or_else(|_| "Clusters".to_string());
        Self::new(
            product,
            Path::new(&reviews_dir),
            Path::new(&releases_dir),
            Path::new(&clusters_dir),
        )
    }

    pub fn summary_output_path(&self) -> PathBuf {
        self.clusters_dir
            .join(format!("{}_cluster_summary.csv", self.product.app_name()))
    }

    pub fn labeled_reviews_output_path(&self) -> PathBuf {
        self.clusters_dir
            .join(format!("{}_clustered_reviews_output.csv", self.product.app_name()))
    }

    pub fn report_output_path(&self) -> PathBuf {
        self.clusters_dir
            .join(format!("{}_run_report.json", self.product.app_name()))
    }

    pub fn timeline_output_path(&self) -> PathBuf {
        self.clusters_dir
            .join(format!("{}_release_timeline.csv", self.product.app_name()))
    }

    pub fn log_config(&self) {
        info!("📦 Product: {} (alignment: {})", self.product, self.strategy);
        info!("   Reviews:  {}", self.reviews_path.display());
        info!("   Releases: {}", self.releases_path.display());
        info!("   Output:   {}", self.clusters_dir.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_strategies() {
        assert_eq!(Product::Zoom.alignment_strategy(), AlignmentStrategy::ExactVersion);
        assert_eq!(Product::Webex.alignment_strategy(), AlignmentStrategy::MajorMinor);
        assert_eq!(Product::Firefox.alignment_strategy(), AlignmentStrategy::ReleaseDate);
    }

    #[test]
    fn test_profile_paths() {
        let profile = ProductProfile::new(
            Product::Webex,
            Path::new("in/reviews"),
            Path::new("in/releases"),
            Path::new("out"),
        );
        assert_eq!(profile.reviews_path, Path::new("in/reviews/Webex_reviews.csv"));
        assert_eq!(profile.releases_path, Path::new("in/releases/Webex_releases.csv"));
        assert_eq!(
            profile.summary_output_path(),
            Path::new("out/Webex_cluster_summary.csv")
        );
        assert_eq!(
            profile.labeled_reviews_output_path(),
            Path::new("out/Webex_clustered_reviews_output.csv")
        );
    }

    #[test]
    fn test_product_from_cli_name() {
        let product = Product::from_str("firefox", true).unwrap();
        assert_eq!(product, Product::Firefox);
        assert_eq!(product.to_string(), "Firefox");
    }
}
