// src/clustering/mod.rs

pub mod bucket_clusterer;
pub mod dbscan;

use anyhow::Result;
use ndarray::Array2;

use crate::models::ClusterAssignment;

pub use bucket_clusterer::{BucketClusterer, BucketResult};
pub use dbscan::DbscanClusterer;

/// Density-based grouping of one bucket's embeddings. One row per review;
/// the result has one assignment per row, in row order.
pub trait Clusterer: Send + Sync {
    fn cluster(&self, vectors: &Array2<f32>, min_size: usize) -> Result<Vec<ClusterAssignment>>;
}
