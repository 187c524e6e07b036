// src/clustering/dbscan.rs

use anyhow::{Context, Result};
use linfa::prelude::*;
use linfa_clustering::Dbscan;
use ndarray::{Array2, Axis};
use std::collections::{BTreeMap, HashMap};

use crate::clustering::Clusterer;
use crate::models::ClusterAssignment;
use crate::utils::constants::DEFAULT_DBSCAN_TOLERANCE;

/// DBSCAN over L2-normalized vectors, so the tolerance is a chord distance
/// on the unit sphere.
#[derive(Debug, Clone, Copy)]
pub struct DbscanClusterer {
    tolerance: f32,
}

impl Default for DbscanClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_DBSCAN_TOLERANCE)
    }
}

impl DbscanClusterer {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }
}

fn l2_normalized(vectors: &Array2<f32>) -> Array2<f32> {
    let mut normalized = vectors.clone();
    for mut row in normalized.axis_iter_mut(Axis(0)) {
        let norm = row.dot(&row).sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
    normalized
}

/// Renumbers groups densely from 0 in order of first appearance and turns
/// groups below `min_size` into outliers.
pub fn compact_assignments(raw: &[Option<usize>], min_size: usize) -> Vec<ClusterAssignment> {
    let mut sizes: HashMap<usize, usize> = HashMap::new();
    for id in raw.iter().flatten() {
        *sizes.entry(*id).or_insert(0) += 1;
    }

    let mut renumbered: BTreeMap<usize, usize> = BTreeMap::new();
    let mut next_id = 0;
    raw.iter()
        .map(|label| match label {
            Some(id) if sizes.get(id).copied().unwrap_or(0) >= min_size => {
                let compact = *renumbered.entry(*id).or_insert_with(|| {
                    next_id += 1;
                    next_id - 1
                });
                ClusterAssignment::Member(compact)
            }
            _ => ClusterAssignment::Outlier,
        })
        .collect()
}

impl Clusterer for DbscanClusterer {
    fn cluster(&self, vectors: &Array2<f32>, min_size: usize) -> Result<Vec<ClusterAssignment>> {
        if vectors.nrows() == 0 {
            return Ok(Vec::new());
        }
        let normalized = l2_normalized(vectors);
        let labels = Dbscan::params(min_size.max(2))
            .tolerance(self.tolerance)
            .transform(&normalized)
            .context("DBSCAN clustering failed")?;

        let raw: Vec<Option<usize>> = labels.iter().copied().collect();
        Ok(compact_assignments(&raw, min_size))
    }
}
