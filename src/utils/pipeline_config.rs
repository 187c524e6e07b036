// src/utils/pipeline_config.rs

use log::{info, warn};
use std::env;
use std::str::FromStr;

use crate::utils::constants::{
    DEFAULT_DBSCAN_TOLERANCE, DEFAULT_LABEL_VALIDITY_THRESHOLD, HASHING_DBSCAN_TOLERANCE,
    LABEL_TOP_TERMS, MIN_BUCKET_REVIEWS, MIN_CLUSTER_SIZE,
};

/// Which embedding capability backs the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// Sentence embeddings from a local Ollama server.
    Ollama,
    /// Deterministic offline feature hashing, no network.
    Hashing,
}

impl FromStr for EmbeddingBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(EmbeddingBackend::Ollama),
            "hashing" | "hash" | "offline" => Ok(EmbeddingBackend::Hashing),
            other => Err(anyhow::anyhow!("unknown embedding backend '{}'", other)),
        }
    }
}

impl EmbeddingBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingBackend::Ollama => "ollama",
            EmbeddingBackend::Hashing => "hashing",
        }
    }

    /// DBSCAN radius suited to how spread out this backend's vectors are.
    pub fn default_dbscan_tolerance(&self) -> f32 {
        match self {
            EmbeddingBackend::Ollama => DEFAULT_DBSCAN_TOLERANCE,
            EmbeddingBackend::Hashing => HASHING_DBSCAN_TOLERANCE,
        }
    }
}

/// Tunables of the clustering pipeline. None of these change which stages run,
/// only their thresholds and backends.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PipelineConfig {
    pub min_bucket_reviews: usize,
    pub min_cluster_size: usize,
    pub label_top_terms: usize,
    pub label_validity_threshold: f64,
    pub dbscan_tolerance: f32,
    pub max_concurrent_buckets: usize,
    pub embedding_backend: EmbeddingBackend,
    pub embedding_cache_capacity: usize,
    pub english_words_path: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_bucket_reviews: MIN_BUCKET_REVIEWS,
            min_cluster_size: MIN_CLUSTER_SIZE,
            label_top_terms: LABEL_TOP_TERMS,
            label_validity_threshold: DEFAULT_LABEL_VALIDITY_THRESHOLD,
            dbscan_tolerance: DEFAULT_DBSCAN_TOLERANCE,
            max_concurrent_buckets: num_cpus::get().min(8),
            embedding_backend: EmbeddingBackend::Ollama,
            embedding_cache_capacity: 50_000,
            english_words_path: "/usr/share/dict/words".to_string(),
        }
    }
}

fn env_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                warn!("Ignoring unparsable {}={:?}, using default", key, raw);
                default
            }
        },
        None => default,
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let embedding_backend = match lookup("EMBEDDING_BACKEND") {
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}; falling back to {:?}", e, defaults.embedding_backend);
                defaults.embedding_backend
            }),
            None => defaults.embedding_backend,
        };

        Self {
            min_bucket_reviews: env_or(&lookup, "MIN_BUCKET_REVIEWS", defaults.min_bucket_reviews).max(1),
            // DBSCAN rejects min_points < 2
            min_cluster_size: env_or(&lookup, "MIN_CLUSTER_SIZE", defaults.min_cluster_size).max(2),
            label_top_terms: env_or(&lookup, "LABEL_TOP_TERMS", defaults.label_top_terms).max(1),
            label_validity_threshold: env_or(
                &lookup,
                "LABEL_VALIDITY_THRESHOLD",
                defaults.label_validity_threshold,
            ),
            dbscan_tolerance: env_or(
                &lookup,
                "DBSCAN_TOLERANCE",
                embedding_backend.default_dbscan_tolerance(),
            ),
            max_concurrent_buckets: env_or(
                &lookup,
                "MAX_CONCURRENT_BUCKETS",
                defaults.max_concurrent_buckets,
            )
            .max(1),
            embedding_backend,
            embedding_cache_capacity: env_or(
                &lookup,
                "EMBEDDING_CACHE_CAPACITY",
                defaults.embedding_cache_capacity,
            ),
            english_words_path: lookup("ENGLISH_WORDS_PATH").unwrap_or(defaults.english_words_path),
        }
    }

    pub fn log_config(&self) {
        info!("⚙️  Pipeline configuration:");
        info!(
            "   Min informative reviews per bucket: {}, min cluster size: {}",
            self.min_bucket_reviews, self.min_cluster_size
        );
        info!(
            "   Label: top {} phrases, validity threshold {:.2}",
            self.label_top_terms, self.label_validity_threshold
        );
        info!(
            "   DBSCAN tolerance: {}, max concurrent buckets: {}",
            self.dbscan_tolerance, self.max_concurrent_buckets
        );
        info!(
            "   Embedding backend: {:?} (cache capacity {})",
            self.embedding_backend, self.embedding_cache_capacity
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.min_bucket_reviews, 5);
        assert_eq!(config.min_cluster_size, 5);
        assert_eq!(config.label_top_terms, 5);
        assert!((config.label_validity_threshold - 0.3).abs() < f64::EPSILON);
        assert!(config.max_concurrent_buckets >= 1);
        assert_eq!(config.embedding_backend, EmbeddingBackend::Ollama);
    }

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_lookup_config() {
        let config = PipelineConfig::from_lookup(lookup_from(&[
            ("MIN_CLUSTER_SIZE", "7"),
            ("LABEL_VALIDITY_THRESHOLD", "0.5"),
            ("EMBEDDING_BACKEND", "hashing"),
            ("MAX_CONCURRENT_BUCKETS", "not-a-number"),
        ]));
        assert_eq!(config.min_cluster_size, 7);
        assert!((config.label_validity_threshold - 0.5).abs() < f64::EPSILON);
        assert_eq!(config.embedding_backend, EmbeddingBackend::Hashing);
        assert_eq!(
            config.max_concurrent_buckets,
            PipelineConfig::default().max_concurrent_buckets
        );
    }

    #[test]
    fn test_min_cluster_size_is_floored() {
        let config = PipelineConfig::from_lookup(lookup_from(&[("MIN_CLUSTER_SIZE", "1")]));
        assert_eq!(config.min_cluster_size, 2);
    }

    #[test]
    fn test_tolerance_follows_backend() {
        let hashing = PipelineConfig::from_lookup(lookup_from(&[("EMBEDDING_BACKEND", "hashing")]));
        assert_eq!(hashing.dbscan_tolerance, HASHING_DBSCAN_TOLERANCE);

        let ollama = PipelineConfig::from_lookup(lookup_from(&[]));
        assert_eq!(ollama.dbscan_tolerance, DEFAULT_DBSCAN_TOLERANCE);

        let explicit = PipelineConfig::from_lookup(lookup_from(&[
            ("EMBEDDING_BACKEND", "hashing"),
            ("DBSCAN_TOLERANCE", "0.8"),
        ]));
        assert_eq!(explicit.dbscan_tolerance, 0.8);
    }

    #[test]
    fn test_backend_parsing() {
        assert_eq!("Ollama".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Ollama);
        assert_eq!("offline".parse::<EmbeddingBackend>().unwrap(), EmbeddingBackend::Hashing);
        assert!("bert".parse::<EmbeddingBackend>().is_err());
        for backend in [EmbeddingBackend::Ollama, EmbeddingBackend::Hashing] {
            assert_eq!(backend.as_str().parse::<EmbeddingBackend>().unwrap(), backend);
        }
    }
}
