// src/embedding/mod.rs

pub mod cache;
pub mod hashing;
pub mod ollama;

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::utils::pipeline_config::{EmbeddingBackend, PipelineConfig};

pub use cache::CachedEmbedder;
pub use hashing::HashingEmbedder;
pub use ollama::{OllamaConfig, OllamaEmbedder};

/// Maps cleaned review texts to fixed-length vectors.
///
/// The output has one vector per input, in input order, all of the same length.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn name(&self) -> &str;
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<P> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        (**self).embed(texts).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Builds the configured backend behind an LRU cache.
pub fn build_provider(config: &PipelineConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let provider: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
        EmbeddingBackend::Ollama => {
            let ollama_config = OllamaConfig::from_env()?;
            ollama_config.log_config();
            Arc::new(CachedEmbedder::new(
                OllamaEmbedder::new(ollama_config)?,
                config.embedding_cache_capacity,
            ))
        }
        EmbeddingBackend::Hashing => Arc::new(CachedEmbedder::new(
            HashingEmbedder::default(),
            config.embedding_cache_capacity,
        )),
    };
    Ok(provider)
}
