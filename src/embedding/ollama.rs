// src/embedding/ollama.rs
//
// Sentence embeddings from a local Ollama server (`POST /api/embed`).

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use url::Url;

use crate::embedding::EmbeddingProvider;

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub base_url: Url,
    pub model: String,
    pub timeout: Duration,
    pub batch_size: usize,
}

impl OllamaConfig {
    pub fn from_env() -> Result<Self> {
        let raw_url = env::var("OLLAMA_URL").unwrap_or_else(|_| "http://localhost:11434".to_string());
        let base_url = Url::parse(&raw_url)
            .with_context(|| format!("OLLAMA_URL is not a valid URL: {}", raw_url))?;

        Ok(Self {
            base_url,
            model: env::var("OLLAMA_EMBED_MODEL").unwrap_or_else(|_| "all-minilm".to_string()),
            timeout: Duration::from_secs(
                env::var("OLLAMA_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(120),
            ),
            batch_size: env::var("OLLAMA_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(64)
                .clamp(1, 512),
        })
    }

    pub fn embed_endpoint(&self) -> Result<Url> {
        self.base_url
            .join("api/embed")
            .context("Failed to build Ollama embed endpoint")
    }

    pub fn log_config(&self) {
        info!(
            "🤖 Ollama embeddings: model {} at {} (batch {}, timeout {:?})",
            self.model, self.base_url, self.batch_size, self.timeout
        );
    }
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

pub struct OllamaEmbedder {
    client: Client,
    config: OllamaConfig,
    endpoint: Url,
}

impl OllamaEmbedder {
    pub fn new(config: OllamaConfig) -> Result<Self> {
        let endpoint = config.embed_endpoint()?;
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client for Ollama")?;
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> Result<Vec<Vec<f32>>> {
        let started = Instant::now();
        let request = EmbedRequest {
            model: &self.config.model,
            input: batch,
        };

        let response = timeout(
            self.config.timeout,
            self.client.post(self.endpoint.clone()).json(&request).send(),
        )
        .await
        .with_context(|| format!("Ollama embedding timed out after {:?}", self.config.timeout))?
        .context("Failed to send embedding request to Ollama")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Ollama returned status {}: {}", status, body);
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .context("Failed to parse Ollama embedding response")?;

        if parsed.embeddings.len() != batch.len() {
            anyhow::bail!(
                "Ollama returned {} embeddings for {} inputs",
                parsed.embeddings.len(),
                batch.len()
            );
        }

        debug!(
            "Ollama embed batch: {} texts in {}ms",
            batch.len(),
            started.elapsed().as_millis()
        );
        Ok(parsed.embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.config.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        Ok(vectors)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embed_endpoint_joins_path() {
        let config = OllamaConfig {
            base_url: Url::parse("http://localhost:11434").unwrap(),
            model: "all-minilm".to_string(),
            timeout: Duration::from_secs(5),
            batch_size: 8,
        };
        assert_eq!(
            config.embed_endpoint().unwrap().as_str(),
            "http://localhost:11434/api/embed"
        );
    }

    #[test]
    fn test_request_shape() {
        let input = vec!["app crashes on startup".to_string()];
        let request = EmbedRequest {
            model: "all-minilm",
            input: &input,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "all-minilm");
        assert_eq!(json["input"][0], "app crashes on startup");
    }

    #[tokio::test]
    async fn test_empty_input_makes_no_request() {
        let config = OllamaConfig {
            base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            model: "all-minilm".to_string(),
            timeout: Duration::from_secs(1),
            batch_size: 8,
        };
        let embedder = OllamaEmbedder::new(config).unwrap();
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}
