// src/embedding/cache.rs
//
// LRU cache in front of any embedding backend, keyed by the exact text.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use lru::LruCache;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use crate::embedding::EmbeddingProvider;

pub struct CachedEmbedder<P> {
    inner: P,
    cache: Option<Mutex<LruCache<String, Vec<f32>>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P: EmbeddingProvider> CachedEmbedder<P> {
    /// A capacity of zero disables caching.
    pub fn new(inner: P, capacity: usize) -> Self {
        Self {
            inner,
            cache: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// (hits, misses) since creation.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let Some(cache) = &self.cache else {
            return self.inner.embed(texts).await;
        };

        let mut found: HashMap<String, Vec<f32>> = HashMap::new();
        let mut missing: Vec<String> = Vec::new();
        {
            let mut pending: HashSet<&str> = HashSet::new();
            let mut guard = cache.lock().await;
            for text in texts {
                if found.contains_key(text) || pending.contains(text.as_str()) {
                    continue;
                }
                match guard.get(text) {
                    Some(vector) => {
                        found.insert(text.clone(), vector.clone());
                    }
                    None => {
                        pending.insert(text.as_str());
                        missing.push(text.clone());
                    }
                }
            }
        }

        self.hits.fetch_add(found.len(), Ordering::Relaxed);
        self.misses.fetch_add(missing.len(), Ordering::Relaxed);

        if !missing.is_empty() {
            let fresh = self.inner.embed(&missing).await?;
            if fresh.len() != missing.len() {
                anyhow::bail!(
                    "{} returned {} embeddings for {} inputs",
                    self.inner.name(),
                    fresh.len(),
                    missing.len()
                );
            }
            let mut guard = cache.lock().await;
            for (text, vector) in missing.into_iter().zip(fresh) {
                guard.put(text.clone(), vector.clone());
                found.insert(text, vector);
            }
        }

        let (hits, misses) = self.stats();
        debug!("Embedding cache: {} hits, {} misses so far", hits, misses);

        texts
            .iter()
            .map(|t| {
                found
                    .get(t)
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("missing embedding for text {:?}", t))
            })
            .collect()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
