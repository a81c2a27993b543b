//! Memoizing wrapper around any embedding provider.
//!
//! Embedding is a pure function of the text, so a cache keyed by exact text
//! can be shared process-wide without affecting results.

use crate::{EmbeddingError, EmbeddingProvider, EmbeddingResult, check_batch_len};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Hit/miss counters for a `CachedEmbedder`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Caches vectors from an inner provider by exact text
pub struct CachedEmbedder<P> {
    inner: P,
    cache: Mutex<HashMap<String, Vec<f32>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P: EmbeddingProvider> CachedEmbedder<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.lock().len(),
        }
    }

    // A poisoned map is still a valid memo table
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<f32>>> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        if let Some(vector) = self.lock().get(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(vector.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let vector = self.inner.embed(text)?;
        self.lock().insert(text.to_string(), vector.clone());
        Ok(vector)
    }

    /// Forwards only the distinct cache misses to the inner provider, in a
    /// single batch call.
    fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let misses: Vec<&str> = {
            let cache = self.lock();
            let mut seen: HashSet<&str> = HashSet::new();
            let mut misses: Vec<&str> = Vec::new();
            for text in texts {
                if !cache.contains_key(*text) && seen.insert(*text) {
                    misses.push(*text);
                }
            }
            misses
        };

        self.hits
            .fetch_add(texts.len() - misses.len(), Ordering::Relaxed);
        self.misses.fetch_add(misses.len(), Ordering::Relaxed);

        if !misses.is_empty() {
            debug!(
                "Embedding cache: {} of {} texts missing",
                misses.len(),
                texts.len()
            );
            let computed = self.inner.embed_batch(&misses)?;
            check_batch_len(misses.len(), &computed)?;

            let mut cache = self.lock();
            for (text, vector) in misses.iter().zip(computed) {
                cache.insert((*text).to_string(), vector);
            }
        }

        let cache = self.lock();
        texts
            .iter()
            .map(|text| {
                cache.get(*text).cloned().ok_or_else(|| {
                    EmbeddingError::InvalidResponse(format!(
                        "no vector cached for {:?}",
                        text
                    ))
                })
            })
            .collect()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }
}
