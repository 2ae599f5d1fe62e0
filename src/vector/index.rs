use crate::config::EmbeddingConfig;
use crate::embedding::{EmbeddingCache, EmbeddingProvider};
use crate::error::{EvolvError, Result};
use crate::types::{Neighbor, Vector};
use crate::vector::math;
use crate::vector::neighbors::rank_neighbors;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Embedding front-end: batching, normalization, caching and similarity.
///
/// Every vector handed out by [`VectorIndex::embed`] is unit length. Provider
/// calls only happen for cache misses, de-duplicated and chunked to
/// `batch_size` texts per call.
pub struct VectorIndex {
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    batch_size: usize,
}

impl VectorIndex {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, config: &EmbeddingConfig) -> Self {
        Self {
            provider,
            cache: EmbeddingCache::new(config.cache_capacity),
            batch_size: config.batch_size.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    /// Normalized embeddings for `texts`, in input order.
    pub fn embed(&self, texts: &[String]) -> Result<Vec<Vector>> {
        let cached = self.cache.get_many(texts);

        let mut seen = HashSet::new();
        let mut misses = Vec::new();
        for (text, hit) in texts.iter().zip(&cached) {
            if hit.is_none() && seen.insert(text.as_str()) {
                misses.push(text.clone());
            }
        }

        log::debug!(
            "Embedding {} texts ({} cache misses) with {}",
            texts.len(),
            misses.len(),
            self.provider.name()
        );

        let fresh = self.embed_uncached(&misses)?;
        if !fresh.is_empty() {
            self.cache.insert_batch(
                fresh
                    .iter()
                    .map(|(text, vector)| (text.clone(), vector.clone()))
                    .collect(),
            );
        }

        texts
            .iter()
            .zip(cached)
            .map(|(text, hit)| match hit {
                Some(vector) => Ok(vector),
                None => fresh.get(text).cloned().ok_or_else(|| {
                    EvolvError::Embedding(format!("no embedding produced for {:?}", text))
                }),
            })
            .collect()
    }

    pub fn embed_one(&self, text: &str) -> Result<Vector> {
        self.embed(&[text.to_string()])?
            .pop()
            .ok_or_else(|| EvolvError::Embedding("provider returned no vectors".to_string()))
    }

    // All chunks must succeed before anything is returned for caching.
    fn embed_uncached(&self, texts: &[String]) -> Result<HashMap<String, Vector>> {
        let dimension = self.provider.dimension();
        let mut fresh = HashMap::with_capacity(texts.len());

        for chunk in texts.chunks(self.batch_size) {
            let raw = self.provider.embed_batch(chunk)?;
            if raw.len() != chunk.len() {
                return Err(EvolvError::Embedding(format!(
                    "provider returned {} vectors for {} texts",
                    raw.len(),
                    chunk.len()
                )));
            }
            for (text, vector) in chunk.iter().zip(raw) {
                math::check_dimensions(dimension, vector.len())?;
                fresh.insert(text.clone(), math::normalize(&vector)?);
            }
        }

        Ok(fresh)
    }

    pub fn normalize(v: &[f32]) -> Result<Vector> {
        math::normalize(v)
    }

    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
        math::cosine_similarity(a, b)
    }

    /// Normalized mean of the embeddings of `texts`.
    pub fn barycenter(&self, texts: &[String]) -> Result<Vector> {
        if texts.is_empty() {
            return Err(EvolvError::EmptyInput);
        }
        let vectors = self.embed(texts)?;
        math::normalize(&math::mean(&vectors)?)
    }

    /// Run `f` with `texts` pinned alongside the current pins.
    ///
    /// On success `texts` become the whole pinned set; on failure the previous
    /// set is restored. Pinning first keeps their vectors out of the LRU while
    /// `f` embeds them.
    pub fn with_pinned<T>(&self, texts: &[String], f: impl FnOnce() -> Result<T>) -> Result<T> {
        let previous = self.cache.pinned_keys();
        self.cache.pin_also(texts);
        match f() {
            Ok(value) => {
                self.cache.set_pinned(texts);
                Ok(value)
            }
            Err(e) => {
                self.cache.set_pinned(&previous);
                Err(e)
            }
        }
    }

    pub fn similarity_to(&self, text: &str, target: &[f32]) -> Result<f64> {
        let vector = self.embed_one(text)?;
        math::cosine_similarity(&vector, target)
    }

    /// Similarity of each string to `target`, in input order.
    pub fn similarities(&self, strings: &[String], target: &[f32]) -> Result<Vec<f64>> {
        let vectors = self.embed(strings)?;
        Self::score_all(&vectors, target)
    }

    pub fn score_all(vectors: &[Vector], target: &[f32]) -> Result<Vec<f64>> {
        vectors
            .iter()
            .map(|vector| math::cosine_similarity(vector, target))
            .collect()
    }

    /// Sequential k-nearest search that embeds the corpus on demand.
    ///
    /// Ranks exactly like [`crate::vector::CorpusIndex::search`].
    pub fn linear_scan(&self, corpus: &[String], query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        let query = math::normalize(query)?;
        let vectors = self.embed(corpus)?;

        let mut scored = Vec::with_capacity(vectors.len());
        for (position, vector) in vectors.iter().enumerate() {
            math::check_dimensions(query.len(), vector.len())?;
            scored.push((position, math::unit_similarity(vector, &query)));
        }

        Ok(rank_neighbors(scored, k, |position| corpus[position].clone()))
    }
}
