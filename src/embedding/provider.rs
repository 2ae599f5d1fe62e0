use crate::error::Result;
use crate::types::Vector;
use rayon::prelude::*;

/// Source of raw (not necessarily normalized) sentence embeddings.
///
/// Implementations receive whole batches so a model-backed provider can run
/// one forward pass per call. Every returned vector must have `dimension()`
/// entries and the output order must match `texts`.
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &str;
    fn dimension(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>>;
}

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic feature-hashing embedder.
///
/// Lowercased word unigrams and boundary-padded character trigrams are hashed
/// into signed buckets. Texts sharing words or spelling land close together,
/// which is enough signal to drive the evolution without a neural model. The
/// empty string has no features and embeds to the zero vector.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension: dimension.max(1) }
    }

    pub fn embed_one(&self, text: &str) -> Vector {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();

        for word in lowered.split_whitespace() {
            self.accumulate(&mut vector, b'w', word, WORD_WEIGHT);
        }

        let padded: Vec<char> = std::iter::once(' ')
            .chain(lowered.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            let trigram: String = window.iter().collect();
            self.accumulate(&mut vector, b'c', &trigram, TRIGRAM_WEIGHT);
        }

        vector
    }

    fn accumulate(&self, vector: &mut [f32], namespace: u8, feature: &str, weight: f32) {
        let hash = fnv1a(namespace, feature.as_bytes());
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(384)
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
        Ok(texts.par_iter().map(|text| self.embed_one(text)).collect())
    }
}

// FNV-1a, stable across runs and platforms
fn fnv1a(namespace: u8, bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let mut hash = (OFFSET ^ namespace as u64).wrapping_mul(PRIME);
    for byte in bytes {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_deterministic() {
        let embedder = HashingEmbedder::new(64);
        assert_eq!(embedder.embed_one("hello world"), embedder.embed_one("hello world"));
        assert_eq!(embedder.embed_one("Hello World"), embedder.embed_one("hello world"));
    }

    #[test]
    fn test_batch_preserves_order_and_dimension() {
        let embedder = HashingEmbedder::new(32);
        let texts = vec!["alpha".to_string(), "beta".to_string(), "alpha".to_string()];
        let vectors = embedder.embed_batch(&texts).unwrap();

        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == 32));
        assert_eq!(vectors[0], vectors[2]);
        assert_ne!(vectors[0], vectors[1]);
    }

    #[test]
    fn test_empty_text_has_no_features() {
        let embedder = HashingEmbedder::default();
        assert!(embedder.embed_one("").iter().all(|x| *x == 0.0));
        assert!(embedder.embed_one(" ").iter().any(|x| *x != 0.0));
    }
}
