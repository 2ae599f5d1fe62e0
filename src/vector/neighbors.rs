use crate::error::{EvolvError, Result};
use crate::types::Neighbor;
use crate::vector::{math, VectorIndex};
use rayon::prelude::*;
use std::cmp::Ordering;

/// Sort by score descending, ties by corpus position, and keep the top `k`.
pub(crate) fn rank_neighbors<F>(mut scored: Vec<(usize, f64)>, k: usize, text_at: F) -> Vec<Neighbor>
where
    F: Fn(usize) -> String,
{
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(k);
    scored
        .into_iter()
        .map(|(position, score)| Neighbor {
            position,
            text: text_at(position),
            score,
        })
        .collect()
}

/// Pre-embedded fixed corpus stored as one contiguous row-major matrix.
pub struct CorpusIndex {
    texts: Vec<String>,
    matrix: Vec<f32>,
    dimension: usize,
}

impl CorpusIndex {
    pub fn build(index: &VectorIndex, corpus: Vec<String>) -> Result<Self> {
        if corpus.is_empty() {
            return Err(EvolvError::EmptyInput);
        }
        let vectors = index.embed(&corpus)?;
        let dimension = index.dimension();

        let mut matrix = Vec::with_capacity(dimension * vectors.len());
        for vector in &vectors {
            math::check_dimensions(dimension, vector.len())?;
            matrix.extend_from_slice(vector);
        }

        log::info!("Built corpus index over {} texts", corpus.len());
        Ok(Self {
            texts: corpus,
            matrix,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.texts
    }

    /// The `k` corpus entries closest to `query`.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        math::check_dimensions(self.dimension, query.len())?;
        let query = math::normalize(query)?;

        let scored: Vec<(usize, f64)> = self
            .matrix
            .par_chunks(self.dimension)
            .enumerate()
            .map(|(position, row)| (position, math::unit_similarity(row, &query)))
            .collect();

        Ok(rank_neighbors(scored, k, |position| self.texts[position].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmbeddingConfig;
    use crate::embedding::HashingEmbedder;
    use std::sync::Arc;

    fn corpus() -> Vec<String> {
        ["the quick brown fox", "lazy dogs sleep", "quick foxes jump", "completely unrelated"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_rank_neighbors_breaks_ties_by_position() {
        let ranked = rank_neighbors(vec![(2, 0.5), (0, 0.5), (1, 0.9)], 3, |p| p.to_string());
        let positions: Vec<usize> = ranked.iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 0, 2]);
    }

    #[test]
    fn test_search_matches_linear_scan() {
        let index = VectorIndex::new(Arc::new(HashingEmbedder::new(128)), &EmbeddingConfig::default());
        let corpus_index = CorpusIndex::build(&index, corpus()).unwrap();
        let query = index.embed_one("quick fox").unwrap();

        let indexed = corpus_index.search(&query, 3).unwrap();
        let scanned = index.linear_scan(&corpus(), &query, 3).unwrap();

        assert_eq!(indexed, scanned);
        assert_eq!(indexed.len(), 3);
        assert!(indexed.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_build_rejects_empty_corpus() {
        let index = VectorIndex::new(Arc::new(HashingEmbedder::new(16)), &EmbeddingConfig::default());
        assert!(matches!(CorpusIndex::build(&index, Vec::new()), Err(EvolvError::EmptyInput)));
    }
}
