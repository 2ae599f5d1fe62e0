use crate::attention::AttentionAnalyzer;
use crate::engines::generation::individual::Individual;
use crate::error::Result;
use crate::vector::VectorIndex;

/// Scores candidate texts against a fixed barycenter.
///
/// A whole generation goes through one [`VectorIndex::embed`] call, so the
/// provider sees at most one batch per `batch_size` new texts.
pub struct FitnessEvaluator<'a> {
    index: &'a VectorIndex,
    target: &'a [f32],
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(index: &'a VectorIndex, target: &'a [f32]) -> Self {
        Self { index, target }
    }

    pub fn evaluate(&self, texts: Vec<String>) -> Result<Vec<Individual>> {
        let embeddings = self.index.embed(&texts)?;
        let fitnesses = VectorIndex::score_all(&embeddings, self.target)?;

        Ok(texts
            .into_iter()
            .zip(embeddings)
            .zip(fitnesses)
            .map(|((text, embedding), fitness)| Individual::evaluated(text, embedding, fitness))
            .collect())
    }

    /// Attach per-word scores to individuals that do not have them yet.
    pub fn attach_component_scores(&self, analyzer: &AttentionAnalyzer, individuals: &mut [Individual]) {
        let pending: Vec<usize> = individuals
            .iter()
            .enumerate()
            .filter(|(_, individual)| individual.component_scores().is_empty())
            .map(|(i, _)| i)
            .collect();
        if pending.is_empty() {
            return;
        }

        let texts: Vec<String> = pending
            .iter()
            .map(|&i| individuals[i].text().to_string())
            .collect();
        let scores = analyzer.component_scores(self.index, &texts, self.target);

        for (i, row) in pending.into_iter().zip(scores) {
            individuals[i].set_component_scores(row);
        }
    }
}
