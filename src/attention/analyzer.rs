use crate::config::{AttentionConfig, ComponentGranularity};
use crate::error::{EvolvError, Result};
use crate::types::{AttentionReport, Component};
use crate::vector::VectorIndex;

/// Whitespace-delimited tokens
pub fn split_words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Sentences ending in `.`, `!` or `?`; a trailing unterminated fragment counts too.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let sentence = current.trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }

    let rest = current.trim();
    if !rest.is_empty() {
        sentences.push(rest.to_string());
    }
    sentences
}

/// Scores the parts of a string against a target direction.
///
/// Each component is embedded on its own, so a score reflects the local
/// meaning of that fragment and not its interaction with neighbours. The
/// overall score is the similarity of the whole string and generally differs
/// from the mean of the component scores.
#[derive(Debug, Clone, Default)]
pub struct AttentionAnalyzer {
    granularity: ComponentGranularity,
}

impl AttentionAnalyzer {
    pub fn new(config: &AttentionConfig) -> Self {
        Self {
            granularity: config.granularity,
        }
    }

    pub fn granularity(&self) -> ComponentGranularity {
        self.granularity
    }

    pub fn decompose(&self, text: &str) -> Vec<String> {
        match self.granularity {
            ComponentGranularity::Word => split_words(text),
            ComponentGranularity::Sentence => split_sentences(text),
        }
    }

    pub fn analyze(&self, index: &VectorIndex, text: &str, target: &[f32]) -> Result<AttentionReport> {
        if text.trim().is_empty() {
            return Err(EvolvError::EmptyInput);
        }

        let whole = index.embed_one(text)?;
        let overall_score = VectorIndex::cosine_similarity(&whole, target)?;

        let parts = self.decompose(text);
        let scores = score_parts(index, &parts, target);
        let components = parts
            .into_iter()
            .zip(scores)
            .enumerate()
            .map(|(position, (text, score))| Component { text, position, score })
            .collect();

        Ok(AttentionReport {
            components,
            overall_score,
        })
    }

    /// Word-level scores for many texts with a single batched embedding pass.
    ///
    /// Output rows align with `split_words` of the corresponding text.
    pub fn component_scores(&self, index: &VectorIndex, texts: &[String], target: &[f32]) -> Vec<Vec<f64>> {
        let tokenized: Vec<Vec<String>> = texts.iter().map(|t| split_words(t)).collect();
        let flat: Vec<String> = tokenized.iter().flatten().cloned().collect();
        let mut scores = score_parts(index, &flat, target).into_iter();

        tokenized
            .iter()
            .map(|tokens| scores.by_ref().take(tokens.len()).collect())
            .collect()
    }
}

// A component that cannot be embedded scores 0.0 instead of failing the analysis.
fn score_parts(index: &VectorIndex, parts: &[String], target: &[f32]) -> Vec<f64> {
    if parts.is_empty() {
        return Vec::new();
    }

    match index.similarities(parts, target) {
        Ok(scores) => scores,
        Err(batch_err) => {
            log::warn!(
                "Batched component scoring failed ({}), scoring {} components individually",
                batch_err,
                parts.len()
            );
            parts
                .iter()
                .map(|part| {
                    index.similarity_to(part, target).unwrap_or_else(|e| {
                        log::warn!("Component {:?} could not be scored: {}", part, e);
                        0.0
                    })
                })
                .collect()
        }
    }
}
