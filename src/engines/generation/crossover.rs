use crate::attention::split_words;
use crate::config::CrossoverMethod;
use crate::engines::generation::individual::Individual;
use rand::{Rng, RngCore};

/// Recombines two parents into one offspring text.
pub trait CrossoverOperator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether parents must carry per-word component scores
    fn uses_component_scores(&self) -> bool {
        false
    }

    fn crossover(&self, parent1: &Individual, parent2: &Individual, rng: &mut dyn RngCore) -> String;
}

pub fn crossover_for(method: CrossoverMethod) -> Box<dyn CrossoverOperator> {
    match method {
        CrossoverMethod::Naive => Box::new(NaiveCharacterCrossover),
        CrossoverMethod::AttentionWeighted => Box::new(AttentionWeightedCrossover),
    }
}

/// Uniform character crossover.
///
/// Each position takes either parent's character with equal probability;
/// past the end of the shorter parent only the longer one contributes, so the
/// offspring is as long as the longer parent.
pub fn character_crossover<R: Rng + ?Sized>(text1: &str, text2: &str, rng: &mut R) -> String {
    let chars1: Vec<char> = text1.chars().collect();
    let chars2: Vec<char> = text2.chars().collect();
    let len = chars1.len().max(chars2.len());

    (0..len)
        .filter_map(|i| match (chars1.get(i), chars2.get(i)) {
            (Some(a), Some(b)) => Some(if rng.gen_bool(0.5) { *a } else { *b }),
            (Some(a), None) => Some(*a),
            (None, Some(b)) => Some(*b),
            (None, None) => None,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NaiveCharacterCrossover;

impl CrossoverOperator for NaiveCharacterCrossover {
    fn name(&self) -> &'static str {
        "naive"
    }

    fn crossover(&self, parent1: &Individual, parent2: &Individual, rng: &mut dyn RngCore) -> String {
        character_crossover(parent1.text(), parent2.text(), rng)
    }
}

/// Word-level crossover biased toward the better-aligned word in each slot.
///
/// For every word position the word with the higher component score is kept
/// with probability `0.5 + score gap`, capped at 1. Slots past the shorter
/// parent come from the longer one. Parents without usable scores fall back
/// to [`character_crossover`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AttentionWeightedCrossover;

impl CrossoverOperator for AttentionWeightedCrossover {
    fn name(&self) -> &'static str {
        "attention_weighted"
    }

    fn uses_component_scores(&self) -> bool {
        true
    }

    fn crossover(&self, parent1: &Individual, parent2: &Individual, rng: &mut dyn RngCore) -> String {
        let words1 = split_words(parent1.text());
        let words2 = split_words(parent2.text());
        let scores1 = parent1.component_scores();
        let scores2 = parent2.component_scores();

        if words1.is_empty()
            || words2.is_empty()
            || words1.len() != scores1.len()
            || words2.len() != scores2.len()
        {
            return character_crossover(parent1.text(), parent2.text(), rng);
        }

        let slots = words1.len().max(words2.len());
        let mut chosen: Vec<&str> = Vec::with_capacity(slots);

        for i in 0..slots {
            let word = match (words1.get(i), words2.get(i)) {
                (Some(a), Some(b)) => {
                    let (better, worse, gap) = if scores1[i] >= scores2[i] {
                        (a, b, scores1[i] - scores2[i])
                    } else {
                        (b, a, scores2[i] - scores1[i])
                    };
                    if rng.gen_bool((0.5 + gap).min(1.0)) {
                        better
                    } else {
                        worse
                    }
                }
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => continue,
            };
            chosen.push(word);
        }

        chosen.join(" ")
    }
}
