//! Candidate strings and the fitness-sorted population they live in.
//!
//! An `Individual` is only ever built from an evaluation, so its embedding and
//! fitness always describe its current text. A `Population` keeps its
//! individuals sorted best-first; ties keep their previous relative order.

use crate::types::{PopulationEntry, PopulationSnapshot, Vector};
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub struct Individual {
    text: String,
    embedding: Vector,
    fitness: f64,
    component_scores: Vec<f64>,
}

impl Individual {
    pub(crate) fn evaluated(text: String, embedding: Vector, fitness: f64) -> Self {
        Self {
            text,
            embedding,
            fitness,
            component_scores: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Per-word scores against the barycenter; empty unless the crossover needs them.
    pub fn component_scores(&self) -> &[f64] {
        &self.component_scores
    }

    pub(crate) fn set_component_scores(&mut self, scores: Vec<f64>) {
        self.component_scores = scores;
    }

    pub fn to_entry(&self) -> PopulationEntry {
        PopulationEntry {
            text: self.text.clone(),
            fitness: self.fitness,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Population {
    individuals: Vec<Individual>,
    target_barycenter: Vector,
    generation: usize,
    best_fitness: f64,
    average_fitness: f64,
    median_fitness: f64,
    fitness_history: Vec<f64>,
}

impl Population {
    /// Generation zero, with history seeded by its best fitness.
    pub(crate) fn new(individuals: Vec<Individual>, target_barycenter: Vector) -> Self {
        let mut population = Self {
            individuals,
            target_barycenter,
            generation: 0,
            best_fitness: 0.0,
            average_fitness: 0.0,
            median_fitness: 0.0,
            fitness_history: Vec::new(),
        };
        population.sort_by_fitness();
        population.refresh_statistics();
        population.fitness_history.push(population.best_fitness);
        population
    }

    /// The next generation built from `individuals`.
    pub(crate) fn successor(&self, individuals: Vec<Individual>) -> Self {
        let mut next = Self {
            individuals,
            target_barycenter: self.target_barycenter.clone(),
            generation: self.generation + 1,
            best_fitness: 0.0,
            average_fitness: 0.0,
            median_fitness: 0.0,
            fitness_history: self.fitness_history.clone(),
        };
        next.sort_by_fitness();
        next.refresh_statistics();
        next.fitness_history.push(next.best_fitness);
        next
    }

    // Vec::sort_by is stable
    fn sort_by_fitness(&mut self) {
        self.individuals
            .sort_by(|a, b| b.fitness.partial_cmp(&a.fitness).unwrap_or(Ordering::Equal));
    }

    fn refresh_statistics(&mut self) {
        let fitnesses: Vec<f64> = self.individuals.iter().map(|i| i.fitness).collect();
        let stats = FitnessStatistics::from_values(&fitnesses);
        self.best_fitness = stats.best;
        self.average_fitness = stats.average;
        self.median_fitness = stats.median;
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn best(&self) -> Option<&Individual> {
        self.individuals.first()
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn target_barycenter(&self) -> &[f32] {
        &self.target_barycenter
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    pub fn average_fitness(&self) -> f64 {
        self.average_fitness
    }

    pub fn median_fitness(&self) -> f64 {
        self.median_fitness
    }

    pub fn fitness_history(&self) -> &[f64] {
        &self.fitness_history
    }

    /// Change in best fitness over the last recorded generation
    pub fn convergence_rate(&self) -> f64 {
        match self.fitness_history.as_slice() {
            [.., previous, latest] => latest - previous,
            _ => 0.0,
        }
    }

    pub fn snapshot(&self) -> PopulationSnapshot {
        PopulationSnapshot {
            generation: self.generation,
            best_fitness: self.best_fitness,
            average_fitness: self.average_fitness,
            median_fitness: self.median_fitness,
            population: self.individuals.iter().map(Individual::to_entry).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessStatistics {
    pub best: f64,
    pub average: f64,
    /// Upper median: element `len / 2` of the ascending order
    pub median: f64,
}

impl FitnessStatistics {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self {
                best: 0.0,
                average: 0.0,
                median: 0.0,
            };
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

        Self {
            best: sorted[sorted.len() - 1],
            average: values.iter().sum::<f64>() / values.len() as f64,
            median: sorted[sorted.len() / 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn individual(text: &str, fitness: f64) -> Individual {
        Individual::evaluated(text.to_string(), vec![1.0], fitness)
    }

    #[test]
    fn test_new_population_sorted_and_seeded() {
        let population = Population::new(
            vec![individual("a", 0.2), individual("b", 0.9), individual("c", 0.5)],
            vec![1.0],
        );

        let texts: Vec<&str> = population.individuals().iter().map(|i| i.text()).collect();
        assert_eq!(texts, vec!["b", "c", "a"]);
        assert_eq!(population.generation(), 0);
        assert_eq!(population.fitness_history(), &[0.9]);
        assert_eq!(population.convergence_rate(), 0.0);
    }

    #[test]
    fn test_sort_is_stable_for_ties() {
        let population = Population::new(
            vec![individual("first", 0.5), individual("second", 0.5), individual("top", 0.7)],
            vec![1.0],
        );
        let texts: Vec<&str> = population.individuals().iter().map(|i| i.text()).collect();
        assert_eq!(texts, vec!["top", "first", "second"]);
    }

    #[test]
    fn test_successor_advances_history() {
        let population = Population::new(vec![individual("a", 0.4), individual("b", 0.3)], vec![1.0]);
        let next = population.successor(vec![individual("a", 0.4), individual("c", 0.6)]);

        assert_eq!(next.generation(), 1);
        assert_eq!(next.fitness_history(), &[0.4, 0.6]);
        assert!((next.convergence_rate() - 0.2).abs() < 1e-12);
        assert_eq!(next.best().map(|i| i.text()), Some("c"));
    }

    #[test]
    fn test_statistics_use_upper_median() {
        let stats = FitnessStatistics::from_values(&[0.1, 0.4, 0.2, 0.3]);
        assert_eq!(stats.best, 0.4);
        assert!((stats.average - 0.25).abs() < 1e-12);
        assert_eq!(stats.median, 0.3);
    }
}
