use crate::attention::AttentionAnalyzer;
use crate::config::{ConfigSection, EvolutionConfig};
use crate::engines::evaluation::FitnessEvaluator;
use crate::engines::generation::{
    crossover::{crossover_for, CrossoverOperator},
    hall_of_fame::HallOfFame,
    individual::{Individual, Population},
    operators::{mutate, point_mutation, seed_variation, select_parents},
    progress::LogProgressCallback,
};
use crate::error::{EvolvError, Result};
use crate::types::{EvolutionStatus, PopulationEntry, PopulationSnapshot};
use crate::vector::VectorIndex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

pub trait ProgressCallback: Send {
    fn on_generation_start(&mut self, generation: usize);
    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, average_fitness: f64);
    fn on_offspring_evaluated(&mut self, evaluated: usize, total: usize);
}

/// One evolution session: configuration, target strings and the live population.
///
/// Every operation that changes the population builds the replacement fully
/// before swapping it in, so a failed step leaves the previous generation
/// intact.
pub struct EvolutionEngine {
    config: EvolutionConfig,
    target_strings: Vec<String>,
    crossover: Box<dyn CrossoverOperator>,
    population: Population,
    hall_of_fame: HallOfFame,
    rng: StdRng,
}

impl EvolutionEngine {
    /// Start a session with a random source seeded from `config.seed`, or entropy.
    pub fn initialize(
        config: EvolutionConfig,
        target_strings: Vec<String>,
        index: &VectorIndex,
        analyzer: &AttentionAnalyzer,
    ) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::initialize_with_rng(config, target_strings, index, analyzer, rng)
    }

    pub fn initialize_with_rng(
        config: EvolutionConfig,
        target_strings: Vec<String>,
        index: &VectorIndex,
        analyzer: &AttentionAnalyzer,
        mut rng: StdRng,
    ) -> Result<Self> {
        if target_strings.is_empty() {
            return Err(EvolvError::EmptyInput);
        }
        config.validate()?;

        let barycenter = index.barycenter(&target_strings)?;
        let crossover = crossover_for(config.crossover_method);

        let mut texts = Vec::with_capacity(config.population_size);
        for _ in 0..config.population_size {
            let seed = target_strings
                .choose(&mut rng)
                .ok_or(EvolvError::EmptyInput)?;
            texts.push(seed_variation(
                seed,
                config.output_length,
                config.char_mutation_rate,
                &mut rng,
            ));
        }

        let evaluator = FitnessEvaluator::new(index, &barycenter);
        let mut individuals = evaluator.evaluate(texts)?;
        if crossover.uses_component_scores() {
            evaluator.attach_component_scores(analyzer, &mut individuals);
        }

        let population = Population::new(individuals, barycenter);
        let mut hall_of_fame = HallOfFame::new(config.hall_of_fame_size);
        hall_of_fame.record(population.individuals());

        log::info!(
            "Population initialized with {} individuals from {} targets ({} crossover), best fitness: {:.6}",
            population.len(),
            target_strings.len(),
            crossover.name(),
            population.best_fitness()
        );

        Ok(Self {
            config,
            target_strings,
            crossover,
            population,
            hall_of_fame,
            rng,
        })
    }

    /// Advance `step_generations` generations, logging progress.
    pub fn step(&mut self, index: &VectorIndex, analyzer: &AttentionAnalyzer) -> Result<PopulationSnapshot> {
        self.step_with(index, analyzer, &mut LogProgressCallback)
    }

    pub fn step_with<C: ProgressCallback + ?Sized>(
        &mut self,
        index: &VectorIndex,
        analyzer: &AttentionAnalyzer,
        callback: &mut C,
    ) -> Result<PopulationSnapshot> {
        let mut staged = self.population.clone();
        let mut staged_hall = self.hall_of_fame.clone();
        let mut staged_rng = self.rng.clone();

        for _ in 0..self.config.step_generations {
            callback.on_generation_start(staged.generation() + 1);

            staged = self.next_generation(&staged, &mut staged_rng, index, analyzer, callback)?;
            staged_hall.record(staged.individuals());

            callback.on_generation_complete(
                staged.generation(),
                staged.best_fitness(),
                staged.average_fitness(),
            );
        }

        self.population = staged;
        self.hall_of_fame = staged_hall;
        self.rng = staged_rng;

        let stats = index.cache().stats();
        log::debug!(
            "Embedding cache: {} entries, {} pinned, hit rate {:.2}",
            stats.entries,
            stats.pinned,
            stats.hit_rate()
        );
        Ok(self.population.snapshot())
    }

    fn next_generation<C: ProgressCallback + ?Sized>(
        &self,
        current: &Population,
        rng: &mut StdRng,
        index: &VectorIndex,
        analyzer: &AttentionAnalyzer,
        callback: &mut C,
    ) -> Result<Population> {
        let parents = current.individuals();
        let elite_count = self.config.elite_size.min(parents.len());
        let offspring_count = self.config.population_size - elite_count;

        let mut offspring_texts = Vec::with_capacity(offspring_count);
        while offspring_texts.len() < offspring_count {
            let (first, second) = select_parents(parents, self.config.tournament_size, rng);
            let (parent1, parent2) = (&parents[first], &parents[second]);

            let mut text = if rng.gen_bool(self.config.crossover_rate) {
                self.crossover.crossover(parent1, parent2, rng)
            } else if rng.gen_bool(0.5) {
                parent1.text().to_string()
            } else {
                parent2.text().to_string()
            };

            if rng.gen_bool(self.config.mutation_rate) {
                let mutated = mutate(&text, self.config.char_mutation_rate, rng);
                text = if mutated == text {
                    point_mutation(&text, rng)
                } else {
                    mutated
                };
            }

            offspring_texts.push(text);
        }

        let evaluator = FitnessEvaluator::new(index, current.target_barycenter());
        let mut offspring = evaluator.evaluate(offspring_texts)?;
        if self.crossover.uses_component_scores() {
            evaluator.attach_component_scores(analyzer, &mut offspring);
        }
        callback.on_offspring_evaluated(offspring.len(), offspring_count);

        let mut next: Vec<Individual> = parents[..elite_count].to_vec();
        next.extend(offspring);
        Ok(current.successor(next))
    }

    pub fn status(&self) -> EvolutionStatus {
        let generation = self.population.generation();
        let best_fitness = self.population.best_fitness();
        EvolutionStatus {
            generation,
            best_fitness,
            convergence_rate: self.population.convergence_rate(),
            best_text: self
                .population
                .best()
                .map(|best| best.text().to_string())
                .unwrap_or_default(),
            is_complete: self.config.is_complete(generation, best_fitness),
        }
    }

    pub fn snapshot(&self) -> PopulationSnapshot {
        self.population.snapshot()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    pub fn target_strings(&self) -> &[String] {
        &self.target_strings
    }

    pub fn hall_of_fame(&self) -> &HallOfFame {
        &self.hall_of_fame
    }

    pub fn hall_of_fame_entries(&self) -> Vec<PopulationEntry> {
        self.hall_of_fame.get_all().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrossoverMethod, EmbeddingConfig};
    use crate::embedding::{EmbeddingProvider, HashingEmbedder};
    use crate::engines::generation::progress::{ChannelProgressCallback, ProgressMessage};
    use crate::types::Vector;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn index() -> VectorIndex {
        VectorIndex::new(Arc::new(HashingEmbedder::new(256)), &EmbeddingConfig::default())
    }

    fn config(population_size: usize, step_generations: usize, output_length: usize) -> EvolutionConfig {
        EvolutionConfig {
            population_size,
            step_generations,
            output_length,
            seed: Some(42),
            ..Default::default()
        }
    }

    fn targets(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    /// Hashing embedder that can be switched into a failing state
    struct SwitchableEmbedder {
        inner: HashingEmbedder,
        failing: AtomicBool,
    }

    impl EmbeddingProvider for SwitchableEmbedder {
        fn name(&self) -> &str {
            "switchable"
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vector>> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(EvolvError::Embedding("provider offline".to_string()));
            }
            self.inner.embed_batch(texts)
        }
    }

    #[test]
    fn test_initialize_population_sorted() {
        let index = index();
        let engine = EvolutionEngine::initialize(
            config(20, 3, 12),
            targets(&["hello world", "goodbye moon"]),
            &index,
            &AttentionAnalyzer::default(),
        )
        .unwrap();

        let population = engine.population();
        assert_eq!(population.len(), 20);
        assert_eq!(population.generation(), 0);
        assert_eq!(population.fitness_history().len(), 1);
        assert!(population
            .individuals()
            .windows(2)
            .all(|w| w[0].fitness() >= w[1].fitness()));
        assert!(population.individuals().iter().all(|i| !i.text().is_empty()));
    }

    #[test]
    fn test_initialize_rejects_bad_input() {
        let index = index();
        let analyzer = AttentionAnalyzer::default();

        let empty = EvolutionEngine::initialize(config(10, 1, 5), Vec::new(), &index, &analyzer);
        assert!(matches!(empty, Err(EvolvError::EmptyInput)));

        let small = EvolutionEngine::initialize(config(9, 1, 5), targets(&["abc"]), &index, &analyzer);
        assert!(matches!(small, Err(EvolvError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_step_advances_generation_and_keeps_best() {
        let index = index();
        let analyzer = AttentionAnalyzer::default();
        let mut engine =
            EvolutionEngine::initialize(config(12, 4, 11), targets(&["hello world"]), &index, &analyzer)
                .unwrap();

        let mut previous_best = engine.population().best_fitness();
        for round in 1..=3 {
            let snapshot = engine.step(&index, &analyzer).unwrap();
            assert_eq!(snapshot.generation, round * 4);
            assert_eq!(snapshot.population.len(), 12);
            assert!(snapshot.best_fitness >= previous_best);
            previous_best = snapshot.best_fitness;
        }
        assert_eq!(engine.population().fitness_history().len(), 13);
    }

    #[test]
    fn test_same_seed_same_evolution() {
        let analyzer = AttentionAnalyzer::default();
        let run = || {
            let index = index();
            let mut engine = EvolutionEngine::initialize_with_rng(
                config(10, 2, 8),
                targets(&["seeded run"]),
                &index,
                &analyzer,
                StdRng::seed_from_u64(7),
            )
            .unwrap();
            engine.step(&index, &analyzer).unwrap()
        };

        let a: Vec<String> = run().population.into_iter().map(|e| e.text).collect();
        let b: Vec<String> = run().population.into_iter().map(|e| e.text).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_failed_step_leaves_population_untouched() {
        let provider = Arc::new(SwitchableEmbedder {
            inner: HashingEmbedder::new(64),
            failing: AtomicBool::new(false),
        });
        let index = VectorIndex::new(provider.clone(), &EmbeddingConfig::default());
        let analyzer = AttentionAnalyzer::default();
        let mut engine =
            EvolutionEngine::initialize(config(10, 3, 20), targets(&["stable state"]), &index, &analyzer)
                .unwrap();
        let before = engine.snapshot();

        provider.failing.store(true, Ordering::SeqCst);
        assert!(matches!(engine.step(&index, &analyzer), Err(EvolvError::Embedding(_))));

        let after = engine.snapshot();
        assert_eq!(after.generation, before.generation);
        assert_eq!(after.population, before.population);
    }

    #[test]
    fn test_failed_step_does_not_consume_randomness() {
        let analyzer = AttentionAnalyzer::default();
        let switchable = Arc::new(SwitchableEmbedder {
            inner: HashingEmbedder::new(64),
            failing: AtomicBool::new(false),
        });
        let failing_index = VectorIndex::new(switchable.clone(), &EmbeddingConfig::default());
        let clean_index = VectorIndex::new(Arc::new(HashingEmbedder::new(64)), &EmbeddingConfig::default());

        let mut interrupted =
            EvolutionEngine::initialize(config(10, 2, 14), targets(&["replayable"]), &failing_index, &analyzer)
                .unwrap();
        let mut uninterrupted =
            EvolutionEngine::initialize(config(10, 2, 14), targets(&["replayable"]), &clean_index, &analyzer)
                .unwrap();

        switchable.failing.store(true, Ordering::SeqCst);
        assert!(interrupted.step(&failing_index, &analyzer).is_err());
        switchable.failing.store(false, Ordering::SeqCst);

        let resumed = interrupted.step(&failing_index, &analyzer).unwrap();
        let expected = uninterrupted.step(&clean_index, &analyzer).unwrap();
        assert_eq!(resumed.population, expected.population);
    }

    #[test]
    fn test_attention_weighted_engine_runs() {
        let index = index();
        let analyzer = AttentionAnalyzer::default();
        let config = EvolutionConfig {
            crossover_method: CrossoverMethod::AttentionWeighted,
            ..config(10, 2, 24)
        };
        let mut engine =
            EvolutionEngine::initialize(config, targets(&["quick brown fox"]), &index, &analyzer).unwrap();

        assert!(engine
            .population()
            .individuals()
            .iter()
            .any(|i| !i.component_scores().is_empty()));

        let snapshot = engine.step(&index, &analyzer).unwrap();
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.population.len(), 10);
    }

    #[test]
    fn test_progress_reported_per_generation() {
        let index = index();
        let analyzer = AttentionAnalyzer::default();
        let mut engine =
            EvolutionEngine::initialize(config(10, 3, 6), targets(&["abc"]), &index, &analyzer).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let mut callback = ChannelProgressCallback::new(tx);
        engine.step_with(&index, &analyzer, &mut callback).unwrap();
        drop(callback);

        let messages: Vec<ProgressMessage> = rx.iter().collect();
        let completed: Vec<usize> = messages
            .iter()
            .filter_map(|m| match m {
                ProgressMessage::GenerationComplete { generation, .. } => Some(*generation),
                _ => None,
            })
            .collect();
        assert_eq!(completed, vec![1, 2, 3]);
        assert_eq!(messages[0], ProgressMessage::GenerationStart(1));
    }

    #[test]
    fn test_progress_from_worker_thread() {
        let (tx, rx) = std::sync::mpsc::channel();
        let mut callback: Box<dyn ProgressCallback> = Box::new(ChannelProgressCallback::new(tx));

        let worker = std::thread::spawn(move || {
            let index = index();
            let analyzer = AttentionAnalyzer::default();
            let mut engine =
                EvolutionEngine::initialize(config(10, 2, 6), targets(&["threaded"]), &index, &analyzer)
                    .unwrap();
            engine.step_with(&index, &analyzer, &mut *callback).unwrap().generation
        });

        assert_eq!(worker.join().unwrap(), 2);
        let completed = rx
            .iter()
            .filter(|m| matches!(m, ProgressMessage::GenerationComplete { .. }))
            .count();
        assert_eq!(completed, 2);
    }

    #[test]
    fn test_status_and_hall_of_fame() {
        let index = index();
        let analyzer = AttentionAnalyzer::default();
        let mut engine =
            EvolutionEngine::initialize(config(10, 2, 10), targets(&["status check"]), &index, &analyzer)
                .unwrap();

        let status = engine.status();
        assert_eq!(status.generation, 0);
        assert_eq!(status.convergence_rate, 0.0);

        engine.step(&index, &analyzer).unwrap();
        let status = engine.status();
        let history = engine.population().fitness_history();
        assert_eq!(status.generation, 2);
        assert_eq!(status.best_text, engine.population().individuals()[0].text());
        assert!((status.convergence_rate - (history[2] - history[1])).abs() < 1e-12);

        let hall = engine.hall_of_fame_entries();
        assert!(!hall.is_empty() && hall.len() <= 10);
        assert!(hall[0].fitness >= status.best_fitness - 1e-12);
    }
}
