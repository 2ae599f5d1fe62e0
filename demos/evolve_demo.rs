use evolvattention::attention::AttentionAnalyzer;
use evolvattention::config::{CrossoverMethod, EmbeddingConfig, EvolutionConfig};
use evolvattention::embedding::HashingEmbedder;
use evolvattention::engines::generation::{EvolutionEngine, ProgressCallback};
use evolvattention::vector::VectorIndex;
use std::env;
use std::sync::Arc;

/// Progress callback with elapsed time per generation
struct TimedProgressCallback {
    start_time: std::time::Instant,
}

impl ProgressCallback for TimedProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, average_fitness: f64) {
        println!(
            "Generation {}: Best = {:.4}, Avg = {:.4}, Time = {:.2}s",
            generation,
            best_fitness,
            average_fitness,
            self.start_time.elapsed().as_secs_f64()
        );
    }

    fn on_offspring_evaluated(&mut self, _evaluated: usize, _total: usize) {}
}

fn main() {
    env_logger::init();
    println!("=== EvolvAttention Demo ===\n");

    let args: Vec<String> = env::args().collect();
    let target = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "the quick brown fox jumps over the lazy dog".to_string());
    let population_size = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(50);
    let rounds: usize = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(5);
    let weighted = args.get(4).is_some_and(|s| s == "weighted");

    let config = EvolutionConfig {
        population_size,
        step_generations: 10,
        output_length: target.chars().count(),
        crossover_method: if weighted {
            CrossoverMethod::AttentionWeighted
        } else {
            CrossoverMethod::Naive
        },
        ..Default::default()
    };

    println!("Target: {:?}", target);
    println!("Population size: {}", population_size);
    println!("Crossover: {:?}\n", config.crossover_method);

    let index = VectorIndex::new(Arc::new(HashingEmbedder::default()), &EmbeddingConfig::default());
    let analyzer = AttentionAnalyzer::default();

    let mut engine = match EvolutionEngine::initialize(config, vec![target], &index, &analyzer) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Initialization failed: {}", e);
            std::process::exit(1);
        }
    };

    let mut callback = TimedProgressCallback {
        start_time: std::time::Instant::now(),
    };

    for _ in 0..rounds {
        if let Err(e) = engine.step_with(&index, &analyzer, &mut callback) {
            eprintln!("Evolution failed: {}", e);
            std::process::exit(1);
        }
    }

    let status = engine.status();
    println!("\nBest after {} generations: {:?}", status.generation, status.best_text);
    println!("\nHall of Fame:");
    for (rank, entry) in engine.hall_of_fame().get_all().iter().enumerate() {
        println!("  #{:<2} {:.6}  {:?}", rank + 1, entry.fitness, entry.text);
    }
}
