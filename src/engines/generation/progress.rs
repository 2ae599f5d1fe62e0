use super::evolution_engine::ProgressCallback;
use std::sync::mpsc::Sender;

/// Reports through the `log` facade; the default for session steps.
pub struct LogProgressCallback;

impl ProgressCallback for LogProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        log::debug!("Generation {} starting", generation);
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, average_fitness: f64) {
        log::info!(
            "Generation {} complete. Best fitness: {:.6}, average fitness: {:.6}",
            generation,
            best_fitness,
            average_fitness
        );
    }

    fn on_offspring_evaluated(&mut self, evaluated: usize, total: usize) {
        log::debug!("Evaluated {}/{} offspring", evaluated, total);
    }
}

pub struct ConsoleProgressCallback;

impl ProgressCallback for ConsoleProgressCallback {
    fn on_generation_start(&mut self, _generation: usize) {}

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, average_fitness: f64) {
        println!(
            "Generation {} complete. Best fitness: {:.4}, average: {:.4}",
            generation, best_fitness, average_fitness
        );
    }

    fn on_offspring_evaluated(&mut self, _evaluated: usize, _total: usize) {}
}

// For a request/UI layer polling progress from another thread
pub struct ChannelProgressCallback {
    sender: Sender<ProgressMessage>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMessage {
    GenerationStart(usize),
    GenerationComplete { generation: usize, best_fitness: f64, average_fitness: f64 },
    OffspringEvaluated { evaluated: usize, total: usize },
}

impl ChannelProgressCallback {
    pub fn new(sender: Sender<ProgressMessage>) -> Self {
        Self { sender }
    }
}

impl ProgressCallback for ChannelProgressCallback {
    fn on_generation_start(&mut self, generation: usize) {
        let _ = self.sender.send(ProgressMessage::GenerationStart(generation));
    }

    fn on_generation_complete(&mut self, generation: usize, best_fitness: f64, average_fitness: f64) {
        let _ = self.sender.send(ProgressMessage::GenerationComplete {
            generation,
            best_fitness,
            average_fitness,
        });
    }

    fn on_offspring_evaluated(&mut self, evaluated: usize, total: usize) {
        let _ = self.sender.send(ProgressMessage::OffspringEvaluated { evaluated, total });
    }
}
