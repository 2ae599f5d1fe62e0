pub mod individual;
pub mod operators;
pub mod crossover;
pub mod hall_of_fame;
pub mod evolution_engine;
pub mod progress;

pub use individual::{FitnessStatistics, Individual, Population};
pub use crossover::{
    crossover_for, AttentionWeightedCrossover, CrossoverOperator, NaiveCharacterCrossover,
};
pub use hall_of_fame::HallOfFame;
pub use evolution_engine::{EvolutionEngine, ProgressCallback};
pub use progress::{
    ChannelProgressCallback, ConsoleProgressCallback, LogProgressCallback, ProgressMessage,
};
