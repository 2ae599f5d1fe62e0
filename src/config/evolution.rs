use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::error::EvolvError;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const MIN_POPULATION_SIZE: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub step_generations: usize,
    pub output_length: usize,
    pub elite_size: usize,
    pub tournament_size: usize,
    pub crossover_rate: f64,
    pub mutation_rate: f64,
    /// Per-character edit probability once an offspring is picked for mutation
    pub char_mutation_rate: f64,
    pub max_generations: Option<usize>,
    pub target_fitness: f64,
    pub crossover_method: CrossoverMethod,
    pub hall_of_fame_size: usize,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMethod {
    Naive,
    AttentionWeighted,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            step_generations: 10,
            output_length: 100,
            elite_size: 5,
            tournament_size: 3,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
            char_mutation_rate: 0.05,
            max_generations: None,
            target_fitness: 1.0,
            crossover_method: CrossoverMethod::Naive,
            hall_of_fame_size: 10,
            seed: None,
        }
    }
}

impl EvolutionConfig {
    /// Session parameters supplied by an initialize call, keeping the rest
    pub fn for_session(&self, population_size: usize, step_generations: usize, output_length: usize) -> Self {
        Self {
            population_size,
            step_generations,
            output_length,
            ..self.clone()
        }
    }

    /// Whether the termination policy is satisfied
    pub fn is_complete(&self, generation: usize, best_fitness: f64) -> bool {
        let max_reached = self.max_generations.is_some_and(|max| generation >= max);
        max_reached || best_fitness >= self.target_fitness
    }
}

fn check_rate(name: &str, value: f64) -> Result<(), EvolvError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EvolvError::InvalidConfiguration(format!(
            "{} must be between 0 and 1, got {}",
            name, value
        )));
    }
    Ok(())
}

impl ConfigSection for EvolutionConfig {
    fn section_name() -> &'static str {
        "evolution"
    }

    fn validate(&self) -> Result<(), EvolvError> {
        if self.population_size < MIN_POPULATION_SIZE {
            return Err(EvolvError::InvalidConfiguration(format!(
                "Population size must be at least {}, got {}",
                MIN_POPULATION_SIZE, self.population_size
            )));
        }
        if self.step_generations == 0 {
            return Err(EvolvError::InvalidConfiguration(
                "Step generations must be positive".to_string(),
            ));
        }
        if self.output_length == 0 {
            return Err(EvolvError::InvalidConfiguration(
                "Output length must be positive".to_string(),
            ));
        }
        if self.elite_size == 0 || self.elite_size >= self.population_size {
            return Err(EvolvError::InvalidConfiguration(format!(
                "Elite size must be in 1..{}, got {}",
                self.population_size, self.elite_size
            )));
        }
        // A tournament spanning the whole population always crowns the same
        // winner, so two distinct parents could never be drawn.
        if self.tournament_size == 0 || self.tournament_size >= self.population_size {
            return Err(EvolvError::InvalidConfiguration(format!(
                "Tournament size must be in 1..{}, got {}",
                self.population_size, self.tournament_size
            )));
        }
        check_rate("Crossover rate", self.crossover_rate)?;
        check_rate("Mutation rate", self.mutation_rate)?;
        check_rate("Character mutation rate", self.char_mutation_rate)?;
        if !self.target_fitness.is_finite() {
            return Err(EvolvError::InvalidConfiguration(
                "Target fitness must be finite".to_string(),
            ));
        }
        if self.hall_of_fame_size == 0 {
            return Err(EvolvError::InvalidConfiguration(
                "Hall of fame size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Evolution".to_string(),
            fields: vec![
                FieldManifest::new(
                    "population_size",
                    "integer",
                    json!(self.population_size),
                    (Some(MIN_POPULATION_SIZE as f64), Some(10000.0)),
                    "Number of candidate strings in the population",
                ),
                FieldManifest::new(
                    "step_generations",
                    "integer",
                    json!(self.step_generations),
                    (Some(1.0), None),
                    "Generations advanced by one step call",
                ),
                FieldManifest::new(
                    "output_length",
                    "integer",
                    json!(self.output_length),
                    (Some(1.0), None),
                    "Approximate length of generated strings",
                ),
                FieldManifest::new(
                    "elite_size",
                    "integer",
                    json!(self.elite_size),
                    (Some(1.0), None),
                    "Best individuals copied unchanged into each generation",
                ),
                FieldManifest::new(
                    "tournament_size",
                    "integer",
                    json!(self.tournament_size),
                    (Some(1.0), None),
                    "Individuals drawn per tournament",
                ),
                FieldManifest::new(
                    "crossover_rate",
                    "float",
                    json!(self.crossover_rate),
                    (Some(0.0), Some(1.0)),
                    "Probability an offspring comes from crossover",
                ),
                FieldManifest::new(
                    "mutation_rate",
                    "float",
                    json!(self.mutation_rate),
                    (Some(0.0), Some(1.0)),
                    "Probability an offspring is mutated",
                ),
                FieldManifest::new(
                    "char_mutation_rate",
                    "float",
                    json!(self.char_mutation_rate),
                    (Some(0.0), Some(1.0)),
                    "Per-character edit probability inside a mutation",
                ),
                FieldManifest::new(
                    "max_generations",
                    "integer",
                    json!(self.max_generations),
                    (Some(1.0), None),
                    "Generation count at which the session reports completion",
                ),
                FieldManifest::new(
                    "target_fitness",
                    "float",
                    json!(self.target_fitness),
                    (Some(0.0), Some(1.0)),
                    "Best fitness at which the session reports completion",
                ),
                FieldManifest::new(
                    "crossover_method",
                    "enum",
                    json!(self.crossover_method),
                    (None, None),
                    "naive or attention_weighted",
                ),
                FieldManifest::new(
                    "hall_of_fame_size",
                    "integer",
                    json!(self.hall_of_fame_size),
                    (Some(1.0), None),
                    "Distinct best-ever strings retained",
                ),
                FieldManifest::new(
                    "seed",
                    "integer",
                    json!(self.seed),
                    (None, None),
                    "Random seed for reproducible runs",
                ),
            ],
        }
    }
}
