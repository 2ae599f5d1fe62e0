use serde::{Deserialize, Serialize};

/// Dense embedding vector. Stored L2-normalized once it leaves the index.
pub type Vector = Vec<f32>;

/// One scored sub-component of an analyzed string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub text: String,
    pub position: usize,
    pub score: f64,
}

/// Result of an attention analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttentionReport {
    pub components: Vec<Component>,
    pub overall_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationEntry {
    pub text: String,
    pub fitness: f64,
}

/// Population view returned by initialize and step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub generation: usize,
    pub best_fitness: f64,
    pub average_fitness: f64,
    pub median_fitness: f64,
    pub population: Vec<PopulationEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionStatus {
    pub generation: usize,
    pub best_fitness: f64,
    pub convergence_rate: f64,
    pub best_text: String,
    pub is_complete: bool,
}

/// Nearest-neighbor hit from a corpus search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub position: usize,
    pub text: String,
    pub score: f64,
}
