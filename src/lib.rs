//! Evolutionary text search toward the semantic barycenter of a set of target
//! strings, with per-component attention analysis of candidate texts.

pub mod attention;
pub mod config;
pub mod embedding;
pub mod engines;
pub mod error;
pub mod session;
pub mod types;
pub mod vector;

pub use error::{EvolvError, Result};
pub use session::SessionController;
pub use types::{
    AttentionReport, Component, EvolutionStatus, Neighbor, PopulationEntry, PopulationSnapshot, Vector,
};
