use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvolvError {
    #[error("Empty input: at least one string is required")]
    EmptyInput,

    #[error("Degenerate vector: norm is too close to zero to normalize")]
    DegenerateVector,

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding failure: {0}")]
    Embedding(String),

    #[error("No barycenter has been set")]
    NoBarycenter,

    #[error("No active evolution session")]
    NoActiveSession,

    #[error("No corpus has been loaded")]
    NoCorpus,

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, EvolvError>;
