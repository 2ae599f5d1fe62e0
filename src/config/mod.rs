pub mod traits;
pub mod evolution;
pub mod embedding;
pub mod attention;
pub mod manager;

pub use manager::{ConfigManager, AppConfig};
pub use evolution::{EvolutionConfig, CrossoverMethod};
pub use embedding::EmbeddingConfig;
pub use attention::{AttentionConfig, ComponentGranularity};
pub use traits::{ConfigSection, ConfigManifest, FieldManifest};
