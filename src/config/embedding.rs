use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::error::EvolvError;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub dimension: usize,
    /// Maximum number of texts sent to the provider in one call
    pub batch_size: usize,
    /// Cache entry limit, 0 means unbounded
    pub cache_capacity: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimension: 384,
            batch_size: 256,
            cache_capacity: 0,
        }
    }
}

impl ConfigSection for EmbeddingConfig {
    fn section_name() -> &'static str {
        "embedding"
    }

    fn validate(&self) -> Result<(), EvolvError> {
        if self.dimension == 0 {
            return Err(EvolvError::InvalidConfiguration(
                "Embedding dimension must be positive".to_string(),
            ));
        }
        if self.batch_size == 0 {
            return Err(EvolvError::InvalidConfiguration(
                "Embedding batch size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Embedding".to_string(),
            fields: vec![
                FieldManifest::new(
                    "dimension",
                    "integer",
                    json!(self.dimension),
                    (Some(1.0), None),
                    "Length of vectors produced by the hashing embedder",
                ),
                FieldManifest::new(
                    "batch_size",
                    "integer",
                    json!(self.batch_size),
                    (Some(1.0), None),
                    "Texts per embedding provider call",
                ),
                FieldManifest::new(
                    "cache_capacity",
                    "integer",
                    json!(self.cache_capacity),
                    (Some(0.0), None),
                    "Embedding cache entry limit (0 = unbounded)",
                ),
            ],
        }
    }
}
