use super::{
    attention::AttentionConfig,
    embedding::EmbeddingConfig,
    evolution::EvolutionConfig,
    traits::{ConfigManifest, ConfigSection},
};
use crate::error::EvolvError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Prefix for environment overrides, e.g. `EVOLVATTENTION__EVOLUTION__SEED=7`
pub const ENV_PREFIX: &str = "EVOLVATTENTION";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub evolution: EvolutionConfig,
    pub embedding: EmbeddingConfig,
    pub attention: AttentionConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), EvolvError> {
        self.evolution.validate()?;
        self.embedding.validate()?;
        self.attention.validate()?;
        Ok(())
    }

    pub fn manifests(&self) -> Vec<ConfigManifest> {
        vec![
            self.evolution.to_manifest(),
            self.embedding.to_manifest(),
            self.attention.to_manifest(),
        ]
    }
}

pub struct ConfigManager {
    config: Arc<RwLock<AppConfig>>,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    pub fn new() -> Self {
        Self {
            config: Arc::new(RwLock::new(AppConfig::default())),
        }
    }

    /// Load a TOML or JSON file, then apply `EVOLVATTENTION__*` environment overrides.
    pub fn load_from_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvolvError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EvolvError::InvalidConfiguration(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let config: AppConfig = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        log::info!("Loaded configuration from {}", path.display());

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = config;
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), EvolvError> {
        let config = self.get();
        let toml_str = toml::to_string_pretty(&config).map_err(|e| {
            EvolvError::InvalidConfiguration(format!("Failed to serialize: {}", e))
        })?;

        std::fs::write(path, toml_str)?;
        Ok(())
    }

    pub fn get(&self) -> AppConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply `f` to a copy and commit it only if the result validates.
    pub fn update<F>(&self, f: F) -> Result<(), EvolvError>
    where
        F: FnOnce(&mut AppConfig),
    {
        let mut config = self.config.write().unwrap_or_else(PoisonError::into_inner);
        let mut staged = config.clone();
        f(&mut staged);
        staged.validate()?;
        *config = staged;
        Ok(())
    }

    pub fn manifests(&self) -> Vec<ConfigManifest> {
        self.get().manifests()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_rolls_back_invalid_change() {
        let manager = ConfigManager::new();
        let result = manager.update(|c| c.evolution.population_size = 3);
        assert!(result.is_err());
        assert_eq!(manager.get().evolution.population_size, 50);

        manager
            .update(|c| c.evolution.population_size = 20)
            .unwrap();
        assert_eq!(manager.get().evolution.population_size, 20);
    }

    #[test]
    fn test_manifests_cover_every_section() {
        let sections: Vec<String> = ConfigManager::new()
            .manifests()
            .into_iter()
            .map(|m| m.section)
            .collect();
        assert_eq!(sections, vec!["Evolution", "Embedding", "Attention"]);
    }
}
