use super::traits::{ConfigManifest, ConfigSection, FieldManifest};
use crate::error::EvolvError;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    pub granularity: ComponentGranularity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentGranularity {
    #[default]
    Word,
    Sentence,
}

impl ConfigSection for AttentionConfig {
    fn section_name() -> &'static str {
        "attention"
    }

    fn validate(&self) -> Result<(), EvolvError> {
        Ok(())
    }

    fn to_manifest(&self) -> ConfigManifest {
        ConfigManifest {
            section: "Attention".to_string(),
            fields: vec![FieldManifest::new(
                "granularity",
                "enum",
                json!(self.granularity),
                (None, None),
                "word or sentence decomposition",
            )],
        }
    }
}
