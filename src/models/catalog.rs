use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Entry of `GET /sd-models`.
#[derive(Debug, Clone, Deserialize)]
pub struct SdModel {
    pub title: String,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Lora {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sampler {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Upscaler {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Vae {
    pub model_name: String,
}

/// `GET /embeddings` keys both maps by embedding name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddingCatalog {
    #[serde(default)]
    pub loaded: BTreeMap<String, Value>,
    #[serde(default)]
    pub skipped: BTreeMap<String, Value>,
}

impl EmbeddingCatalog {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.skipped.is_empty()
    }
}

/// The slice of `GET /options` this crate reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OptionsSnapshot {
    #[serde(default)]
    pub sd_model_checkpoint: Option<String>,
}
