use crate::{
    config::{ForgeConfig, TimeoutCategory},
    error::Result,
    forge::connection::ForgeConnection,
    models::{EmbeddingCatalog, Lora, Sampler, Upscaler, Vae},
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Read-only listings of what Forge has installed.
#[derive(Clone)]
pub struct AssetClient {
    config: Arc<ForgeConfig>,
}

impl AssetClient {
    pub fn new(config: Arc<ForgeConfig>) -> Self {
        Self { config }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let conn = ForgeConnection::open(&self.config, TimeoutCategory::Info)?;
        conn.get_json(path).await
    }

    pub async fn loras(&self) -> Result<String> {
        let loras: Vec<Lora> = self.fetch("/loras").await?;
        Ok(format_loras(&loras))
    }

    pub async fn samplers(&self) -> Result<String> {
        let samplers: Vec<Sampler> = self.fetch("/samplers").await?;
        let names: Vec<&str> = samplers.iter().map(|s| s.name.as_str()).collect();
        Ok(format_names("samplers", &names))
    }

    pub async fn embeddings(&self) -> Result<String> {
        let catalog: EmbeddingCatalog = self.fetch("/embeddings").await?;
        Ok(format_embeddings(&catalog))
    }

    pub async fn upscalers(&self) -> Result<String> {
        let upscalers: Vec<Upscaler> = self.fetch("/upscalers").await?;
        let names: Vec<&str> = upscalers.iter().map(|u| u.name.as_str()).collect();
        Ok(format_names("upscalers", &names))
    }

    pub async fn vaes(&self) -> Result<String> {
        let vaes: Vec<Vae> = self.fetch("/sd-vae").await?;
        let names: Vec<&str> = vaes.iter().map(|v| v.model_name.as_str()).collect();
        Ok(format_names("VAEs", &names))
    }
}

/// `Available <label>:` followed by one indented name per line.
pub fn format_names(label: &str, names: &[&str]) -> String {
    if names.is_empty() {
        return format!("No {} found.", label);
    }
    format!("Available {}:\n  {}", label, names.join("\n  "))
}

pub fn format_loras(loras: &[Lora]) -> String {
    if loras.is_empty() {
        return "No LoRAs found.".to_string();
    }
    let lines: Vec<String> = loras.iter().map(|l| format!("  {}", l.name)).collect();
    format!("Available LoRAs ({}):\n{}", loras.len(), lines.join("\n"))
}

pub fn format_embeddings(catalog: &EmbeddingCatalog) -> String {
    if catalog.is_empty() {
        return "No embeddings found.".to_string();
    }

    let loaded: Vec<&str> = catalog.loaded.keys().map(String::as_str).collect();
    let mut out = format!(
        "Loaded embeddings ({}): {}",
        loaded.len(),
        if loaded.is_empty() {
            "none".to_string()
        } else {
            loaded.join(", ")
        }
    );

    if !catalog.skipped.is_empty() {
        let skipped: Vec<&str> = catalog.skipped.keys().map(String::as_str).collect();
        out.push_str(&format!(
            "\nSkipped (incompatible) ({}): {}",
            skipped.len(),
            skipped.join(", ")
        ));
    }
    out
}
