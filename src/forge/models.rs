use crate::{
    config::{ForgeConfig, TimeoutCategory},
    error::Result,
    forge::connection::ForgeConnection,
    models::{OptionsSnapshot, SdModel},
};
use serde_json::json;
use std::sync::Arc;

/// Checkpoint listing, switching and rescans.
#[derive(Clone)]
pub struct ModelClient {
    config: Arc<ForgeConfig>,
}

impl ModelClient {
    pub fn new(config: Arc<ForgeConfig>) -> Self {
        Self { config }
    }

    pub async fn list(&self) -> Result<String> {
        let conn = ForgeConnection::open(&self.config, TimeoutCategory::Info)?;
        let models: Vec<SdModel> = conn.get_json("/sd-models").await?;
        Ok(format_models(&models))
    }

    pub async fn set(&self, title: &str) -> Result<String> {
        log::info!("Switching checkpoint to '{}'", title);
        let conn = ForgeConnection::open(&self.config, TimeoutCategory::ModelSwitch)?;
        conn.post_unit("/options", Some(&json!({ "sd_model_checkpoint": title })))
            .await?;
        Ok(format!(
            "Model switched to '{}'. Give Forge a moment to load it before generating.",
            title
        ))
    }

    pub async fn current(&self) -> Result<String> {
        let conn = ForgeConnection::open(&self.config, TimeoutCategory::Info)?;
        let options: OptionsSnapshot = conn.get_json("/options").await?;
        Ok(format!(
            "Current model: {}",
            options.sd_model_checkpoint.as_deref().unwrap_or("unknown")
        ))
    }

    /// Rescans checkpoints, then LoRAs. The second call runs whatever the first
    /// returned, and each outcome gets its own line.
    pub async fn refresh(&self) -> Result<String> {
        let conn = ForgeConnection::open(&self.config, TimeoutCategory::Info)?;

        let checkpoints = match conn.post_unit("/refresh-checkpoints", None).await {
            Ok(()) => "Checkpoints refreshed.".to_string(),
            Err(e) => e.to_string(),
        };
        let loras = match conn.post_unit("/refresh-loras", None).await {
            Ok(()) => "LoRAs refreshed.".to_string(),
            Err(e) => e.to_string(),
        };

        Ok(format!("{}\n{}", checkpoints, loras))
    }
}

pub fn format_models(models: &[SdModel]) -> String {
    if models.is_empty() {
        return "No models found.".to_string();
    }

    let lines: Vec<String> = models
        .iter()
        .enumerate()
        .map(|(i, m)| match &m.filename {
            Some(filename) => format!("  [{}] {}  ({})", i + 1, m.title, filename),
            None => format!("  [{}] {}", i + 1, m.title),
        })
        .collect();
    format!("Available models:\n{}", lines.join("\n"))
}
