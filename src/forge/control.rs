use crate::{
    config::{ForgeConfig, TimeoutCategory},
    error::Result,
    forge::connection::ForgeConnection,
    models::Progress,
};
use std::sync::Arc;

pub const IDLE_MESSAGE: &str = "Forge is idle: no generation in progress.";

#[derive(Clone)]
pub struct ControlClient {
    config: Arc<ForgeConfig>,
}

impl ControlClient {
    pub fn new(config: Arc<ForgeConfig>) -> Self {
        Self { config }
    }

    pub async fn progress(&self) -> Result<String> {
        let conn = ForgeConnection::open(&self.config, TimeoutCategory::Control)?;
        let progress: Progress = conn.get_json("/progress").await?;
        Ok(format_progress(&progress))
    }

    pub async fn interrupt(&self) -> Result<String> {
        let conn = ForgeConnection::open(&self.config, TimeoutCategory::Control)?;
        conn.post_unit("/interrupt", None).await?;
        log::info!("Interrupted the running generation");
        Ok("Generation interrupted.".to_string())
    }
}

pub fn format_progress(progress: &Progress) -> String {
    if progress.is_idle() {
        return IDLE_MESSAGE.to_string();
    }
    format!(
        "Generation in progress: {:.1}% complete\nCurrent job: {}\nETA: {:.1}s",
        progress.fraction() * 100.0,
        progress.job(),
        progress.eta_seconds()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_idle() {
        let progress: Progress = serde_json::from_value(json!({
            "progress": 0.0,
            "eta_relative": 0.0,
            "state": {"job": "", "job_count": 0}
        }))
        .unwrap();
        assert_eq!(format_progress(&progress), IDLE_MESSAGE);
        assert_eq!(format_progress(&Progress::default()), IDLE_MESSAGE);
    }

    #[test]
    fn test_running() {
        let progress: Progress = serde_json::from_value(json!({
            "progress": 0.4567,
            "eta_relative": 12.34,
            "state": {"job": "Batch 1 out of 2", "job_count": 2}
        }))
        .unwrap();
        assert_eq!(
            format_progress(&progress),
            "Generation in progress: 45.7% complete\nCurrent job: Batch 1 out of 2\nETA: 12.3s"
        );
    }

    #[test]
    fn test_queued_but_not_started() {
        let progress: Progress = serde_json::from_value(json!({
            "progress": 0,
            "eta_relative": null,
            "state": {"job_count": 1}
        }))
        .unwrap();
        assert_eq!(
            format_progress(&progress),
            "Generation in progress: 0.0% complete\nCurrent job: unknown\nETA: 0.0s"
        );
    }
}
