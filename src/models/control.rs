use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Progress {
    /// 0.0 to 1.0
    #[serde(default)]
    pub progress: Option<f64>,
    /// Seconds remaining, as estimated by Forge.
    #[serde(default)]
    pub eta_relative: Option<f64>,
    #[serde(default)]
    pub state: Option<ProgressState>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProgressState {
    #[serde(default)]
    pub job: Option<String>,
    #[serde(default)]
    pub job_count: Option<i64>,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        self.progress.unwrap_or(0.0)
    }

    pub fn eta_seconds(&self) -> f64 {
        self.eta_relative.unwrap_or(0.0)
    }

    pub fn job_count(&self) -> i64 {
        self.state.as_ref().and_then(|s| s.job_count).unwrap_or(0)
    }

    pub fn job(&self) -> &str {
        self.state
            .as_ref()
            .and_then(|s| s.job.as_deref())
            .filter(|job| !job.is_empty())
            .unwrap_or("unknown")
    }

    /// Nothing running and nothing queued.
    pub fn is_idle(&self) -> bool {
        self.fraction() == 0.0 && self.job_count() == 0
    }
}
