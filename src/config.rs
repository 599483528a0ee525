use crate::error::{ForgeError, Result};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_FORGE_URL: &str = "http://127.0.0.1:7860";
pub const DEFAULT_OUTPUT_DIR_NAME: &str = "outputs";

/// Which timeout budget a request runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutCategory {
    /// txt2img, img2img, inpaint, upscale
    Generation,
    /// checkpoint switching; large models load slowly
    ModelSwitch,
    /// listings and other lightweight reads
    Info,
    /// progress and interrupt
    Control,
}

impl TimeoutCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeoutCategory::Generation => "generation",
            TimeoutCategory::ModelSwitch => "model-switch",
            TimeoutCategory::Info => "info",
            TimeoutCategory::Control => "control",
        }
    }
}

impl fmt::Display for TimeoutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeouts {
    pub generation: Duration,
    pub model_switch: Duration,
    pub info: Duration,
    pub control: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Timeouts {
            generation: Duration::from_secs(300),
            model_switch: Duration::from_secs(120),
            info: Duration::from_secs(30),
            control: Duration::from_secs(10),
        }
    }
}

impl Timeouts {
    pub fn for_category(&self, category: TimeoutCategory) -> Duration {
        match category {
            TimeoutCategory::Generation => self.generation,
            TimeoutCategory::ModelSwitch => self.model_switch,
            TimeoutCategory::Info => self.info,
            TimeoutCategory::Control => self.control,
        }
    }

    pub fn with(mut self, category: TimeoutCategory, timeout: Duration) -> Self {
        match category {
            TimeoutCategory::Generation => self.generation = timeout,
            TimeoutCategory::ModelSwitch => self.model_switch = timeout,
            TimeoutCategory::Info => self.info = timeout,
            TimeoutCategory::Control => self.control = timeout,
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct ForgeConfig {
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeouts: Timeouts,
    pub output_dir: PathBuf,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        ForgeConfig {
            base_url: DEFAULT_FORGE_URL.to_string(),
            username: None,
            password: None,
            timeouts: Timeouts::default(),
            output_dir: default_output_dir(),
        }
    }
}

impl ForgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = ForgeConfig::default();

        if let Some(url) = get("FORGE_URL") {
            config = config.with_url(url);
        }
        if let Some(username) = get("FORGE_API_USER") {
            config = config.with_credentials(username, get("FORGE_API_PASSWORD").unwrap_or_default());
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            config = config.with_output_dir(dir);
        }

        for (key, category) in [
            ("TIMEOUT_GENERATION", TimeoutCategory::Generation),
            ("TIMEOUT_MODEL_SWITCH", TimeoutCategory::ModelSwitch),
            ("TIMEOUT_INFO", TimeoutCategory::Info),
            ("TIMEOUT_CONTROL", TimeoutCategory::Control),
        ] {
            if let Some(raw) = get(key) {
                config = config.with_timeout(category, parse_timeout(key, &raw)?);
            }
        }

        Ok(config)
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let username = username.into();
        if username.is_empty() {
            self.username = None;
            self.password = None;
        } else {
            self.username = Some(username);
            self.password = Some(password.into());
        }
        self
    }

    /// Relative directories are anchored at the current working directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.output_dir = if dir.is_absolute() {
            dir
        } else {
            env::current_dir()
                .map(|cwd| cwd.join(&dir))
                .unwrap_or(dir)
        };
        self
    }

    pub fn with_timeout(mut self, category: TimeoutCategory, timeout: Duration) -> Self {
        self.timeouts = self.timeouts.with(category, timeout);
        self
    }

    pub fn timeout(&self, category: TimeoutCategory) -> Duration {
        self.timeouts.for_category(category)
    }

    pub fn has_auth(&self) -> bool {
        self.username.is_some()
    }

    /// Creates the output directory (and parents) if it does not exist yet.
    pub fn ensure_output_dir(&self) -> Result<&Path> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ForgeError::file_io(&self.output_dir, e))?;
        Ok(&self.output_dir)
    }
}

fn parse_timeout(key: &str, raw: &str) -> Result<Duration> {
    let seconds: f64 = raw.trim().parse().map_err(|_| {
        ForgeError::ConfigError(format!("{} must be a number of seconds, got '{}'", key, raw))
    })?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(ForgeError::ConfigError(format!(
            "{} must be a positive number of seconds, got '{}'",
            key, raw
        )));
    }

    Duration::try_from_secs_f64(seconds).map_err(|_| {
        ForgeError::ConfigError(format!("{} is too large to be a timeout, got '{}'", key, raw))
    })
}

/// `outputs/` beside the executable, so the location does not depend on the launch directory.
fn default_output_dir() -> PathBuf {
    env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(DEFAULT_OUTPUT_DIR_NAME)))
        .or_else(|| {
            env::current_dir()
                .ok()
                .map(|cwd| cwd.join(DEFAULT_OUTPUT_DIR_NAME))
        })
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR_NAME))
}
