pub mod assets;
pub mod connection;
pub mod control;
pub mod generation;
pub mod models;
pub mod response;

use crate::{
    config::{ForgeConfig, TimeoutCategory},
    error::Result,
};
use std::sync::Arc;

pub use assets::AssetClient;
pub use connection::ForgeConnection;
pub use control::ControlClient;
pub use generation::GenerationClient;
pub use models::ModelClient;
pub use response::ErrorReport;

/// Entry point to every Forge operation. Cheap to clone; all groups share one
/// immutable config.
#[derive(Clone)]
pub struct ForgeClient {
    config: Arc<ForgeConfig>,
    generation_client: GenerationClient,
    model_client: ModelClient,
    asset_client: AssetClient,
    control_client: ControlClient,
}

impl ForgeClient {
    pub fn new(config: ForgeConfig) -> Self {
        let config = Arc::new(config);
        Self {
            generation_client: GenerationClient::new(config.clone()),
            model_client: ModelClient::new(config.clone()),
            asset_client: AssetClient::new(config.clone()),
            control_client: ControlClient::new(config.clone()),
            config,
        }
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Opens a scoped connection outside the predefined operations.
    pub fn connect(&self, category: TimeoutCategory) -> Result<ForgeConnection> {
        ForgeConnection::open(&self.config, category)
    }

    pub fn generation(&self) -> &GenerationClient {
        &self.generation_client
    }

    pub fn models(&self) -> &ModelClient {
        &self.model_client
    }

    pub fn assets(&self) -> &AssetClient {
        &self.asset_client
    }

    pub fn control(&self) -> &ControlClient {
        &self.control_client
    }
}
