//! rforge turns a Stable Diffusion Forge server into agent-callable tools.
//!
//! [`ForgeClient`] holds one operation group per backend capability
//! (generation, models, assets, control); [`ToolRegistry`] maps tool names onto
//! those operations and [`server::ToolServer`] serves them over stdio.

pub mod codec;
pub mod config;
pub mod error;
pub mod forge;
pub mod logger;
pub mod models;
pub mod paths;
pub mod server;
pub mod tools;

pub use config::{ForgeConfig, TimeoutCategory, Timeouts};
pub use error::{ForgeError, Result};
pub use forge::{ErrorReport, ForgeClient};
pub use models::*;
pub use server::ToolServer;
pub use tools::{ToolOutcome, ToolRegistry};
