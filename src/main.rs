use rforge::{logger, ForgeClient, ForgeConfig, ToolRegistry, ToolServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv_loaded = dotenv::dotenv().is_ok();

    logger::init_with_config(logger::LoggerConfig::from_env())?;
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    if dotenv_loaded {
        log::info!("✅ .env file loaded");
    } else {
        log::debug!("No .env file found, using process environment");
    }

    let config = match ForgeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("❌ {}", e);
            return Err(e.into());
        }
    };
    config.ensure_output_dir()?;
    logger::log_config_info(&config);

    let forge = ForgeClient::new(config);
    let registry = ToolRegistry::with_forge_tools();
    log::info!("🧰 Registered {} tools: {}", registry.len(), registry.names().join(", "));

    ToolServer::new(forge, registry).serve_stdio().await?;

    log::info!("👋 Shutting down");
    Ok(())
}
