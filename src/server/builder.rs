//! Configuration loading and the run_server entry point

use crate::config::Config;
use crate::server::server::HttpServer;
use crate::utils::error::Result;
use std::path::Path;
use tracing::{info, warn};

/// Load the gateway configuration
///
/// A missing file falls back to defaults plus environment overrides; a file
/// that exists but fails to parse or validate is an error.
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        warn!(
            "Configuration file {} not found, using defaults and environment",
            path.display()
        );
        return Config::from_env();
    }

    let mut config = Config::from_file(path).await?;
    config.gateway.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

/// Run the server with the given configuration
pub async fn run_server(config: Config) -> Result<()> {
    info!("Starting rate limit gateway {}", crate::VERSION);

    let server = HttpServer::new(&config).await?;
    info!(
        "Server starting at: http://{}:{} (store: {:?}, rate limiting {})",
        config.server().host,
        config.server().port,
        config.storage().backend,
        if config.rate_limit().enabled {
            "enabled"
        } else {
            "disabled"
        }
    );

    server.start().await
}
