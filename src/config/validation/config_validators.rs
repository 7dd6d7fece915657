//! Core configuration validators

use super::trait_def::Validate;
use crate::config::models::*;
use tracing::debug;

impl Validate for GatewayConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating gateway configuration");

        self.server.validate()?;
        self.storage.validate()?;
        self.rate_limit.validate()?;
        self.degradation.validate()?;
        self.logging.validate()?;

        debug!("Gateway configuration validation completed");
        Ok(())
    }
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Server host cannot be empty".to_string());
        }

        if self.port == 0 {
            return Err("Server port must be greater than 0".to_string());
        }

        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err("Worker count must be greater than 0".to_string());
            }
            if workers > 1000 {
                return Err("Worker count seems too high (>1000)".to_string());
            }
        }

        Ok(())
    }
}

impl Validate for StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.backend == StoreBackend::Redis {
            if self.redis.url.is_empty() {
                return Err("Redis URL cannot be empty".to_string());
            }
            if !self.redis.url.starts_with("redis://") && !self.redis.url.starts_with("rediss://")
            {
                return Err("Redis URL must start with redis:// or rediss://".to_string());
            }
            if cfg!(not(feature = "redis")) {
                return Err(
                    "Redis backend selected but the gateway was built without the redis feature"
                        .to_string(),
                );
            }
        }

        if self.redis.connection_timeout == 0 {
            return Err("Redis connection timeout must be greater than 0".to_string());
        }

        if self.cleanup_interval == 0 {
            return Err("Counter cleanup interval must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }
        Ok(())
    }
}
