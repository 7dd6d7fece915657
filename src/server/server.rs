//! HTTP server core implementation
//!
//! This module provides the HttpServer struct and its core methods.

use crate::config::{Config, ServerConfig};
use crate::core::rate_limiter::{Clock, RateLimitEnforcer, SystemClock};
use crate::monitoring::RateLimitMetrics;
use crate::server::routes;
use crate::server::state::AppState;
use crate::storage::build_counter_store;
use crate::utils::error::{GatewayError, Result};
use actix_web::{
    App, HttpServer as ActixHttpServer,
    middleware::DefaultHeaders,
    web,
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_actix_web::TracingLogger;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
    /// Stops background tasks once the server exits
    shutdown: watch::Sender<bool>,
}

impl HttpServer {
    /// Create a new HTTP server
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let (shutdown, shutdown_rx) = watch::channel(false);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let store = build_counter_store(config.storage(), Arc::clone(&clock), shutdown_rx).await?;
        let metrics = match RateLimitMetrics::new() {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!("Metrics disabled: {}", e);
                RateLimitMetrics::disabled()
            }
        };

        let enforcer = RateLimitEnforcer::from_config(
            config.rate_limit(),
            config.degradation(),
            store,
            clock,
            metrics.clone(),
        )?;

        let state = AppState::new(config.clone(), Arc::new(enforcer), metrics);

        Ok(Self {
            config: config.gateway.server.clone(),
            state,
            shutdown,
        })
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();

        if self.state.config.degradation().enabled {
            let controller = Arc::clone(self.state.enforcer.degradation());
            controller.spawn(self.shutdown.subscribe());
        } else {
            info!("Degradation controller disabled");
        }

        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);

        let server = ActixHttpServer::new(move || create_app(state.clone()))
            .workers(self.config.worker_count())
            .shutdown_timeout(self.config.shutdown_timeout)
            .bind(&bind_addr)
            .map_err(|e| GatewayError::internal(format!("Failed to bind {}: {}", bind_addr, e)))?
            .run();

        info!("HTTP server listening on {}", bind_addr);

        let result = server
            .await
            .map_err(|e| GatewayError::internal(format!("Server error: {}", e)));

        let _ = self.shutdown.send(true);
        info!("HTTP server stopped");
        result
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Create the Actix-web application
///
/// The rate limit gate runs inside the tracing span so denials are logged
/// against the request that caused them.
pub fn create_app(
    state: web::Data<AppState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let admin_api = state.config.rate_limit().admin_api;
    let gate = state.rate_limit_middleware();

    App::new()
        .app_data(state)
        .wrap(gate)
        .wrap(DefaultHeaders::new().add(("Server", crate::NAME)))
        .wrap(TracingLogger::default())
        .configure(|cfg| routes::configure(cfg, admin_api))
}
