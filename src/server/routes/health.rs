//! Health check and metrics endpoints

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use std::borrow::Cow;
use tracing::{debug, warn};

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/metrics", web::get().to(metrics));
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: Cow<'static, str>,
    timestamp: chrono::DateTime<chrono::Utc>,
    version: Cow<'static, str>,
    counter_store: &'static str,
    counter_store_healthy: bool,
    degraded: bool,
}

/// Liveness plus counter store reachability
///
/// A store outage reports `degraded` rather than failing the check, since
/// fail-open scopes keep serving traffic without it.
pub async fn health_check(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("Health check requested");

    let coordinator = state.enforcer.coordinator();
    let store_healthy = match coordinator.health_check().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Counter store health check failed: {}", e);
            false
        }
    };
    let degraded = state.enforcer.degradation().is_active();

    let status = if store_healthy && !degraded {
        "healthy"
    } else {
        "degraded"
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(HealthStatus {
        status: Cow::Borrowed(status),
        timestamp: chrono::Utc::now(),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        counter_store: coordinator.store().backend_name(),
        counter_store_healthy: store_healthy,
        degraded,
    })))
}

/// Prometheus text exposition
async fn metrics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let body = state.metrics.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}
