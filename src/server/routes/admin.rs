//! Rate limit administration
//!
//! Operator endpoints for inspecting degradation and per-principal usage.
//! They are only mounted when `rate_limit.admin_api` is enabled and are
//! expected to sit behind the operator network.

use crate::core::rate_limiter::{Principal, Scope, Tier};
use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use crate::utils::error::GatewayError;
use actix_web::{HttpResponse, Result as ActixResult, web};
use serde::Deserialize;
use tracing::info;

/// Configure admin routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin/rate-limit")
            .route("/degradation", web::get().to(degradation_state))
            .route("/usage", web::get().to(get_usage))
            .route("/usage", web::delete().to(reset_usage)),
    );
}

/// Query identifying one counter
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    pub principal: String,
    #[serde(default)]
    pub tier: Option<Tier>,
    pub scope: String,
}

impl UsageQuery {
    fn parse(&self) -> Result<(Principal, Scope), GatewayError> {
        if self.principal.trim().is_empty() {
            return Err(GatewayError::bad_request("principal must not be empty"));
        }
        let scope: Scope = self
            .scope
            .parse()
            .map_err(|_| GatewayError::bad_request(format!("Invalid scope '{}'", self.scope)))?;
        Ok((
            Principal::new(self.principal.trim(), self.tier.unwrap_or_default()),
            scope,
        ))
    }
}

async fn degradation_state(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let snapshot = state.enforcer.degradation().state();
    Ok(HttpResponse::Ok().json(ApiResponse::success(snapshot.as_ref().clone())))
}

async fn get_usage(
    state: web::Data<AppState>,
    query: web::Query<UsageQuery>,
) -> ActixResult<HttpResponse> {
    let (principal, scope) = query.parse()?;
    if !state.enforcer.resolver().contains(&scope) {
        return Err(GatewayError::not_found(format!("Unknown scope {}", scope)).into());
    }
    let usage = state.enforcer.usage(&principal, &scope).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(usage)))
}

async fn reset_usage(
    state: web::Data<AppState>,
    query: web::Query<UsageQuery>,
) -> ActixResult<HttpResponse> {
    let (principal, scope) = query.parse()?;
    if !state.enforcer.resolver().contains(&scope) {
        return Err(GatewayError::not_found(format!("Unknown scope {}", scope)).into());
    }
    state.enforcer.reset_usage(&principal, &scope).await?;
    info!(
        principal = %principal.id,
        scope = %scope,
        "Rate limit counter reset by operator"
    );
    Ok(HttpResponse::NoContent().finish())
}
