//! Gated backend endpoints
//!
//! Stand-ins for the chat, agent and session services. The rate limit gate
//! in front of them is what matters here; they only acknowledge the work.

use crate::server::routes::ApiResponse;
use crate::server::state::AppState;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

/// Configure backend routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/chat/messages", web::post().to(post_chat_message))
        .route(
            "/api/agents/{agent_id}/execute",
            web::post().to(execute_agent),
        )
        .route("/auth/session", web::get().to(current_session));
}

#[derive(Debug, Serialize)]
struct Accepted {
    id: Uuid,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    agent_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    principal_id: String,
    tier: String,
}

async fn post_chat_message() -> ActixResult<HttpResponse> {
    let id = Uuid::new_v4();
    debug!("Accepted chat message {}", id);
    Ok(HttpResponse::Accepted().json(ApiResponse::success(Accepted {
        id,
        status: "accepted",
        agent_id: None,
    })))
}

async fn execute_agent(path: web::Path<String>) -> ActixResult<HttpResponse> {
    let agent_id = path.into_inner();
    let id = Uuid::new_v4();
    debug!("Queued execution {} for agent {}", id, agent_id);
    Ok(HttpResponse::Accepted().json(ApiResponse::success(Accepted {
        id,
        status: "queued",
        agent_id: Some(agent_id),
    })))
}

/// Identity the gateway resolved for this request
async fn current_session(req: HttpRequest, state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let peer_addr = req.connection_info().peer_addr().map(str::to_string);
    let principal = state.principals.resolve(req.headers(), peer_addr.as_deref());
    Ok(HttpResponse::Ok().json(ApiResponse::success(SessionInfo {
        principal_id: principal.id,
        tier: principal.tier.to_string(),
    })))
}
