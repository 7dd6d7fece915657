//! WebSocket endpoint

use crate::server::state::AppState;
use crate::server::websocket::{WebSocketRateGate, run_session};
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use std::sync::Arc;

/// Configure WebSocket routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(websocket));
}

/// Upgrade and hand the connection to a gated session
async fn websocket(
    req: HttpRequest,
    body: web::Payload,
    state: web::Data<AppState>,
) -> ActixResult<HttpResponse> {
    let peer_addr = req.connection_info().peer_addr().map(str::to_string);
    let principal = state.principals.resolve(req.headers(), peer_addr.as_deref());

    let (response, session, stream) = actix_ws::handle(&req, body)?;

    let gate = WebSocketRateGate::new(
        Arc::clone(&state.enforcer),
        principal,
        state.config.gateway.rate_limit.websocket.clone(),
    );
    actix_web::rt::spawn(run_session(gate, session, stream));

    Ok(response)
}
