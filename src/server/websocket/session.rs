//! WebSocket session loop

use super::gate::{GateAction, ServerNotice, WebSocketRateGate};
use actix_ws::{CloseCode, CloseReason, Message, MessageStream, Session};
use futures::StreamExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Drive one connection until either side closes it
///
/// Data messages go through the gate; allowed ones are acknowledged since
/// message content handling lives in the backend services.
pub async fn run_session(mut gate: WebSocketRateGate, mut session: Session, mut stream: MessageStream) {
    let connection_id = Uuid::new_v4();
    info!(
        connection = %connection_id,
        principal = %gate.principal().id,
        "WebSocket connection opened"
    );

    while let Some(message) = stream.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(connection = %connection_id, "WebSocket protocol error: {}", e);
                break;
            }
        };

        match message {
            Message::Text(_) | Message::Binary(_) => {
                let reply = match gate.on_message().await {
                    GateAction::Forward => Some(ServerNotice::Ack),
                    GateAction::Warn { retry_after } => {
                        Some(ServerNotice::RateLimitExceeded { retry_after })
                    }
                    GateAction::Error { message } => Some(ServerNotice::Error { message }),
                    GateAction::Drop => None,
                    GateAction::Close { reason } => {
                        let _ = session
                            .close(Some(CloseReason {
                                code: CloseCode::Policy,
                                description: Some(reason),
                            }))
                            .await;
                        gate.mark_closed();
                        info!(connection = %connection_id, "WebSocket connection closed by gate");
                        return;
                    }
                };

                if let Some(reply) = reply {
                    if session.text(reply.to_json()).await.is_err() {
                        break;
                    }
                }
            }
            Message::Ping(bytes) => {
                if session.pong(&bytes).await.is_err() {
                    break;
                }
            }
            Message::Close(reason) => {
                debug!(connection = %connection_id, "Client closed WebSocket: {:?}", reason);
                let _ = session.close(reason).await;
                gate.mark_closed();
                return;
            }
            _ => {}
        }
    }

    let _ = session.close(None).await;
    gate.mark_closed();
    info!(connection = %connection_id, "WebSocket connection closed");
}
