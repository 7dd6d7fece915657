//! WebSocket message gating
//!
//! The upgrade request itself passes through the HTTP gate; after that each
//! inbound data message is charged against the WebSocket scope by a
//! per-connection [`WebSocketRateGate`].

mod gate;
mod session;


pub use gate::{ConnectionState, GateAction, ServerNotice, WebSocketRateGate};
pub use session::run_session;
