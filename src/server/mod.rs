//! HTTP server implementation
//!
//! This module provides the HTTP server, the rate limit gates and routing.

pub mod middleware;
pub mod routes;
pub mod websocket;

pub mod builder;
pub mod server;
pub mod state;

pub use server::{HttpServer, create_app};
pub use state::AppState;
