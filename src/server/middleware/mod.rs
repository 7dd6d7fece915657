//! HTTP middleware implementations
//!
//! - Rate limiting gate in front of every handler
//! - Principal resolution and scope classification helpers shared with the
//!   WebSocket handler

mod helpers;
mod rate_limit;


pub use helpers::{
    HeaderPrincipalResolver, PRINCIPAL_ID_HEADER, PRINCIPAL_TIER_HEADER, PrincipalResolver,
    ScopeClassifier,
};
pub use rate_limit::{
    RateLimitMiddleware, RateLimitMiddlewareService, apply_rate_limit_headers,
    rate_limited_response,
};
