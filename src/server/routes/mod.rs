//! HTTP route modules

pub mod admin;
pub mod api;
pub mod health;
pub mod ws;

use actix_web::web;

/// Standard API response structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: serde::Serialize,
{
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

/// Register every route
///
/// Admin routes are only mounted when `rate_limit.admin_api` is set.
pub fn configure(cfg: &mut web::ServiceConfig, admin_api: bool) {
    health::configure_routes(cfg);
    api::configure_routes(cfg);
    ws::configure_routes(cfg);
    if admin_api {
        admin::configure_routes(cfg);
    }
}
