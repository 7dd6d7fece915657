//! Helper types for middleware

use crate::config::RateLimitConfig;
use crate::core::rate_limiter::types::{Principal, Scope, Tier};
use actix_web::http::header::HeaderMap;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Header carrying the principal id set by the upstream auth layer
pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
/// Header carrying the principal tier set by the upstream auth layer
pub const PRINCIPAL_TIER_HEADER: &str = "x-principal-tier";

/// Turns an inbound request into a [`Principal`]
pub trait PrincipalResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap, peer_addr: Option<&str>) -> Principal;
}

/// Resolves principals from identity headers
///
/// Authentication happens upstream; this only trusts what it is handed.
/// Requests without an identity header fall back to a hash of their
/// credential, then to the peer address, both on the free tier.
#[derive(Debug, Clone, Default)]
pub struct HeaderPrincipalResolver;

impl HeaderPrincipalResolver {
    pub fn new() -> Self {
        Self
    }

    fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }

    fn credential_id(credential: &str) -> String {
        let digest = Sha256::digest(credential.as_bytes());
        format!("key:{}", &hex::encode(digest)[..16])
    }
}

impl PrincipalResolver for HeaderPrincipalResolver {
    fn resolve(&self, headers: &HeaderMap, peer_addr: Option<&str>) -> Principal {
        if let Some(id) = Self::header(headers, PRINCIPAL_ID_HEADER) {
            let tier = match Self::header(headers, PRINCIPAL_TIER_HEADER) {
                Some(raw) => raw.parse().unwrap_or_else(|_| {
                    debug!("Unrecognised tier '{}', treating principal as free", raw);
                    Tier::Free
                }),
                None => Tier::Free,
            };
            return Principal::new(id, tier);
        }

        if let Some(credential) = Self::header(headers, "x-api-key")
            .or_else(|| Self::header(headers, "authorization"))
        {
            return Principal::new(Self::credential_id(credential), Tier::Free);
        }

        // Strip the port so reconnects from the same host share a counter.
        let host = peer_addr
            .map(|addr| match addr.parse::<std::net::SocketAddr>() {
                Ok(socket) => socket.ip().to_string(),
                Err(_) => addr.to_string(),
            })
            .unwrap_or_else(|| "unknown".to_string());
        Principal::new(format!("ip:{}", host), Tier::Free)
    }
}

/// Maps request paths onto scopes
#[derive(Debug, Clone)]
pub struct ScopeClassifier {
    /// Longest prefix first
    routes: Vec<(String, Scope)>,
    exempt: Vec<String>,
    default_scope: Scope,
}

impl ScopeClassifier {
    pub fn new(routes: Vec<(String, Scope)>, exempt: Vec<String>, default_scope: Scope) -> Self {
        let mut routes = routes;
        routes.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        Self {
            routes,
            exempt,
            default_scope,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config
                .routes
                .iter()
                .map(|r| (r.prefix.clone(), r.scope.clone()))
                .collect(),
            config.exempt_paths.clone(),
            config.default_scope.clone(),
        )
    }

    /// Scope for `path`, `None` when the path is exempt
    pub fn classify(&self, path: &str) -> Option<Scope> {
        if self.exempt.iter().any(|p| matches_prefix(path, p)) {
            return None;
        }

        Some(
            self.routes
                .iter()
                .find(|(prefix, _)| matches_prefix(path, prefix))
                .map(|(_, scope)| scope.clone())
                .unwrap_or_else(|| self.default_scope.clone()),
        )
    }
}

/// Prefix match on path segment boundaries, so `/auth` does not match `/authors`
fn matches_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
