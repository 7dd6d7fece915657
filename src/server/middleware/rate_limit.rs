//! Rate limiting middleware

use super::helpers::{PrincipalResolver, ScopeClassifier};
use crate::core::rate_limiter::{Decision, RateLimitEnforcer};
use actix_web::body::{EitherBody, MessageBody};
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::http::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use actix_web::{HttpResponse, ResponseError};
use futures::future::{Ready, ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Attach `X-RateLimit-*` headers describing `decision`
pub fn apply_rate_limit_headers(headers: &mut HeaderMap, decision: &Decision) {
    headers.insert(
        HeaderName::from_static("x-ratelimit-limit"),
        HeaderValue::from(decision.limit),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-remaining"),
        HeaderValue::from(decision.remaining),
    );
    headers.insert(
        HeaderName::from_static("x-ratelimit-reset"),
        HeaderValue::from(decision.reset_at),
    );
}

/// 429 response for a denied decision
pub fn rate_limited_response(decision: &Decision) -> HttpResponse {
    let retry_after = decision.retry_after.unwrap_or(1).max(1);
    let mut response = HttpResponse::TooManyRequests().json(serde_json::json!({
        "error": format!(
            "Rate limit exceeded. Retry after {} seconds.",
            retry_after
        ),
    }));

    let headers = response.headers_mut();
    apply_rate_limit_headers(headers, decision);
    headers.insert(RETRY_AFTER, HeaderValue::from(retry_after));
    response
}

/// Rate limit middleware for Actix-web
///
/// Denied requests never reach the wrapped service.
#[derive(Clone)]
pub struct RateLimitMiddleware {
    enforcer: Arc<RateLimitEnforcer>,
    principals: Arc<dyn PrincipalResolver>,
    classifier: Arc<ScopeClassifier>,
}

impl RateLimitMiddleware {
    pub fn new(
        enforcer: Arc<RateLimitEnforcer>,
        principals: Arc<dyn PrincipalResolver>,
        classifier: Arc<ScopeClassifier>,
    ) -> Self {
        Self {
            enforcer,
            principals,
            classifier,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service: Rc::new(service),
            enforcer: Arc::clone(&self.enforcer),
            principals: Arc::clone(&self.principals),
            classifier: Arc::clone(&self.classifier),
        }))
    }
}

/// Service implementation for rate limiting middleware
pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
    enforcer: Arc<RateLimitEnforcer>,
    principals: Arc<dyn PrincipalResolver>,
    classifier: Arc<ScopeClassifier>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let Some(scope) = self.classifier.classify(req.path()) else {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        };

        let peer_addr = req.connection_info().peer_addr().map(str::to_string);
        let principal = self.principals.resolve(req.headers(), peer_addr.as_deref());
        debug!(
            "Rate limiting check for {} (principal: {}, scope: {})",
            req.path(),
            principal.id,
            scope
        );

        let service = Rc::clone(&self.service);
        let enforcer = Arc::clone(&self.enforcer);

        Box::pin(async move {
            match enforcer.check(&principal, &scope).await {
                Ok(decision) if decision.allowed => {
                    let mut res = service.call(req).await?;
                    apply_rate_limit_headers(res.headers_mut(), &decision);
                    Ok(res.map_into_left_body())
                }
                Ok(decision) => {
                    warn!(
                        "Rejected {} {} for {}: rate limit exceeded in {}",
                        req.method(),
                        req.path(),
                        principal.id,
                        scope
                    );
                    let response = rate_limited_response(&decision);
                    Ok(req.into_response(response).map_into_right_body())
                }
                Err(e) => {
                    let response = e.error_response();
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
