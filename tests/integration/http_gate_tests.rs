//! HTTP gate integration tests
//!
//! Requests go through the full application: tracing, rate limit
//! middleware and the real route table.

#[cfg(test)]
mod tests {
    use crate::common::fixtures::admin_config;
    use crate::common::{NOW, TestGateway};
    use actix_web::dev::ServiceResponse;
    use actix_web::http::StatusCode;
    use actix_web::{test, web};
    use ratelimit_gateway::server::create_app;
    use serde_json::Value;

    fn header<'a, B>(resp: &'a ServiceResponse<B>, name: &str) -> Option<&'a str> {
        resp.headers().get(name).and_then(|v| v.to_str().ok())
    }

    // ==================== Backend routes ====================

    /// Free chat: five accepted with falling remaining, then 429 until the next window
    #[actix_web::test]
    async fn test_free_chat_scenario_over_http() {
        let gateway = TestGateway::new(NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        for expected_remaining in (0..5).rev() {
            let req = test::TestRequest::post()
                .uri("/api/chat/messages")
                .insert_header(("x-principal-id", "alice"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::ACCEPTED);
            assert_eq!(header(&resp, "x-ratelimit-limit"), Some("5"));
            assert_eq!(
                header(&resp, "x-ratelimit-remaining"),
                Some(expected_remaining.to_string().as_str())
            );
            assert_eq!(header(&resp, "x-ratelimit-reset"), Some("1000080"));
        }

        let req = test::TestRequest::post()
            .uri("/api/chat/messages")
            .insert_header(("x-principal-id", "alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(header(&resp, "retry-after"), Some("50"));
        assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("0"));
        let body: Value = test::read_body_json(resp).await;
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Rate limit exceeded")
        );

        gateway.clock.advance(61);
        let req = test::TestRequest::post()
            .uri("/api/chat/messages")
            .insert_header(("x-principal-id", "alice"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("4"));
    }

    /// Agent execution is queued and metered against its own scope
    #[actix_web::test]
    async fn test_agent_execution_limits() {
        let gateway = TestGateway::new(NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/agents/summarizer/execute")
                .insert_header(("x-principal-id", "bob"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::ACCEPTED);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["data"]["status"], "queued");
            assert_eq!(body["data"]["agent_id"], "summarizer");
        }

        let req = test::TestRequest::post()
            .uri("/api/agents/summarizer/execute")
            .insert_header(("x-principal-id", "bob"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        // Chat budget is untouched.
        let req = test::TestRequest::post()
            .uri("/api/chat/messages")
            .insert_header(("x-principal-id", "bob"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
    }

    /// The session endpoint echoes the identity the gate used
    #[actix_web::test]
    async fn test_session_reports_resolved_principal() {
        let gateway = TestGateway::new(NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        let req = test::TestRequest::get()
            .uri("/auth/session")
            .insert_header(("x-principal-id", "carol"))
            .insert_header(("x-principal-tier", "pro"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(header(&resp, "x-ratelimit-limit"), Some("300"));
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["principal_id"], "carol");
        assert_eq!(body["data"]["tier"], "pro");
    }

    // ==================== Health and metrics ====================

    /// Exempt paths are never counted
    #[actix_web::test]
    async fn test_health_is_exempt() {
        let gateway = TestGateway::new(NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        for _ in 0..100 {
            let req = test::TestRequest::get()
                .uri("/health")
                .insert_header(("x-principal-id", "monitor"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(resp.headers().get("x-ratelimit-limit").is_none());
        }
        assert!(gateway.store.is_empty());

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "healthy");
        assert_eq!(body["data"]["counter_store"], "memory");
        assert_eq!(body["data"]["degraded"], false);
    }

    #[actix_web::test]
    async fn test_metrics_endpoint_serves_text() {
        let gateway = TestGateway::new(NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        let req = test::TestRequest::get().uri("/metrics").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(header(&resp, "content-type").unwrap().starts_with("text/plain"));
    }

    // ==================== Admin ====================

    /// Admin routes are absent unless enabled
    #[actix_web::test]
    async fn test_admin_routes_disabled_by_default() {
        let gateway = TestGateway::new(NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        let req = test::TestRequest::get()
            .uri("/admin/rate-limit/degradation")
            .insert_header(("x-principal-id", "operator"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    /// Usage can be read without counting and reset by an operator
    #[actix_web::test]
    async fn test_admin_usage_read_and_reset() {
        let gateway = TestGateway::with_config(admin_config(), NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        for _ in 0..5 {
            let req = test::TestRequest::post()
                .uri("/api/chat/messages")
                .insert_header(("x-principal-id", "dave"))
                .to_request();
            test::call_service(&app, req).await;
        }

        let usage_uri = "/admin/rate-limit/usage?principal=dave&scope=backend:chat_message";
        for _ in 0..2 {
            let req = test::TestRequest::get()
                .uri(usage_uri)
                .insert_header(("x-principal-id", "operator"))
                .to_request();
            let body: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(body["data"]["count"], 5);
            assert_eq!(body["data"]["remaining"], 0);
            assert_eq!(body["data"]["reset_at"], 1_000_080);
        }

        let req = test::TestRequest::delete()
            .uri(usage_uri)
            .insert_header(("x-principal-id", "operator"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::post()
            .uri("/api/chat/messages")
            .insert_header(("x-principal-id", "dave"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(header(&resp, "x-ratelimit-remaining"), Some("4"));
    }

    #[actix_web::test]
    async fn test_admin_usage_rejects_bad_scopes() {
        let gateway = TestGateway::with_config(admin_config(), NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        let req = test::TestRequest::get()
            .uri("/admin/rate-limit/usage?principal=dave&scope=nonsense")
            .insert_header(("x-principal-id", "operator"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/admin/rate-limit/usage?principal=dave&scope=billing:invoice")
            .insert_header(("x-principal-id", "operator"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
