//! Degradation integration tests
//!
//! A flood of denials across many principals trips the emergency ceiling,
//! which then applies to every tier until the denial ratio recovers.

#[cfg(test)]
mod tests {
    use crate::common::fixtures::fast_degradation_config;
    use crate::common::{NOW, PrincipalFactory, TestGateway};
    use actix_web::http::StatusCode;
    use actix_web::{test, web};
    use ratelimit_gateway::core::rate_limiter::{DegradationTransition, Scope};
    use ratelimit_gateway::server::create_app;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;

    fn agent_request(principal: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/agents/crawler/execute")
            .insert_header(("x-principal-id", principal))
    }

    fn enterprise_chat() -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/chat/messages")
            .insert_header(("x-principal-id", "big-customer"))
            .insert_header(("x-principal-tier", "enterprise"))
    }

    /// Flooded agent endpoint degrades the gateway for everyone, then recovers
    #[actix_web::test]
    async fn test_flood_activates_and_recovers() {
        let gateway = TestGateway::with_config(fast_degradation_config(), NOW);
        let app = test::init_service(create_app(web::Data::new(gateway.state()))).await;

        // 2 admitted and 8 denied per principal.
        for i in 0..5 {
            let principal = format!("bot-{i}");
            for _ in 0..10 {
                test::call_service(&app, agent_request(&principal).to_request()).await;
            }
        }

        let controller = gateway.degradation();
        assert_eq!(controller.tick(), None);
        assert_eq!(controller.tick(), Some(DegradationTransition::Activated));

        let req = test::TestRequest::get()
            .uri("/admin/rate-limit/degradation")
            .insert_header(("x-principal-id", "operator"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["active"], true);
        assert!(
            body["data"]["reason"]
                .as_str()
                .unwrap()
                .contains("denial ratio")
        );

        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["status"], "degraded");

        // Enterprise normally gets 500 chat messages a minute.
        for _ in 0..3 {
            let resp = test::call_service(&app, enterprise_chat().to_request()).await;
            assert_eq!(resp.status(), StatusCode::ACCEPTED);
            assert_eq!(resp.headers().get("x-ratelimit-limit").unwrap(), "3");
        }
        let resp = test::call_service(&app, enterprise_chat().to_request()).await;
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

        // Traffic dies down; recovery has to hold for the cooldown.
        assert_eq!(controller.tick(), None);
        gateway.clock.advance(5);
        assert_eq!(controller.tick(), Some(DegradationTransition::Deactivated));

        let resp = test::call_service(&app, enterprise_chat().to_request()).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        assert_eq!(resp.headers().get("x-ratelimit-limit").unwrap(), "500");
    }

    /// A handful of abusive principals below the volume floor change nothing
    #[tokio::test]
    async fn test_small_flood_stays_below_floor() {
        let gateway = TestGateway::with_config(fast_degradation_config(), NOW);
        let scope = Scope::agent_execute();

        let principal = PrincipalFactory::free("lonely-bot");
        for _ in 0..10 {
            gateway.enforcer.check(&principal, &scope).await.unwrap();
        }
        assert_eq!(gateway.degradation().tick(), None);
        assert_eq!(gateway.degradation().tick(), None);
        assert!(!gateway.degradation().is_active());
    }

    /// One principal hammering well above the volume floor is not an overload
    #[tokio::test]
    async fn test_single_heavy_principal_does_not_degrade() {
        let gateway = TestGateway::with_config(fast_degradation_config(), NOW);
        let scope = Scope::agent_execute();

        let principal = PrincipalFactory::free("heavy-bot");
        for _ in 0..200 {
            gateway.enforcer.check(&principal, &scope).await.unwrap();
        }
        assert_eq!(gateway.degradation().tick(), None);
        assert_eq!(gateway.degradation().tick(), None);
        assert!(!gateway.degradation().is_active());

        // Enterprise traffic keeps its own quota.
        let enterprise = PrincipalFactory::enterprise("big-customer");
        let decision = gateway
            .enforcer
            .check(&enterprise, &Scope::chat_message())
            .await
            .unwrap();
        assert!(!decision.emergency);
        assert_eq!(decision.limit, 500);
    }

    /// The spawned controller ticks on its own and stops on shutdown
    #[tokio::test]
    async fn test_background_controller_activates() {
        let mut config = fast_degradation_config();
        config.gateway.degradation.tick_interval_ms = 10;
        let gateway = TestGateway::with_config(config, NOW);
        let scope = Scope::agent_execute();

        for principal in PrincipalFactory::many_free("swarm", 5) {
            for _ in 0..10 {
                gateway.enforcer.check(&principal, &scope).await.unwrap();
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = Arc::clone(gateway.degradation()).spawn(shutdown_rx);

        let mut active = false;
        for _ in 0..50 {
            tokio::time::sleep(Duration::from_millis(10)).await;
            if gateway.degradation().is_active() {
                active = true;
                break;
            }
        }
        assert!(active, "controller never activated");

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("controller stops on shutdown")
            .unwrap();
    }
}
