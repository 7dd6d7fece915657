//! Enforcer integration tests
//!
//! Quota properties observed through the public API, including two gateway
//! instances sharing one counter store.

#[cfg(test)]
mod tests {
    use crate::common::{NOW, PrincipalFactory, TestGateway};
    use ratelimit_gateway::config::{Config, PolicyConfig};
    use ratelimit_gateway::core::rate_limiter::Scope;
    use ratelimit_gateway::storage::CounterStore;

    // ==================== Quota shape ====================

    /// Remaining never increases inside a window and resets in the next
    #[tokio::test]
    async fn test_remaining_is_monotonic_and_resets() {
        let gateway = TestGateway::new(NOW);
        let principal = PrincipalFactory::free("alice");
        let scope = Scope::auth_read();

        let mut last = u64::MAX;
        for _ in 0..30 {
            let decision = gateway.enforcer.check(&principal, &scope).await.unwrap();
            assert!(decision.allowed);
            assert!(decision.remaining <= last);
            last = decision.remaining;
        }
        assert_eq!(last, 0);
        assert!(!gateway.enforcer.check(&principal, &scope).await.unwrap().allowed);

        gateway.clock.advance(60);
        let fresh = gateway.enforcer.check(&principal, &scope).await.unwrap();
        assert!(fresh.allowed);
        assert_eq!(fresh.remaining, 29);
    }

    /// Pro chat admits limit plus burst, then denies
    #[tokio::test]
    async fn test_pro_burst_allowance() {
        let gateway = TestGateway::new(NOW);
        let principal = PrincipalFactory::pro("team");
        let scope = Scope::chat_message();

        for i in 0..55 {
            let decision = gateway.enforcer.check(&principal, &scope).await.unwrap();
            assert!(decision.allowed, "request {} should be admitted", i + 1);
            assert_eq!(decision.limit, 50);
        }
        let denied = gateway.enforcer.check(&principal, &scope).await.unwrap();
        assert!(!denied.allowed);
        assert_eq!(denied.remaining, 0);
    }

    /// retry_after always lands inside the window
    #[tokio::test]
    async fn test_retry_after_within_window_at_every_offset() {
        let gateway = TestGateway::new(NOW);
        let scope = Scope::agent_execute();

        for offset in 0..60 {
            gateway.clock.set(1_000_020 + offset);
            let principal = PrincipalFactory::free(&format!("agent-user-{offset}"));
            for _ in 0..2 {
                assert!(gateway.enforcer.check(&principal, &scope).await.unwrap().allowed);
            }
            let denied = gateway.enforcer.check(&principal, &scope).await.unwrap();
            let retry_after = denied.retry_after.unwrap();
            assert!((1..=60).contains(&retry_after), "offset {offset}: {retry_after}");
            assert_eq!(retry_after, 60 - offset);
        }
    }

    // ==================== Distribution ====================

    /// Two instances on one store enforce a single budget
    #[tokio::test]
    async fn test_instances_share_one_budget() {
        let gateway = TestGateway::new(NOW);
        let other = gateway.sibling();
        let principal = PrincipalFactory::free("roaming");
        let scope = Scope::chat_message();

        for i in 0..5 {
            let enforcer = if i % 2 == 0 { &gateway.enforcer } else { &other };
            let decision = enforcer.check(&principal, &scope).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining, 4 - i);
        }

        assert!(!other.check(&principal, &scope).await.unwrap().allowed);
        assert!(!gateway.enforcer.check(&principal, &scope).await.unwrap().allowed);
    }

    /// One principal exhausting its quota leaves others untouched
    #[tokio::test]
    async fn test_principal_isolation() {
        let gateway = TestGateway::new(NOW);
        let scope = Scope::chat_message();
        let noisy = PrincipalFactory::free("noisy");

        for _ in 0..10 {
            gateway.enforcer.check(&noisy, &scope).await.unwrap();
        }
        for quiet in PrincipalFactory::many_free("quiet", 3) {
            let decision = gateway.enforcer.check(&quiet, &scope).await.unwrap();
            assert!(decision.allowed);
            assert_eq!(decision.remaining, 4);
        }
    }

    /// Usage reads never consume quota
    #[tokio::test]
    async fn test_usage_reads_are_idempotent() {
        let gateway = TestGateway::new(NOW);
        let principal = PrincipalFactory::enterprise("corp");
        let scope = Scope::chat_message();

        for _ in 0..3 {
            gateway.enforcer.check(&principal, &scope).await.unwrap();
        }
        for _ in 0..5 {
            let usage = gateway.enforcer.usage(&principal, &scope).await.unwrap();
            assert_eq!(usage.count, 3);
            assert_eq!(usage.remaining, 497);
        }

        let key = "rl:backend:chat_message:corp:60:1000020";
        assert_eq!(gateway.store.read(key).await.unwrap(), 3);
        assert_eq!(gateway.store.read(key).await.unwrap(), 3);
    }

    // ==================== Configuration ====================

    /// Tier monotonicity is enforced when the file is loaded
    #[test]
    fn test_non_monotonic_tiers_rejected_at_load() {
        let yaml = r#"
rate_limit:
  scopes:
    - scope: "backend:chat_message"
      overrides:
        free: { limit: 100, window_seconds: 60 }
        pro: { limit: 10, window_seconds: 60 }
"#;
        let result = Config::from_yaml(yaml);
        assert!(result.is_err());
    }

    /// A scope override replaces only the tiers it names
    #[tokio::test]
    async fn test_partial_override_falls_back_to_tier_default() {
        let mut config = Config::default();
        let chat = config
            .gateway
            .rate_limit
            .scopes
            .iter_mut()
            .find(|s| s.scope == Scope::chat_message())
            .unwrap();
        chat.overrides.pro = None;
        chat.overrides.enterprise = Some(PolicyConfig::new(900, 60, 0));
        assert!(config.validate().is_ok());

        let gateway = TestGateway::with_config(config, NOW);
        let decision = gateway
            .enforcer
            .check(&PrincipalFactory::pro("p"), &Scope::chat_message())
            .await
            .unwrap();
        assert_eq!(decision.limit, 600);
    }

    /// Scopes nobody registered fail rather than pass silently
    #[tokio::test]
    async fn test_unregistered_scope_is_an_error() {
        let gateway = TestGateway::new(NOW);
        let scope = Scope::new("billing", "invoice").unwrap();
        let result = gateway
            .enforcer
            .check(&PrincipalFactory::free("x"), &scope)
            .await;
        assert!(result.is_err());
    }
}
