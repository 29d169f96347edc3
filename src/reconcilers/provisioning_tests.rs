// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `provisioning.rs`

#[cfg(test)]
mod tests {
    use super::super::{reconcile_provisioning, PassGuard, ReconcileOutcome};
    use crate::context::Context;
    use crate::crd::{
        Infrastructure, InfrastructureSpec, InfrastructureStatus, Provisioning, ProvisioningSpec,
    };
    use crate::errors::{ErrorKind, ProvisioningError};
    use crate::reconcilers::network::NetworkStack;
    use crate::resolver::{AddressResolver, StaticResolver};
    use crate::sink::RecordingSink;
    use crate::status_reasons::{
        CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, REASON_ADDRESS_LOOKUP_FAILED,
        REASON_ENDPOINT_MALFORMED, REASON_SINK_FAILED,
    };
    use crate::store::{MemoryStore, ResourceStore, StoreError};
    use async_trait::async_trait;
    use std::net::IpAddr;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    const HOST: &str = "api-int.ostest.test.metalkube.org";
    const URL: &str = "https://api-int.ostest.test.metalkube.org:6443";
    const SINGLETON: &str = "provisioning-configuration";

    fn infra(platform: &str, url: Option<&str>) -> Infrastructure {
        let mut infra = Infrastructure::new("cluster", InfrastructureSpec::default());
        infra.status = Some(InfrastructureStatus {
            platform: Some(platform.into()),
            api_server_internal_url: url.map(String::from),
            ..InfrastructureStatus::default()
        });
        infra
    }

    fn spec() -> ProvisioningSpec {
        ProvisioningSpec {
            provisioning_interface: Some("enp1s0".into()),
            provisioning_ip: Some("172.22.0.3".into()),
            ..ProvisioningSpec::default()
        }
    }

    fn resolver(addrs: &[&str]) -> StaticResolver {
        StaticResolver::new().with_host(
            HOST,
            addrs.iter().map(|a| a.parse::<IpAddr>().unwrap()).collect(),
        )
    }

    struct Harness {
        ctx: Context<MemoryStore>,
        sink: Arc<RecordingSink>,
    }

    fn harness(resolver: impl AddressResolver + 'static) -> Harness {
        let sink = Arc::new(RecordingSink::new());
        let ctx = Context::new(MemoryStore::new(), Arc::new(resolver), sink.clone());
        Harness { ctx, sink }
    }

    fn guard() -> PassGuard {
        PassGuard::new(CancellationToken::new(), Duration::from_secs(30))
    }

    async fn stored_status(store: &MemoryStore) -> Option<crate::crd::ProvisioningStatus> {
        let p: Provisioning = store.get(SINGLETON).await.unwrap().unwrap();
        p.status
    }

    #[tokio::test]
    async fn test_success_path() {
        let h = harness(resolver(&["2001:db8::68", "192.168.0.1"]));
        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(
            outcome,
            ReconcileOutcome::converged(spec(), NetworkStack::Dual, HOST.into())
        );
        assert!(outcome.is_converged());
        assert_eq!(h.sink.applied(), vec![outcome]);

        let status = stored_status(&h.ctx.store).await.unwrap();
        assert_eq!(status.network_stack.as_deref(), Some("dual"));
        assert_eq!(status.api_server_internal_host.as_deref(), Some(HOST));
        assert_eq!(status.conditions[0].status, CONDITION_STATUS_TRUE);
    }

    #[tokio::test]
    async fn test_idempotent_passes() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let first = reconcile_provisioning(&h.ctx, &guard()).await;
        let status_after_first = stored_status(&h.ctx.store).await;
        let second = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(first, second);
        assert_eq!(first.network_stack, Some(NetworkStack::V4));
        assert_eq!(h.ctx.store.status_writes(), 1);
        assert_eq!(stored_status(&h.ctx.store).await, status_after_first);
    }

    #[tokio::test]
    async fn test_disabled_platform_is_a_clean_noop() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.insert(infra("", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(outcome, ReconcileOutcome::disabled());
        assert!(h.sink.applied().is_empty());
        assert_eq!(h.ctx.store.status_writes(), 0);
    }

    #[tokio::test]
    async fn test_indeterminate_platform_requeues_without_writes() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.insert(infra("AWS", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert!(!outcome.enabled);
        assert_eq!(outcome.error, Some(ErrorKind::PlatformIndeterminate));
        assert_eq!(outcome.requeue_after, Some(Duration::from_secs(30)));
        assert!(h.sink.applied().is_empty());
        assert_eq!(h.ctx.store.status_writes(), 0);
    }

    #[tokio::test]
    async fn test_missing_infrastructure_requeues() {
        let h = harness(resolver(&["192.168.0.1"]));

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(outcome.error, Some(ErrorKind::PlatformIndeterminate));
        assert!(outcome.requeue_after.is_some());
    }

    #[tokio::test]
    async fn test_store_failure_requeues() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.fail::<Infrastructure>(StoreError::Forbidden {
            kind: "Infrastructure".into(),
            name: "cluster".into(),
            message: "forbidden".into(),
        });

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(outcome.error, Some(ErrorKind::StoreAccessFailure));
        assert!(outcome.requeue_after.is_some());
    }

    #[tokio::test]
    async fn test_unconfigured_is_a_clean_noop() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        h.ctx
            .store
            .insert(Provisioning::new("not-the-singleton", spec()))
            .unwrap();

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(outcome, ReconcileOutcome::unconfigured());
        assert!(outcome.requeue_after.is_none());
        assert!(h.sink.applied().is_empty());
        assert_eq!(h.ctx.store.status_writes(), 0);
    }

    #[tokio::test]
    async fn test_malformed_endpoint_surfaces_condition() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.insert(infra("BareMetal", None)).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(outcome.error, Some(ErrorKind::EndpointMalformed));
        assert_eq!(outcome.config, Some(spec()));
        assert!(outcome.requeue_after.is_some());
        assert!(h.sink.applied().is_empty());

        let status = stored_status(&h.ctx.store).await.unwrap();
        assert_eq!(status.conditions[0].status, CONDITION_STATUS_FALSE);
        assert_eq!(
            status.conditions[0].reason.as_deref(),
            Some(REASON_ENDPOINT_MALFORMED)
        );
        assert!(status.network_stack.is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_surfaces_condition() {
        let h = harness(StaticResolver::new());
        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(outcome.error, Some(ErrorKind::AddressLookupFailure));
        let status = stored_status(&h.ctx.store).await.unwrap();
        assert_eq!(
            status.conditions[0].reason.as_deref(),
            Some(REASON_ADDRESS_LOOKUP_FAILED)
        );
    }

    #[tokio::test]
    async fn test_recovery_after_failure() {
        let h = harness(resolver(&["2001:db8::68"]));
        h.ctx.store.insert(infra("BareMetal", None)).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let failed = reconcile_provisioning(&h.ctx, &guard()).await;
        assert!(failed.error.is_some());

        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        let recovered = reconcile_provisioning(&h.ctx, &guard()).await;

        assert!(recovered.is_converged());
        assert_eq!(recovered.network_stack, Some(NetworkStack::V6));
        let status = stored_status(&h.ctx.store).await.unwrap();
        assert_eq!(status.conditions.len(), 1);
        assert_eq!(status.conditions[0].status, CONDITION_STATUS_TRUE);
    }

    #[tokio::test]
    async fn test_sink_failure_is_reported() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();
        h.sink.set_failure(Some("apply rejected"));

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert_eq!(outcome.error, Some(ErrorKind::SinkFailure));
        assert!(outcome.requeue_after.is_some());
        let status = stored_status(&h.ctx.store).await.unwrap();
        assert_eq!(status.conditions[0].reason.as_deref(), Some(REASON_SINK_FAILED));
    }

    #[tokio::test]
    async fn test_status_conflicts_are_retried() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();
        h.ctx.store.inject_conflicts(2);

        let outcome = reconcile_provisioning(&h.ctx, &guard()).await;

        assert!(outcome.is_converged());
        assert_eq!(h.ctx.store.status_writes(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_pass_has_no_side_effects() {
        let h = harness(resolver(&["192.168.0.1"]));
        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let outcome = reconcile_provisioning(&h.ctx, &PassGuard::new(token, Duration::from_secs(30))).await;

        assert_eq!(outcome.error, Some(ErrorKind::Cancelled));
        assert!(outcome.requeue_after.is_none());
        assert!(h.sink.applied().is_empty());
        assert_eq!(h.ctx.store.status_writes(), 0);
    }

    /// Resolver that never answers.
    struct HangingResolver;

    #[async_trait]
    impl AddressResolver for HangingResolver {
        async fn resolve(&self, _host: &str) -> Result<Vec<IpAddr>, ProvisioningError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_before_convergence() {
        let h = harness(HangingResolver);
        h.ctx.store.insert(infra("BareMetal", Some(URL))).unwrap();
        h.ctx.store.insert(Provisioning::new(SINGLETON, spec())).unwrap();

        let guard = PassGuard::new(CancellationToken::new(), Duration::from_secs(5));
        let outcome = reconcile_provisioning(&h.ctx, &guard).await;

        assert_eq!(outcome.error, Some(ErrorKind::DeadlineExceeded));
        assert!(outcome.requeue_after.is_some());
        assert!(h.sink.applied().is_empty());
        assert_eq!(h.ctx.store.status_writes(), 0);
    }

    #[tokio::test]
    async fn test_guard_check() {
        let token = CancellationToken::new();
        let guard = PassGuard::new(token.clone(), Duration::from_secs(30));
        assert!(guard.check().is_ok());

        token.cancel();
        assert!(matches!(guard.check(), Err(ProvisioningError::Cancelled)));

        let expired = PassGuard::new(CancellationToken::new(), Duration::ZERO);
        assert!(matches!(
            expired.check(),
            Err(ProvisioningError::DeadlineExceeded(_))
        ));
    }
}
