// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `sink.rs`

#[cfg(test)]
mod tests {
    use crate::crd::{ProvisioningNetwork, ProvisioningSpec};
    use crate::errors::ErrorKind;
    use crate::reconcilers::network::NetworkStack;
    use crate::reconcilers::provisioning::ReconcileOutcome;
    use crate::fake_apiserver::FakeApiServer;
    use crate::sink::{build_snapshot_configmap, ConfigMapSink, DeploymentSink, RecordingSink};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn converged() -> ReconcileOutcome {
        ReconcileOutcome::converged(
            ProvisioningSpec {
                provisioning_interface: Some("enp1s0".into()),
                provisioning_network: Some(ProvisioningNetwork::Unmanaged),
                ..ProvisioningSpec::default()
            },
            NetworkStack::Dual,
            "api-int.example.org".into(),
        )
    }

    #[test]
    fn test_snapshot_configmap_contents() {
        let cm = build_snapshot_configmap("openshift-machine-api", &converged())
            .unwrap()
            .unwrap();

        assert_eq!(cm.metadata.name.as_deref(), Some("metal3-provisioning-snapshot"));
        assert_eq!(cm.metadata.namespace.as_deref(), Some("openshift-machine-api"));
        let labels = cm.metadata.labels.unwrap();
        assert_eq!(labels["app.kubernetes.io/managed-by"], "baremetal-operator");

        let data = cm.data.unwrap();
        assert_eq!(data["networkStack"], "dual");
        assert_eq!(data["apiServerInternalHost"], "api-int.example.org");

        let spec: serde_json::Value = serde_json::from_str(&data["provisioning.json"]).unwrap();
        assert_eq!(spec["provisioningInterface"], "enp1s0");
        assert_eq!(spec["provisioningNetwork"], "Unmanaged");
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let a = build_snapshot_configmap("ns", &converged()).unwrap();
        let b = build_snapshot_configmap("ns", &converged()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unconverged_outcomes_produce_nothing() {
        assert!(build_snapshot_configmap("ns", &ReconcileOutcome::disabled())
            .unwrap()
            .is_none());
        assert!(build_snapshot_configmap("ns", &ReconcileOutcome::unconfigured())
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_recording_sink() {
        let sink = RecordingSink::new();
        sink.apply(&converged()).await.unwrap();
        sink.apply(&converged()).await.unwrap();

        assert_eq!(sink.applied(), vec![converged(), converged()]);
    }

    #[tokio::test]
    async fn test_recording_sink_failure() {
        let sink = RecordingSink::new();
        sink.set_failure(Some("apply rejected"));

        let err = sink.apply(&converged()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SinkFailure);
        assert!(sink.applied().is_empty());

        sink.set_failure(None);
        assert!(sink.apply(&converged()).await.is_ok());
    }

    #[tokio::test]
    async fn test_configmap_sink_server_side_applies_snapshot() {
        let server = FakeApiServer::start(
            StatusCode::OK,
            json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": {
                    "name": "metal3-provisioning-snapshot",
                    "namespace": "openshift-machine-api"
                }
            }),
        )
        .await;
        let sink = ConfigMapSink::new(server.client(), "openshift-machine-api");

        sink.apply(&converged()).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.method, Method::PATCH);
        assert_eq!(
            request.path,
            "/api/v1/namespaces/openshift-machine-api/configmaps/metal3-provisioning-snapshot"
        );
        assert!(request.query.contains("fieldManager=baremetal-operator"));
        assert!(request.query.contains("force=true"));
        assert_eq!(request.content_type, "application/apply-patch+yaml");
        assert_eq!(request.body["data"]["networkStack"], "dual");
        assert_eq!(
            request.body["data"]["apiServerInternalHost"],
            "api-int.example.org"
        );
    }

    #[tokio::test]
    async fn test_configmap_sink_skips_unconverged_outcome() {
        let server = FakeApiServer::start(StatusCode::OK, json!({})).await;
        let sink = ConfigMapSink::new(server.client(), "openshift-machine-api");

        sink.apply(&ReconcileOutcome::disabled()).await.unwrap();

        assert!(server.requests().is_empty());
    }

    #[tokio::test]
    async fn test_configmap_sink_rejection_is_sink_failure() {
        let server = FakeApiServer::start(
            StatusCode::FORBIDDEN,
            json!({
                "kind": "Status",
                "apiVersion": "v1",
                "status": "Failure",
                "message": "configmaps is forbidden",
                "reason": "Forbidden",
                "code": 403
            }),
        )
        .await;
        let sink = ConfigMapSink::new(server.client(), "openshift-machine-api");

        let err = sink.apply(&converged()).await.unwrap_err();

        assert_eq!(err.kind(), ErrorKind::SinkFailure);
        assert_eq!(server.requests().len(), 1);
    }
}
