// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Deployment sinks: consumers of a converged [`ReconcileOutcome`].
//!
//! The reconciler hands every converged outcome to a [`DeploymentSink`] without
//! diffing against what the sink already holds, so sinks must be idempotent.
//!
//! - [`ConfigMapSink`] server-side applies a configuration snapshot `ConfigMap`
//!   that the workload manifests consume.
//! - [`RecordingSink`] keeps outcomes in memory for tests.

use crate::constants::{
    FIELD_MANAGER, SNAPSHOT_CONFIGMAP_NAME, SNAPSHOT_KEY_API_SERVER_INTERNAL_HOST,
    SNAPSHOT_KEY_NETWORK_STACK, SNAPSHOT_KEY_PROVISIONING,
};
use crate::errors::ProvisioningError;
use crate::labels::managed_labels;
use crate::reconcilers::provisioning::ReconcileOutcome;
use crate::reconcilers::retry::retry_api_call;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{ObjectMeta, Patch, PatchParams};
use kube::{Api, Client};
use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

/// Materializes the provisioning subsystem from a reconcile outcome.
#[async_trait]
pub trait DeploymentSink: Send + Sync {
    /// Apply `outcome`. Applying the same outcome twice must have no further effect.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::SinkFailure`] if the outcome could not be applied.
    async fn apply(&self, outcome: &ReconcileOutcome) -> Result<(), ProvisioningError>;
}

/// Build the snapshot `ConfigMap` for a converged outcome.
///
/// Returns `Ok(None)` for outcomes that carry nothing to materialize.
///
/// # Errors
///
/// Returns [`ProvisioningError::SinkFailure`] if the spec cannot be serialized.
pub fn build_snapshot_configmap(
    namespace: &str,
    outcome: &ReconcileOutcome,
) -> Result<Option<ConfigMap>, ProvisioningError> {
    let (Some(config), Some(stack), Some(host)) = (
        outcome.config.as_ref(),
        outcome.network_stack,
        outcome.internal_host.as_ref(),
    ) else {
        return Ok(None);
    };

    let provisioning = serde_json::to_string_pretty(config)
        .map_err(|e| ProvisioningError::SinkFailure(format!("failed to encode spec: {e}")))?;

    let data = BTreeMap::from([
        (SNAPSHOT_KEY_NETWORK_STACK.to_string(), stack.as_str().to_string()),
        (SNAPSHOT_KEY_API_SERVER_INTERNAL_HOST.to_string(), host.clone()),
        (SNAPSHOT_KEY_PROVISIONING.to_string(), provisioning),
    ]);

    Ok(Some(ConfigMap {
        metadata: ObjectMeta {
            name: Some(SNAPSHOT_CONFIGMAP_NAME.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(managed_labels()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }))
}

/// Sink writing the snapshot `ConfigMap` with server-side apply.
#[derive(Clone)]
pub struct ConfigMapSink {
    client: Client,
    namespace: String,
}

impl ConfigMapSink {
    #[must_use]
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }
}

#[async_trait]
impl DeploymentSink for ConfigMapSink {
    async fn apply(&self, outcome: &ReconcileOutcome) -> Result<(), ProvisioningError> {
        let Some(configmap) = build_snapshot_configmap(&self.namespace, outcome)? else {
            debug!("Outcome is not converged, nothing to apply");
            return Ok(());
        };

        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.namespace);
        let params = PatchParams::apply(FIELD_MANAGER).force();
        let patch = Patch::Apply(&configmap);
        let operation = format!("apply ConfigMap {}/{SNAPSHOT_CONFIGMAP_NAME}", self.namespace);

        retry_api_call(
            || api.patch(SNAPSHOT_CONFIGMAP_NAME, &params, &patch),
            &operation,
        )
        .await
        .map_err(|e| ProvisioningError::SinkFailure(format!("{operation}: {e}")))?;

        info!(
            namespace = %self.namespace,
            name = SNAPSHOT_CONFIGMAP_NAME,
            "Applied provisioning snapshot"
        );
        Ok(())
    }
}

/// Sink remembering every outcome it was given.
#[derive(Default)]
pub struct RecordingSink {
    applied: Mutex<Vec<ReconcileOutcome>>,
    failure: Mutex<Option<String>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent applies fail with `message`, or succeed again with `None`.
    pub fn set_failure(&self, message: Option<&str>) {
        *self.failure.lock().unwrap_or_else(PoisonError::into_inner) = message.map(String::from);
    }

    /// Outcomes applied so far, oldest first.
    #[must_use]
    pub fn applied(&self) -> Vec<ReconcileOutcome> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DeploymentSink for RecordingSink {
    async fn apply(&self, outcome: &ReconcileOutcome) -> Result<(), ProvisioningError> {
        if let Some(message) = self
            .failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(ProvisioningError::SinkFailure(message));
        }
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(outcome.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod sink_tests;
