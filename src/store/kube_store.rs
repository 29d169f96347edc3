// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! [`ResourceStore`] backed by the Kubernetes API server.

use super::{ResourceStore, StoreError, StoreKind};
use crate::reconcilers::retry::retry_api_call;
use async_trait::async_trait;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::{json, Value};
use tracing::debug;

/// Kubernetes-backed store for cluster-scoped resources.
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// The underlying Kubernetes client.
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ResourceStore for KubeStore {
    async fn get<K: StoreKind>(&self, name: &str) -> Result<Option<K>, StoreError> {
        let api: Api<K> = Api::all(self.client.clone());
        let operation = format!("get {} {name}", K::KIND);

        retry_api_call(|| api.get_opt(name), &operation)
            .await
            .map_err(|e| StoreError::from_kube(K::KIND, name, &e))
    }

    async fn update_status<K: StoreKind>(&self, object: &K) -> Result<K, StoreError> {
        let name = object.name_any();
        let api: Api<K> = Api::all(self.client.clone());

        let value = serde_json::to_value(object).map_err(|e| StoreError::Malformed {
            kind: K::KIND.to_string(),
            name: name.clone(),
            message: e.to_string(),
        })?;

        // Carrying the resource version turns the merge patch into a guarded write:
        // the API server answers 409 if the object moved on since it was read.
        let body = json!({
            "metadata": { "resourceVersion": object.resource_version() },
            "status": value.get("status").cloned().unwrap_or(Value::Null),
        });

        debug!(kind = K::KIND, name = %name, "Patching status");

        let params = PatchParams::default();
        let patch = Patch::Merge(&body);
        let operation = format!("patch {} {name} status", K::KIND);
        retry_api_call(
            || api.patch_status(&name, &params, &patch),
            &operation,
        )
        .await
        .map_err(|e| StoreError::from_kube(K::KIND, &name, &e))
    }
}

#[cfg(test)]
#[path = "kube_store_tests.rs"]
mod kube_store_tests;
