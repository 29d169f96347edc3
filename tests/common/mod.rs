// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use baremetal_operator::context::Context;
use baremetal_operator::crd::{
    Infrastructure, InfrastructureSpec, InfrastructureStatus, ProvisioningSpec,
};
use baremetal_operator::resolver::StaticResolver;
use baremetal_operator::sink::RecordingSink;
use baremetal_operator::store::MemoryStore;
use kube::client::Client;
use std::net::IpAddr;
use std::sync::Arc;

pub const SINGLETON: &str = "provisioning-configuration";
pub const API_INT_HOST: &str = "api-int.ostest.test.metalkube.org";
pub const API_INT_URL: &str = "https://api-int.ostest.test.metalkube.org:6443";

/// Get a Kubernetes client or skip the test if not in a cluster
pub async fn get_kube_client_or_skip() -> Option<Client> {
    match Client::try_default().await {
        Ok(client) => Some(client),
        Err(e) => {
            eprintln!("Skipping integration test: not running in Kubernetes cluster: {e}");
            None
        }
    }
}

/// An `Infrastructure` singleton reporting `platform` and the internal API URL.
pub fn infrastructure(platform: &str, url: Option<&str>) -> Infrastructure {
    let mut infra = Infrastructure::new("cluster", InfrastructureSpec::default());
    infra.status = Some(InfrastructureStatus {
        platform: Some(platform.to_string()),
        api_server_internal_url: url.map(String::from),
        ..InfrastructureStatus::default()
    });
    infra
}

pub fn provisioning_spec() -> ProvisioningSpec {
    ProvisioningSpec {
        provisioning_interface: Some("enp1s0".into()),
        provisioning_ip: Some("172.22.0.3".into()),
        provisioning_network_cidr: Some("172.22.0.0/24".into()),
        ..ProvisioningSpec::default()
    }
}

/// Resolver answering for the internal API host only.
pub fn resolver_for(addrs: &[&str]) -> StaticResolver {
    StaticResolver::new().with_host(
        API_INT_HOST,
        addrs
            .iter()
            .map(|a| a.parse::<IpAddr>().expect("valid test address"))
            .collect(),
    )
}

/// In-memory context plus a handle on its sink.
pub fn in_memory_context(resolver: StaticResolver) -> (Context<MemoryStore>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let ctx = Context::new(MemoryStore::new(), Arc::new(resolver), sink.clone());
    (ctx, sink)
}
