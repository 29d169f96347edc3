// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource types consumed by the provisioning operator.
//!
//! # Resource Types
//!
//! - [`Provisioning`] - The user-authored singleton describing how bare-metal
//!   provisioning should be configured. Only the object named
//!   [`PROVISIONING_SINGLETON_NAME`](crate::constants::PROVISIONING_SINGLETON_NAME)
//!   is meaningful.
//! - [`Infrastructure`] - The cluster-wide status object owned by the cluster
//!   configuration authority. The operator only ever reads it.
//!
//! # Example: A Provisioning Singleton
//!
//! ```rust,no_run
//! use baremetal_operator::crd::{Provisioning, ProvisioningNetwork, ProvisioningSpec};
//!
//! let provisioning = Provisioning::new(
//!     "provisioning-configuration",
//!     ProvisioningSpec {
//!         provisioning_interface: Some("enp1s0".to_string()),
//!         provisioning_ip: Some("172.22.0.3".to_string()),
//!         provisioning_network_cidr: Some("172.22.0.0/24".to_string()),
//!         provisioning_network: Some(ProvisioningNetwork::Managed),
//!         ..ProvisioningSpec::default()
//!     },
//! );
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents an observation of a resource's current state.
///
/// Conditions are used in status subresources to communicate the state of
/// a resource to users and controllers.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition. Common types include: Ready, Available, Progressing, Degraded.
    pub r#type: String,

    /// Status of the condition: True, False, or Unknown.
    pub status: String,

    /// Brief CamelCase reason for the condition's last transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Human-readable message indicating details about the transition.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Last time the condition transitioned from one status to another (RFC3339 format).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}

/// How the provisioning network is managed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
pub enum ProvisioningNetwork {
    /// The operator owns DHCP and addressing on the provisioning network.
    Managed,
    /// The provisioning network exists but DHCP is served externally.
    Unmanaged,
    /// No dedicated provisioning network; hosts are provisioned over the
    /// machine network with virtual media.
    Disabled,
}

/// Provisioning configures the bare-metal provisioning subsystem of a cluster.
///
/// The parameters are opaque to the decision logic: they are validated by the
/// API server schema and passed through unchanged into the rendered snapshot.
///
/// # Example
///
/// ```yaml
/// apiVersion: metal3.io/v1alpha1
/// kind: Provisioning
/// metadata:
///   name: provisioning-configuration
/// spec:
///   provisioningInterface: enp1s0
///   provisioningIP: 172.22.0.3
///   provisioningNetworkCIDR: 172.22.0.0/24
///   provisioningDHCPRange: 172.22.0.10,172.22.0.254
///   provisioningNetwork: Managed
/// ```
#[derive(
    CustomResource, Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema,
)]
#[kube(
    group = "metal3.io",
    version = "v1alpha1",
    kind = "Provisioning",
    plural = "provisionings",
    doc = "Provisioning holds the cluster-wide configuration of the bare-metal provisioning subsystem. Only the object named provisioning-configuration is acted upon."
)]
#[kube(status = "ProvisioningStatus")]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningSpec {
    /// Name of the host interface attached to the provisioning network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_interface: Option<String>,

    /// IP address assigned to the provisioning service on the provisioning network.
    #[serde(
        default,
        rename = "provisioningIP",
        skip_serializing_if = "Option::is_none"
    )]
    pub provisioning_ip: Option<String>,

    /// CIDR of the provisioning network (IPv4 or IPv6).
    #[serde(
        default,
        rename = "provisioningNetworkCIDR",
        skip_serializing_if = "Option::is_none"
    )]
    pub provisioning_network_cidr: Option<String>,

    /// DHCP range handed out on a managed provisioning network, as `start,end`.
    #[serde(
        default,
        rename = "provisioningDHCPRange",
        skip_serializing_if = "Option::is_none"
    )]
    pub provisioning_dhcp_range: Option<String>,

    /// Location of the machine OS image used to provision hosts.
    #[serde(
        default,
        rename = "provisioningOSDownloadURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub provisioning_os_download_url: Option<String>,

    /// Management mode of the provisioning network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provisioning_network: Option<ProvisioningNetwork>,

    /// MAC addresses of the control-plane hosts' provisioning interfaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provisioning_mac_addresses: Vec<String>,

    /// Watch `BareMetalHost` objects in all namespaces instead of the operator's own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watch_all_namespaces: Option<bool>,

    /// Serve virtual media images over the external network.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_media_via_external_network: Option<bool>,
}

/// Status of the `Provisioning` singleton as last written by the operator.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProvisioningStatus {
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Address family mode derived from the internal API endpoint (`v4`, `v6`, `dual`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_stack: Option<String>,
    /// Hostname of the internal API server endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_server_internal_host: Option<String>,
}

/// Infrastructure is the cluster-wide infrastructure description owned by the
/// cluster configuration authority.
///
/// The operator never writes this resource. Only the status fields below are
/// consumed; everything else the authority publishes is ignored on read.
#[derive(CustomResource, Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "Infrastructure",
    plural = "infrastructures",
    doc = "Infrastructure holds cluster-wide information about the underlying platform."
)]
#[kube(status = "InfrastructureStatus")]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureSpec {}

/// Observed infrastructure of the cluster.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureStatus {
    /// Unique identifier of the cluster infrastructure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infrastructure_name: Option<String>,

    /// Underlying platform type (deprecated upstream in favour of `platformStatus.type`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    /// Platform-specific status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_status: Option<PlatformStatus>,

    /// External URL of the Kubernetes API server.
    #[serde(
        default,
        rename = "apiServerURL",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_server_url: Option<String>,

    /// Internal URL of the Kubernetes API server.
    #[serde(
        default,
        rename = "apiServerInternalURI",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_server_internal_url: Option<String>,
}

/// Platform-specific part of [`InfrastructureStatus`].
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct PlatformStatus {
    /// Platform type, e.g. `BareMetal`, `AWS`, `None`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub platform_type: Option<String>,
}

#[cfg(test)]
#[path = "crd_tests.rs"]
mod crd_tests;
