// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the bare-metal provisioning operator.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group of the `Provisioning` resource
pub const API_GROUP: &str = "metal3.io";

/// API version of the `Provisioning` resource
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "metal3.io/v1alpha1";

/// Kind name for `Provisioning` resource
pub const KIND_PROVISIONING: &str = "Provisioning";

/// API group of the cluster-wide `Infrastructure` resource
pub const CONFIG_API_GROUP: &str = "config.openshift.io";

/// Kind name for `Infrastructure` resource
pub const KIND_INFRASTRUCTURE: &str = "Infrastructure";

// ============================================================================
// Singleton Names
// ============================================================================

/// The only `Provisioning` name the operator acts on. Objects with any other
/// name are ignored.
pub const PROVISIONING_SINGLETON_NAME: &str = "provisioning-configuration";

/// Name of the cluster-scoped `Infrastructure` singleton
pub const INFRASTRUCTURE_SINGLETON_NAME: &str = "cluster";

// ============================================================================
// Platform Constants
// ============================================================================

/// Platform type for which the provisioning subsystem is enabled
pub const PLATFORM_BAREMETAL: &str = "BareMetal";

/// Platform type reported by clusters without any platform integration
pub const PLATFORM_NONE: &str = "None";

// ============================================================================
// Snapshot ConfigMap Constants
// ============================================================================

/// Name of the `ConfigMap` holding the rendered provisioning snapshot
pub const SNAPSHOT_CONFIGMAP_NAME: &str = "metal3-provisioning-snapshot";

/// `ConfigMap` key for the network stack mode
pub const SNAPSHOT_KEY_NETWORK_STACK: &str = "networkStack";

/// `ConfigMap` key for the internal API server host
pub const SNAPSHOT_KEY_API_SERVER_INTERNAL_HOST: &str = "apiServerInternalHost";

/// `ConfigMap` key for the serialized provisioning parameters
pub const SNAPSHOT_KEY_PROVISIONING: &str = "provisioning.json";

/// Field manager used for server-side apply
pub const FIELD_MANAGER: &str = "baremetal-operator";

// ============================================================================
// Controller Error Handling Constants
// ============================================================================

/// Base requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Upper bound for the requeue backoff (5 minutes)
pub const MAX_ERROR_REQUEUE_DURATION_SECS: u64 = 300;

/// Default periodic resync interval (5 minutes)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default deadline for a single reconcile pass (1 minute)
pub const DEFAULT_RECONCILE_TIMEOUT_SECS: u64 = 60;

/// Attempts made to write status before giving up on repeated conflicts
pub const MAX_STATUS_UPDATE_ATTEMPTS: u32 = 5;

// ============================================================================
// Leader Election Constants
// ============================================================================

/// Default leader election lease name
pub const DEFAULT_LEASE_NAME: &str = "baremetal-operator-leader";

/// Default leader election lease duration (15 seconds)
pub const DEFAULT_LEASE_DURATION_SECS: u64 = 15;

/// Default leader election grace period before a lease is considered lost (5 seconds)
pub const DEFAULT_LEASE_GRACE_SECS: u64 = 5;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

/// Default namespace the operator runs in
pub const DEFAULT_OPERATOR_NAMESPACE: &str = "openshift-machine-api";

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
