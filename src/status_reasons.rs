// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition types and reasons written to the `Provisioning` singleton.
//!
//! The operator maintains a single encompassing `type: Ready` condition. Reasons are
//! programmatic identifiers in CamelCase that explain why the condition has its
//! current status.
//!
//! # Example Status
//!
//! ```yaml
//! status:
//!   conditions:
//!     - type: Ready
//!       status: "False"
//!       reason: EndpointMalformed
//!       message: "Internal API server endpoint 'https://:6443' is malformed: URL has no host"
//!   networkStack: dual
//!   apiServerInternalHost: api-int.ostest.test.metalkube.org
//! ```

/// Encompassing readiness condition type.
pub const CONDITION_TYPE_READY: &str = "Ready";

/// Condition status values.
pub const CONDITION_STATUS_TRUE: &str = "True";
pub const CONDITION_STATUS_FALSE: &str = "False";

// ============================================================================
// Success Reasons
// ============================================================================

/// The configuration snapshot was rendered and handed to the deployment sink.
pub const REASON_RECONCILED: &str = "Reconciled";

// ============================================================================
// Failure Reasons
// ============================================================================

/// The cluster platform could not be determined.
pub const REASON_PLATFORM_INDETERMINATE: &str = "PlatformIndeterminate";

/// Reading or writing a resource failed.
pub const REASON_STORE_ACCESS_FAILED: &str = "StoreAccessFailed";

/// The internal API server URL is missing or unparsable.
///
/// This usually indicates an upstream misconfiguration of the `Infrastructure`
/// resource and is surfaced to users instead of crash-looping.
pub const REASON_ENDPOINT_MALFORMED: &str = "EndpointMalformed";

/// Addresses of the internal API server could not be discovered.
pub const REASON_ADDRESS_LOOKUP_FAILED: &str = "AddressLookupFailed";

/// The deployment sink rejected the snapshot.
pub const REASON_SINK_FAILED: &str = "SinkFailed";

/// The pass was cancelled.
pub const REASON_CANCELLED: &str = "Cancelled";

/// The pass did not finish before its deadline.
pub const REASON_DEADLINE_EXCEEDED: &str = "DeadlineExceeded";
