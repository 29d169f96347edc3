// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Common label constants applied to resources created by the operator.

use std::collections::BTreeMap;

// ============================================================================
// Kubernetes Standard Labels
// https://kubernetes.io/docs/concepts/overview/working-with-objects/common-labels/
// ============================================================================

/// Standard label for the component name within the architecture
pub const K8S_COMPONENT: &str = "app.kubernetes.io/component";

/// Standard label for the tool being used to manage the operation of an application
pub const K8S_MANAGED_BY: &str = "app.kubernetes.io/managed-by";

/// Standard label for the name of a higher-level application this one is part of
pub const K8S_PART_OF: &str = "app.kubernetes.io/part-of";

// ============================================================================
// Label Values
// ============================================================================

/// Value for `app.kubernetes.io/part-of`
pub const PART_OF_METAL3: &str = "metal3";

/// Value for `app.kubernetes.io/managed-by`
pub const MANAGED_BY_OPERATOR: &str = "baremetal-operator";

/// Component value for the provisioning snapshot
pub const COMPONENT_PROVISIONING: &str = "provisioning";

/// Labels stamped on every object the operator materializes.
#[must_use]
pub fn managed_labels() -> BTreeMap<String, String> {
    BTreeMap::from([
        (K8S_MANAGED_BY.to_string(), MANAGED_BY_OPERATOR.to_string()),
        (K8S_PART_OF.to_string(), PART_OF_METAL3.to_string()),
        (K8S_COMPONENT.to_string(), COMPONENT_PROVISIONING.to_string()),
    ])
}
