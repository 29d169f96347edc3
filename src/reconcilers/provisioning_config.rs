// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reader for the `Provisioning` singleton.

use crate::constants::PROVISIONING_SINGLETON_NAME;
use crate::crd::Provisioning;
use crate::errors::ProvisioningError;
use crate::store::ResourceStore;
use tracing::debug;

/// Whether `name` identifies the singleton. Objects under any other name are ignored.
#[must_use]
pub fn is_singleton(name: &str) -> bool {
    name == PROVISIONING_SINGLETON_NAME
}

/// Read the `Provisioning` singleton.
///
/// `Ok(None)` means the subsystem is not configured, which is a normal state.
///
/// # Errors
///
/// Returns [`ProvisioningError::StoreAccessFailure`] for transport, permission, or
/// decoding failures.
pub async fn read_provisioning_cr<S: ResourceStore>(
    store: &S,
) -> Result<Option<Provisioning>, ProvisioningError> {
    let found = store.get::<Provisioning>(PROVISIONING_SINGLETON_NAME).await?;

    if found.is_none() {
        debug!(
            name = PROVISIONING_SINGLETON_NAME,
            "Provisioning configuration not found"
        );
    }
    Ok(found)
}

#[cfg(test)]
#[path = "provisioning_config_tests.rs"]
mod provisioning_config_tests;
