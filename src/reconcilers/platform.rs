// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Platform predicate: is the provisioning subsystem applicable to this cluster?

use crate::constants::{INFRASTRUCTURE_SINGLETON_NAME, PLATFORM_BAREMETAL, PLATFORM_NONE};
use crate::crd::Infrastructure;
use crate::errors::ProvisioningError;
use crate::store::ResourceStore;
use tracing::debug;

/// Platform reported by the `Infrastructure` status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformType {
    BareMetal,
    /// Explicitly no platform integration.
    None,
    /// Any other concrete platform (`AWS`, `OpenStack`, ...).
    Other(String),
    /// Empty or absent platform field.
    Unset,
}

impl From<&str> for PlatformType {
    fn from(value: &str) -> Self {
        match value {
            "" => Self::Unset,
            PLATFORM_BAREMETAL => Self::BareMetal,
            PLATFORM_NONE => Self::None,
            other => Self::Other(other.to_string()),
        }
    }
}

impl PlatformType {
    /// Read the platform off an `Infrastructure` object.
    ///
    /// The top-level `platform` field wins; `platformStatus.type` is consulted only
    /// when it is empty. Returns `None` when the object carries no status at all.
    #[must_use]
    pub fn of(infra: &Infrastructure) -> Option<Self> {
        let status = infra.status.as_ref()?;
        let platform = status
            .platform
            .as_deref()
            .filter(|p| !p.is_empty())
            .or_else(|| {
                status
                    .platform_status
                    .as_ref()
                    .and_then(|ps| ps.platform_type.as_deref())
            })
            .unwrap_or_default();
        Some(Self::from(platform))
    }
}

/// Decide applicability from an already fetched `Infrastructure` object.
///
/// # Errors
///
/// Returns [`ProvisioningError::PlatformIndeterminate`] when the object has no status
/// or reports a platform other than `BareMetal`, `None`, or unset. The caller must
/// not treat that as "disabled".
pub fn platform_enabled(infra: &Infrastructure) -> Result<bool, ProvisioningError> {
    match PlatformType::of(infra) {
        Some(PlatformType::BareMetal) => Ok(true),
        Some(PlatformType::Unset | PlatformType::None) => Ok(false),
        Some(PlatformType::Other(platform)) => Err(ProvisioningError::PlatformIndeterminate {
            reason: format!("unsupported platform '{platform}'"),
        }),
        None => Err(ProvisioningError::PlatformIndeterminate {
            reason: "Infrastructure status is missing".to_string(),
        }),
    }
}

/// Fetch the `Infrastructure` singleton.
///
/// # Errors
///
/// Returns [`ProvisioningError::StoreAccessFailure`] if the read fails and
/// [`ProvisioningError::PlatformIndeterminate`] if the singleton does not exist.
pub async fn fetch_infrastructure<S: ResourceStore>(
    store: &S,
) -> Result<Infrastructure, ProvisioningError> {
    store
        .get::<Infrastructure>(INFRASTRUCTURE_SINGLETON_NAME)
        .await?
        .ok_or_else(|| ProvisioningError::PlatformIndeterminate {
            reason: format!("Infrastructure '{INFRASTRUCTURE_SINGLETON_NAME}' not found"),
        })
}

/// Whether the provisioning subsystem applies to this cluster.
///
/// # Errors
///
/// Fails when the platform cannot be determined; see [`platform_enabled`] and
/// [`fetch_infrastructure`].
pub async fn is_enabled<S: ResourceStore>(store: &S) -> Result<bool, ProvisioningError> {
    let infra = fetch_infrastructure(store).await?;
    let enabled = platform_enabled(&infra)?;
    debug!(enabled, "Evaluated platform predicate");
    Ok(enabled)
}

#[cfg(test)]
#[path = "platform_tests.rs"]
mod platform_tests;
