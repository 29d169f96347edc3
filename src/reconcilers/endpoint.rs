// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Internal API server endpoint resolution.

use super::platform::fetch_infrastructure;
use crate::crd::Infrastructure;
use crate::errors::ProvisioningError;
use crate::store::ResourceStore;
use url::{Host, Url};

fn malformed(url: &str, reason: impl Into<String>) -> ProvisioningError {
    ProvisioningError::EndpointMalformed {
        url: url.to_string(),
        reason: reason.into(),
    }
}

/// Host component of the internal API server URL, without scheme or port.
///
/// IPv6 hosts are returned without brackets.
///
/// # Errors
///
/// Returns [`ProvisioningError::EndpointMalformed`] if the URL is absent, cannot be
/// parsed, or carries no host.
///
/// # Example
///
/// ```
/// use baremetal_operator::crd::{Infrastructure, InfrastructureSpec, InfrastructureStatus};
/// use baremetal_operator::reconcilers::endpoint::api_server_internal_host;
///
/// let mut infra = Infrastructure::new("cluster", InfrastructureSpec::default());
/// infra.status = Some(InfrastructureStatus {
///     api_server_internal_url: Some("https://api-int.ostest.test.metalkube.org:6443".into()),
///     ..InfrastructureStatus::default()
/// });
///
/// assert_eq!(
///     api_server_internal_host(&infra).unwrap(),
///     "api-int.ostest.test.metalkube.org"
/// );
/// ```
pub fn api_server_internal_host(infra: &Infrastructure) -> Result<String, ProvisioningError> {
    let raw = infra
        .status
        .as_ref()
        .and_then(|s| s.api_server_internal_url.as_deref())
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| malformed("", "apiServerInternalURI is not set"))?;

    let url = Url::parse(raw).map_err(|e| malformed(raw, e.to_string()))?;

    match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => Ok(domain.to_string()),
        Some(Host::Ipv4(addr)) => Ok(addr.to_string()),
        Some(Host::Ipv6(addr)) => Ok(addr.to_string()),
        _ => Err(malformed(raw, "URL has no host")),
    }
}

/// Fetch the `Infrastructure` singleton and extract the internal API host.
///
/// # Errors
///
/// Propagates store and lookup failures from the fetch, then the errors of
/// [`api_server_internal_host`].
pub async fn resolve_api_server_internal_host<S: ResourceStore>(
    store: &S,
) -> Result<String, ProvisioningError> {
    let infra = fetch_infrastructure(store).await?;
    api_server_internal_host(&infra)
}

#[cfg(test)]
#[path = "endpoint_tests.rs"]
mod endpoint_tests;
