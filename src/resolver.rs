// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Address discovery for the internal API server host.
//!
//! The network stack classifier works on the set of addresses the internal API
//! server is reachable at. [`DnsResolver`] asks the system resolver, while
//! [`StaticResolver`] serves a fixed table for tests and clusters without usable
//! DNS from the operator pod.

use crate::errors::ProvisioningError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::net::IpAddr;
use tracing::debug;

/// Port handed to the system resolver; only the addresses are used.
const LOOKUP_PORT: u16 = 0;

/// Resolves a host name to the addresses it is reachable at.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Look up `host`.
    ///
    /// Returned addresses are de-duplicated and keep first-seen order.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::AddressLookupFailure`] when the host cannot be
    /// resolved or resolves to nothing.
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ProvisioningError>;
}

/// Drop repeated addresses, keeping the first occurrence of each.
#[must_use]
pub fn dedup_addresses(addrs: impl IntoIterator<Item = IpAddr>) -> Vec<IpAddr> {
    let mut out: Vec<IpAddr> = Vec::new();
    for addr in addrs {
        if !out.contains(&addr) {
            out.push(addr);
        }
    }
    out
}

/// Parse an IP literal, accepting the bracketed IPv6 form a URL host carries.
fn parse_literal(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse()
        .ok()
}

fn lookup_failure(host: &str, reason: impl Into<String>) -> ProvisioningError {
    ProvisioningError::AddressLookupFailure {
        host: host.to_string(),
        reason: reason.into(),
    }
}

/// Resolver backed by the system resolver through `tokio::net::lookup_host`.
#[derive(Clone, Debug, Default)]
pub struct DnsResolver;

impl DnsResolver {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AddressResolver for DnsResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ProvisioningError> {
        if let Some(addr) = parse_literal(host) {
            return Ok(vec![addr]);
        }

        let resolved = tokio::net::lookup_host((host, LOOKUP_PORT))
            .await
            .map_err(|e| lookup_failure(host, e.to_string()))?;
        let addrs = dedup_addresses(resolved.map(|sa| sa.ip()));

        if addrs.is_empty() {
            return Err(lookup_failure(host, "no addresses returned"));
        }

        debug!(host = %host, addresses = ?addrs, "Resolved internal API host");
        Ok(addrs)
    }
}

/// Resolver answering from a fixed host table.
///
/// IP literals resolve to themselves. Other unknown names get the fallback
/// addresses when one is configured, and fail otherwise.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    hosts: BTreeMap<String, Vec<IpAddr>>,
    fallback: Vec<IpAddr>,
}

impl StaticResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the addresses of `host`.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>, addrs: Vec<IpAddr>) -> Self {
        self.hosts.insert(host.into(), addrs);
        self
    }

    /// Answer every host missing from the table with `addrs`.
    #[must_use]
    pub fn with_fallback(mut self, addrs: Vec<IpAddr>) -> Self {
        self.fallback = dedup_addresses(addrs);
        self
    }
}

#[async_trait]
impl AddressResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Result<Vec<IpAddr>, ProvisioningError> {
        if let Some(addrs) = self.hosts.get(host) {
            let addrs = dedup_addresses(addrs.iter().copied());
            if addrs.is_empty() {
                return Err(lookup_failure(host, "no addresses configured"));
            }
            return Ok(addrs);
        }

        if let Some(addr) = parse_literal(host) {
            return Ok(vec![addr]);
        }
        if self.fallback.is_empty() {
            return Err(lookup_failure(host, "host not in static table"));
        }
        Ok(self.fallback.clone())
    }
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod resolver_tests;
