// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Address family classification of the cluster's internal API endpoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Address family mode the provisioning services are configured for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkStack {
    V4,
    V6,
    Dual,
}

impl NetworkStack {
    /// Wire value stored in status and in the configuration snapshot.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V4 => "v4",
            Self::V6 => "v6",
            Self::Dual => "dual",
        }
    }

    fn from_families(has_v4: bool, has_v6: bool) -> Self {
        match (has_v4, has_v6) {
            (true, true) => Self::Dual,
            (false, true) => Self::V6,
            // An empty set has nothing to say; the cluster default is IPv4
            _ => Self::V4,
        }
    }
}

impl fmt::Display for NetworkStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an address can carry cluster traffic.
fn qualifies(addr: IpAddr) -> bool {
    !addr.is_loopback() && !addr.is_unspecified()
}

/// Classify a set of addresses into a [`NetworkStack`].
///
/// IPv4-mapped IPv6 addresses count as IPv4. Loopback and unspecified addresses are
/// ignored unless nothing else is present, in which case every address counts.
/// Order and duplicates do not matter.
#[must_use]
pub fn network_stack(addrs: &[IpAddr]) -> NetworkStack {
    let canonical: Vec<IpAddr> = addrs.iter().map(IpAddr::to_canonical).collect();

    let mut qualifying = canonical.iter().copied().filter(|a| qualifies(*a)).peekable();
    let considered: Vec<IpAddr> = if qualifying.peek().is_some() {
        qualifying.collect()
    } else {
        canonical
    };

    NetworkStack::from_families(
        considered.iter().any(IpAddr::is_ipv4),
        considered.iter().any(IpAddr::is_ipv6),
    )
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod network_tests;
