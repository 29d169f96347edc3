// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Operator configuration from command-line flags and environment variables.
//!
//! Every flag has an environment fallback so the operator can be configured
//! entirely from its Deployment manifest.

use crate::constants::{
    DEFAULT_LEASE_DURATION_SECS, DEFAULT_LEASE_GRACE_SECS, DEFAULT_LEASE_NAME,
    DEFAULT_OPERATOR_NAMESPACE, DEFAULT_RECONCILE_TIMEOUT_SECS, DEFAULT_RESYNC_INTERVAL_SECS,
    METRICS_SERVER_BIND_ADDRESS, METRICS_SERVER_PORT,
};
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Configuration rejected by [`OperatorConfig::validate`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("lease grace period ({grace}s) must be shorter than the lease duration ({duration}s)")]
    LeaseGrace { grace: u64, duration: u64 },

    #[error("POD_NAME is required when leader election is enabled")]
    MissingIdentity,
}

fn default_metrics_address() -> SocketAddr {
    let ip = METRICS_SERVER_BIND_ADDRESS
        .parse::<IpAddr>()
        .unwrap_or(IpAddr::from([0, 0, 0, 0]));
    SocketAddr::new(ip, METRICS_SERVER_PORT)
}

/// Bare-metal provisioning operator
#[derive(Parser, Clone, Debug)]
#[command(name = "baremetal-operator", version, about, long_about = None)]
pub struct OperatorConfig {
    /// Namespace the operator runs in; holds the snapshot ConfigMap and the lease
    #[arg(long, env = "POD_NAMESPACE", default_value = DEFAULT_OPERATOR_NAMESPACE)]
    pub namespace: String,

    /// Address serving /metrics, /healthz and /readyz
    #[arg(long, env = "METRICS_BIND_ADDRESS", default_value_t = default_metrics_address())]
    pub metrics_bind_address: SocketAddr,

    /// Seconds between passes when nothing changes
    #[arg(long, env = "RESYNC_INTERVAL_SECS", default_value_t = DEFAULT_RESYNC_INTERVAL_SECS)]
    pub resync_interval_secs: u64,

    /// Upper bound in seconds on a single reconcile pass
    #[arg(long, env = "RECONCILE_TIMEOUT_SECS", default_value_t = DEFAULT_RECONCILE_TIMEOUT_SECS)]
    pub reconcile_timeout_secs: u64,

    /// Only reconcile while holding the leader lease
    #[arg(long, env = "LEADER_ELECTION_ENABLED")]
    pub leader_election: bool,

    /// Name of the leader election Lease
    #[arg(long, env = "LEADER_ELECTION_LEASE_NAME", default_value = DEFAULT_LEASE_NAME)]
    pub lease_name: String,

    /// Lease duration in seconds
    #[arg(long, env = "LEADER_ELECTION_LEASE_DURATION", default_value_t = DEFAULT_LEASE_DURATION_SECS)]
    pub lease_duration_secs: u64,

    /// Seconds before expiry at which the lease is renewed
    #[arg(long, env = "LEADER_ELECTION_LEASE_GRACE", default_value_t = DEFAULT_LEASE_GRACE_SECS)]
    pub lease_grace_secs: u64,

    /// Identity of this replica, used as the lease holder
    #[arg(long, env = "POD_NAME")]
    pub pod_name: Option<String>,

    /// Fixed addresses for the internal API host instead of DNS lookups
    #[arg(long, env = "API_SERVER_INTERNAL_ADDRESSES", value_delimiter = ',')]
    pub api_server_internal_addresses: Vec<IpAddr>,

    /// Log output format
    #[arg(long, env = "RUST_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, ignore_case = true)]
    pub log_format: LogFormat,
}

impl OperatorConfig {
    /// Check cross-field constraints clap cannot express.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.namespace.trim().is_empty() {
            return Err(ConfigError::Empty("namespace"));
        }
        if self.resync_interval_secs == 0 {
            return Err(ConfigError::Zero("resync interval"));
        }
        if self.reconcile_timeout_secs == 0 {
            return Err(ConfigError::Zero("reconcile timeout"));
        }
        if self.leader_election {
            if self.lease_name.trim().is_empty() {
                return Err(ConfigError::Empty("lease name"));
            }
            if self.lease_duration_secs == 0 {
                return Err(ConfigError::Zero("lease duration"));
            }
            if self.lease_grace_secs >= self.lease_duration_secs {
                return Err(ConfigError::LeaseGrace {
                    grace: self.lease_grace_secs,
                    duration: self.lease_duration_secs,
                });
            }
            if self.pod_name.as_deref().is_none_or(|n| n.trim().is_empty()) {
                return Err(ConfigError::MissingIdentity);
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    #[must_use]
    pub fn reconcile_timeout(&self) -> Duration {
        Duration::from_secs(self.reconcile_timeout_secs)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
