// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lease-based leader election.
//!
//! Only one replica may write `Provisioning` status and the snapshot at a time.
//! A replica blocks in [`Leadership::acquire`] until it holds the lease, runs the
//! controller, and stops it as soon as [`Leadership::lost`] resolves.

use crate::config::OperatorConfig;
use crate::metrics;
use anyhow::{anyhow, Context as _, Result};
use kube::Client;
use kube_lease_manager::{LeaseManager, LeaseManagerBuilder};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Parameters of the leader lease.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaseSettings {
    pub lease_name: String,
    pub namespace: String,
    pub identity: String,
    pub duration_secs: u64,
    pub grace_secs: u64,
}

impl LeaseSettings {
    /// Lease settings from a validated configuration, or `None` when leader
    /// election is disabled.
    #[must_use]
    pub fn from_config(config: &OperatorConfig) -> Option<Self> {
        if !config.leader_election {
            return None;
        }
        Some(Self {
            lease_name: config.lease_name.clone(),
            namespace: config.namespace.clone(),
            identity: config.pod_name.clone().unwrap_or_default(),
            duration_secs: config.lease_duration_secs,
            grace_secs: config.lease_grace_secs,
        })
    }
}

/// A held leader lease.
pub struct Leadership {
    identity: String,
    channel: watch::Receiver<bool>,
    task: JoinHandle<kube_lease_manager::Result<LeaseManager>>,
}

impl Leadership {
    /// Block until this replica holds the lease.
    ///
    /// # Errors
    ///
    /// Fails if the lease manager cannot be built or stops before the lease is acquired.
    pub async fn acquire(client: Client, settings: &LeaseSettings) -> Result<Self> {
        info!(
            lease = %settings.lease_name,
            namespace = %settings.namespace,
            identity = %settings.identity,
            "Waiting for leadership"
        );

        let manager = LeaseManagerBuilder::new(client, &settings.lease_name)
            .with_namespace(&settings.namespace)
            .with_identity(&settings.identity)
            .with_duration(settings.duration_secs)
            .with_grace(settings.grace_secs)
            .build()
            .await
            .context("failed to create lease manager")?;

        let (mut channel, task) = manager.watch().await;
        while !*channel.borrow_and_update() {
            channel
                .changed()
                .await
                .map_err(|_| anyhow!("lease manager stopped before leadership was acquired"))?;
        }

        info!(identity = %settings.identity, "Leadership acquired");
        metrics::record_leader_elected(&settings.identity);

        Ok(Self {
            identity: settings.identity.clone(),
            channel,
            task,
        })
    }

    /// Resolve once the lease is no longer held.
    pub async fn lost(&mut self) {
        loop {
            if self.channel.changed().await.is_err() {
                warn!("Lease manager stopped");
                break;
            }
            if !*self.channel.borrow_and_update() {
                break;
            }
        }
        warn!(identity = %self.identity, "Leadership lost");
        metrics::record_leader_lost(&self.identity);
    }

    /// Release the lease and wait for the manager to stop.
    pub async fn release(self) {
        drop(self.channel);
        match self.task.await {
            Ok(Ok(_)) => debug!("Lease released"),
            Ok(Err(e)) => warn!(error = %e, "Lease manager failed while releasing"),
            Err(e) => warn!(error = %e, "Lease manager task panicked"),
        }
    }
}

#[cfg(test)]
#[path = "leader_tests.rs"]
mod leader_tests;
