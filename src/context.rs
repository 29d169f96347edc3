// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared context for the provisioning controller.
//!
//! Every reconcile pass receives an `Arc<Context<S>>` that holds:
//! - The resource store used for all reads and status writes
//! - The address resolver for the internal API server host
//! - The deployment sink that materializes the configuration snapshot
//! - Pass timing (per-pass timeout, resync interval)
//!
//! There is no process-wide client or registry; tests build a context over
//! [`MemoryStore`](crate::store::MemoryStore) and in-memory collaborators.

use crate::constants::{DEFAULT_RECONCILE_TIMEOUT_SECS, DEFAULT_RESYNC_INTERVAL_SECS};
use crate::reconcilers::retry::scaled_requeue_delay;
use crate::resolver::AddressResolver;
use crate::sink::DeploymentSink;
use crate::store::ResourceStore;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared context passed to every reconcile pass.
pub struct Context<S: ResourceStore> {
    /// Resource store for reads and status writes
    pub store: S,

    /// Resolver for the internal API server host
    pub resolver: Arc<dyn AddressResolver>,

    /// Consumer of the reconcile outcome
    pub sink: Arc<dyn DeploymentSink>,

    /// Upper bound on the duration of a single pass
    pub reconcile_timeout: Duration,

    /// Delay before the next pass after a clean one
    pub resync_interval: Duration,

    /// Failed passes in a row, drives the requeue backoff
    consecutive_failures: AtomicU32,
}

impl<S: ResourceStore> Context<S> {
    /// Create a context with default pass timing.
    pub fn new(store: S, resolver: Arc<dyn AddressResolver>, sink: Arc<dyn DeploymentSink>) -> Self {
        Self {
            store,
            resolver,
            sink,
            reconcile_timeout: Duration::from_secs(DEFAULT_RECONCILE_TIMEOUT_SECS),
            resync_interval: Duration::from_secs(DEFAULT_RESYNC_INTERVAL_SECS),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn with_reconcile_timeout(mut self, timeout: Duration) -> Self {
        self.reconcile_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_resync_interval(mut self, interval: Duration) -> Self {
        self.resync_interval = interval;
        self
    }

    /// Count a failed pass that asked to be retried after `base`, and return the
    /// delay before the next one (`base` doubled per earlier failure in the streak).
    pub fn record_failure(&self, base: Duration) -> Duration {
        let failures = self
            .consecutive_failures
            .fetch_add(1, Ordering::SeqCst)
            .saturating_add(1);
        scaled_requeue_delay(base, failures)
    }

    /// Reset the failure streak after a clean pass.
    pub fn record_success(&self) {
        self.consecutive_failures.store(0, Ordering::SeqCst);
    }

    #[must_use]
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
