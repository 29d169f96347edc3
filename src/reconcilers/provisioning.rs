// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconcile pass for the `Provisioning` singleton.
//!
//! A pass moves through these states:
//!
//! ```text
//! Start -> DeterminePlatform -> { Disabled | ReadConfig }
//!       -> { Unconfigured | ComputeDerived } -> Converge
//!       -> { Success | RequeueWithBackoff }
//! ```
//!
//! The platform is always evaluated first; an error or "disabled" answer ends the
//! pass before any configuration is trusted. Reads run under a [`PassGuard`] and
//! are abandoned if the pass is cancelled or overruns its deadline. Convergence
//! (sink apply, then status write) starts only while the guard is clear and then
//! runs to completion.
//!
//! The pass never fails as a whole: every error is captured in the returned
//! [`ReconcileOutcome`], which depends only on the observed state and is therefore
//! identical across passes over unchanged state.

use super::endpoint::api_server_internal_host;
use super::network::{network_stack, NetworkStack};
use super::platform::{fetch_infrastructure, platform_enabled};
use super::provisioning_config::read_provisioning_cr;
use super::status::{write_status, DerivedStatus, DesiredStatus};
use crate::constants::ERROR_REQUEUE_DURATION_SECS;
use crate::context::Context;
use crate::crd::{Infrastructure, ProvisioningSpec};
use crate::errors::{ErrorKind, ProvisioningError};
use crate::metrics;
use crate::status_reasons::{CONDITION_STATUS_FALSE, CONDITION_STATUS_TRUE, REASON_RECONCILED};
use crate::store::ResourceStore;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Result of one reconcile pass.
///
/// Carries no timestamps so that two passes over the same state compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Whether the platform supports the provisioning subsystem.
    pub enabled: bool,
    /// Spec of the `Provisioning` singleton, when it exists and was read.
    pub config: Option<ProvisioningSpec>,
    pub network_stack: Option<NetworkStack>,
    /// Host of the internal API server URL.
    pub internal_host: Option<String>,
    pub error: Option<ErrorKind>,
    /// Delay requested before retrying a failed pass; `None` means no retry is
    /// requested. The controller waits exactly this long after a first failure and
    /// doubles it for each further failure in a row, so the value itself stays the
    /// same across passes over unchanged state.
    pub requeue_after: Option<Duration>,
}

impl ReconcileOutcome {
    /// Platform does not apply; nothing to do.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Platform applies but the singleton does not exist.
    #[must_use]
    pub fn unconfigured() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Everything was computed and handed to the sink.
    #[must_use]
    pub fn converged(config: ProvisioningSpec, stack: NetworkStack, host: String) -> Self {
        Self {
            enabled: true,
            config: Some(config),
            network_stack: Some(stack),
            internal_host: Some(host),
            error: None,
            requeue_after: None,
        }
    }

    /// Attach an error and the matching requeue.
    #[must_use]
    pub fn with_error(mut self, error: &ProvisioningError) -> Self {
        let kind = error.kind();
        self.error = Some(kind);
        self.requeue_after = kind
            .is_retryable()
            .then(|| Duration::from_secs(ERROR_REQUEUE_DURATION_SECS));
        self
    }

    /// Whether the pass reached the sink with a full snapshot.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        self.error.is_none() && self.network_stack.is_some() && self.internal_host.is_some()
    }
}

/// Cancellation and deadline for one pass.
#[derive(Clone, Debug)]
pub struct PassGuard {
    token: CancellationToken,
    timeout: Duration,
    deadline: Instant,
}

impl PassGuard {
    /// Guard a pass that must finish within `timeout` from now.
    #[must_use]
    pub fn new(token: CancellationToken, timeout: Duration) -> Self {
        Self {
            token,
            timeout,
            deadline: Instant::now() + timeout,
        }
    }

    /// Fail if the pass has been cancelled or is past its deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisioningError::Cancelled`] or [`ProvisioningError::DeadlineExceeded`].
    pub fn check(&self) -> Result<(), ProvisioningError> {
        if self.token.is_cancelled() {
            Err(ProvisioningError::Cancelled)
        } else if Instant::now() >= self.deadline {
            Err(ProvisioningError::DeadlineExceeded(self.timeout))
        } else {
            Ok(())
        }
    }

    /// Run `fut` unless the pass is cancelled or its deadline passes first.
    ///
    /// # Errors
    ///
    /// Returns the error of `fut`, or the guard's own error if it fires first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ProvisioningError>
    where
        F: Future<Output = Result<T, ProvisioningError>>,
    {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(ProvisioningError::Cancelled),
            () = tokio::time::sleep_until(self.deadline) => {
                Err(ProvisioningError::DeadlineExceeded(self.timeout))
            }
            result = fut => result,
        }
    }
}

/// Values derived from the observed infrastructure.
async fn compute_derived<S: ResourceStore>(
    ctx: &Context<S>,
    infra: &Infrastructure,
) -> Result<(NetworkStack, String), ProvisioningError> {
    let host = api_server_internal_host(infra)?;
    let addrs = ctx.resolver.resolve(&host).await?;
    let stack = network_stack(&addrs);
    debug!(host = %host, addresses = ?addrs, network_stack = %stack, "Computed derived configuration");
    Ok((stack, host))
}

/// Record a failed pass on the `Ready` condition.
///
/// Status write failures are logged and otherwise ignored so that the original
/// error remains the one reported.
async fn report_failure<S: ResourceStore>(ctx: &Context<S>, error: &ProvisioningError) {
    let desired = DesiredStatus {
        ready: CONDITION_STATUS_FALSE,
        reason: error.kind().reason(),
        message: error.to_string(),
        derived: None,
    };
    match write_status(&ctx.store, &desired).await {
        Ok(true) => metrics::record_status_update(),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "Failed to record failure condition on Provisioning"),
    }
}

async fn run_pass<S: ResourceStore>(ctx: &Context<S>, guard: &PassGuard) -> ReconcileOutcome {
    // DeterminePlatform: no writes of any kind when this fails
    let infra = match guard.run(fetch_infrastructure(&ctx.store)).await {
        Ok(infra) => infra,
        Err(e) => {
            warn!(error = %e, "Could not read Infrastructure");
            return ReconcileOutcome::disabled().with_error(&e);
        }
    };
    let enabled = match platform_enabled(&infra) {
        Ok(enabled) => enabled,
        Err(e) => {
            warn!(error = %e, "Platform is indeterminate");
            return ReconcileOutcome::disabled().with_error(&e);
        }
    };
    if !enabled {
        debug!("Platform is not bare metal, provisioning does not apply");
        return ReconcileOutcome::disabled();
    }

    // ReadConfig
    let provisioning = match guard.run(read_provisioning_cr(&ctx.store)).await {
        Ok(Some(provisioning)) => provisioning,
        Ok(None) => {
            info!("Provisioning configuration absent, nothing to do");
            return ReconcileOutcome::unconfigured();
        }
        Err(e) => {
            warn!(error = %e, "Could not read Provisioning configuration");
            return ReconcileOutcome::unconfigured().with_error(&e);
        }
    };
    let config = provisioning.spec;
    let configured = ReconcileOutcome {
        config: Some(config.clone()),
        ..ReconcileOutcome::unconfigured()
    };

    // ComputeDerived
    let (stack, host) = match guard.run(compute_derived(ctx, &infra)).await {
        Ok(derived) => derived,
        Err(e) => {
            warn!(error = %e, "Failed to compute derived configuration");
            if !matches!(e.kind(), ErrorKind::Cancelled | ErrorKind::DeadlineExceeded) {
                report_failure(ctx, &e).await;
            }
            return configured.with_error(&e);
        }
    };

    // Converge, entered only with the guard clear and never interrupted
    if let Err(e) = guard.check() {
        warn!(error = %e, "Pass aborted before convergence");
        return configured.with_error(&e);
    }

    let outcome = ReconcileOutcome::converged(config, stack, host.clone());
    if let Err(e) = ctx.sink.apply(&outcome).await {
        warn!(error = %e, "Deployment sink rejected configuration snapshot");
        report_failure(ctx, &e).await;
        return outcome.with_error(&e);
    }

    let desired = DesiredStatus {
        ready: CONDITION_STATUS_TRUE,
        reason: REASON_RECONCILED,
        message: format!("Provisioning configured for {stack} network stack via {host}"),
        derived: Some(DerivedStatus {
            network_stack: stack.as_str().to_string(),
            api_server_internal_host: host,
        }),
    };
    match write_status(&ctx.store, &desired).await {
        Ok(written) => {
            if written {
                metrics::record_status_update();
            }
            outcome
        }
        Err(e) => {
            warn!(error = %e, "Failed to update Provisioning status");
            outcome.with_error(&e)
        }
    }
}

/// Run one reconcile pass and record its metrics.
///
/// The returned outcome is the complete result of the pass; nothing is returned
/// through an error channel.
pub async fn reconcile_provisioning<S: ResourceStore>(
    ctx: &Context<S>,
    guard: &PassGuard,
) -> ReconcileOutcome {
    let start = std::time::Instant::now();
    debug!("Starting Provisioning reconcile pass");

    let outcome = run_pass(ctx, guard).await;
    let duration = start.elapsed();

    if outcome.enabled || outcome.error.is_none() {
        metrics::set_provisioning_enabled(outcome.enabled);
    }

    match outcome.error {
        Some(kind) => {
            metrics::record_reconciliation_error(duration);
            metrics::record_error(kind.metric_label());
        }
        None if !outcome.enabled => metrics::record_reconciliation_disabled(duration),
        None if outcome.config.is_none() => metrics::record_reconciliation_unconfigured(duration),
        None => {
            info!(
                network_stack = ?outcome.network_stack.map(NetworkStack::as_str),
                internal_host = ?outcome.internal_host,
                "Provisioning reconciled"
            );
            metrics::record_reconciliation_success(duration);
        }
    }

    outcome
}

#[cfg(test)]
#[path = "provisioning_tests.rs"]
mod provisioning_tests;
