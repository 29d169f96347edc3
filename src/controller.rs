// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Controller wiring for the `Provisioning` singleton.
//!
//! The controller watches `Provisioning` objects and the `Infrastructure`
//! singleton. Infrastructure events are mapped onto the `Provisioning` singleton,
//! so every trigger results in the same full pass over current state. The runtime
//! guarantees a single in-flight pass per object and coalesces queued triggers.

use crate::constants::{
    ERROR_REQUEUE_DURATION_SECS, INFRASTRUCTURE_SINGLETON_NAME, PROVISIONING_SINGLETON_NAME,
};
use crate::context::Context;
use crate::crd::{Infrastructure, Provisioning};
use crate::errors::ProvisioningError;
use crate::metrics;
use crate::reconcilers::provisioning::{reconcile_provisioning, PassGuard, ReconcileOutcome};
use crate::reconcilers::provisioning_config::is_singleton;
use crate::store::ResourceStore;
use futures::StreamExt;
use kube::api::Api;
use kube::runtime::controller::Action;
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher::Config as WatcherConfig;
use kube::runtime::Controller;
use kube::{Client, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// State shared by all passes run by the controller.
pub struct ControllerState<S: ResourceStore> {
    pub ctx: Context<S>,
    /// Cancelled on shutdown or loss of leadership; aborts in-flight passes.
    pub shutdown: CancellationToken,
}

impl<S: ResourceStore> ControllerState<S> {
    #[must_use]
    pub fn new(ctx: Context<S>, shutdown: CancellationToken) -> Self {
        Self { ctx, shutdown }
    }
}

/// Turn an outcome into the controller's next action.
///
/// Failed passes requeue after the delay the outcome requests, doubled per earlier
/// failure in the streak; clean passes reset the streak and wait for the next
/// resync. Cancelled passes are not requeued.
pub fn next_action<S: ResourceStore>(ctx: &Context<S>, outcome: &ReconcileOutcome) -> Action {
    match (outcome.error, outcome.requeue_after) {
        (Some(kind), Some(requested)) => {
            let delay = ctx.record_failure(requested);
            metrics::record_reconciliation_requeue("error");
            warn!(
                error = kind.metric_label(),
                retry_in = ?delay,
                failures = ctx.consecutive_failures(),
                "Reconcile pass failed, requeueing"
            );
            Action::requeue(delay)
        }
        (Some(kind), None) => {
            debug!(error = kind.metric_label(), "Reconcile pass not retried");
            Action::await_change()
        }
        (None, _) => {
            ctx.record_success();
            metrics::record_reconciliation_requeue("resync");
            Action::requeue(ctx.resync_interval)
        }
    }
}

/// Reconcile entry point handed to the controller runtime.
///
/// # Errors
///
/// Never fails; every error is captured in the pass outcome.
pub async fn reconcile<S: ResourceStore>(
    object: Arc<Provisioning>,
    state: Arc<ControllerState<S>>,
) -> Result<Action, ProvisioningError> {
    let name = object.name_any();
    if !is_singleton(&name) {
        debug!(name = %name, "Ignoring Provisioning object that is not the singleton");
        return Ok(Action::await_change());
    }

    let guard = PassGuard::new(state.shutdown.child_token(), state.ctx.reconcile_timeout);
    let outcome = reconcile_provisioning(&state.ctx, &guard).await;
    Ok(next_action(&state.ctx, &outcome))
}

/// Error policy for the controller.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
pub fn error_policy<S: ResourceStore>(
    object: Arc<Provisioning>,
    err: &ProvisioningError,
    state: Arc<ControllerState<S>>,
) -> Action {
    let delay = state
        .ctx
        .record_failure(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS));
    error!(
        error = %err,
        name = %object.name_any(),
        "Reconciliation error - will retry in {}s",
        delay.as_secs()
    );
    Action::requeue(delay)
}

/// Map any `Infrastructure` event onto the `Provisioning` singleton.
#[must_use]
pub fn infrastructure_trigger(_infra: Infrastructure) -> Option<ObjectRef<Provisioning>> {
    Some(ObjectRef::new(PROVISIONING_SINGLETON_NAME))
}

/// Run the controller until `state.shutdown` is cancelled.
pub async fn run_controller<S: ResourceStore + 'static>(
    client: Client,
    state: Arc<ControllerState<S>>,
) {
    info!("Starting Provisioning controller");

    let provisioning_api = Api::<Provisioning>::all(client.clone());
    let infrastructure_api = Api::<Infrastructure>::all(client);
    let infrastructure_config = WatcherConfig::default()
        .fields(&format!("metadata.name={INFRASTRUCTURE_SINGLETON_NAME}"));

    let shutdown = state.shutdown.clone();
    Controller::new(provisioning_api, WatcherConfig::default())
        .watches(infrastructure_api, infrastructure_config, infrastructure_trigger)
        .graceful_shutdown_on(shutdown.cancelled_owned())
        .run(reconcile, error_policy, state)
        .for_each(|result| {
            if let Err(e) = result {
                debug!(error = %e, "Controller reported an error");
            }
            futures::future::ready(())
        })
        .await;

    info!("Provisioning controller stopped");
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
