// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Status condition helpers and the `Provisioning` status writer.
//!
//! Kubernetes conditions follow a standard format:
//! - `type`: The aspect of the resource being reported (e.g., "Ready")
//! - `status`: "True", "False", or "Unknown"
//! - `reason`: A programmatic identifier (CamelCase)
//! - `message`: A human-readable explanation
//! - `lastTransitionTime`: RFC3339 timestamp when the status last flipped
//!
//! Status is written at most once per pass and only when it differs semantically
//! from what is stored, so a converged object does not generate watch events that
//! would retrigger the controller. Optimistic concurrency conflicts are resolved by
//! re-reading the object and recomputing the status on top of it.

use super::provisioning_config::read_provisioning_cr;
use crate::constants::MAX_STATUS_UPDATE_ATTEMPTS;
use crate::crd::{Condition, Provisioning, ProvisioningStatus};
use crate::errors::ProvisioningError;
use crate::status_reasons::CONDITION_TYPE_READY;
use crate::store::ResourceStore;
use chrono::Utc;
use kube::ResourceExt;
use tracing::{debug, warn};

/// Create a new Kubernetes condition with the current timestamp.
///
/// # Example
///
/// ```
/// # use baremetal_operator::reconcilers::status::create_condition;
/// let condition = create_condition("Ready", "True", "Reconciled", "Provisioning configured");
/// assert_eq!(condition.r#type, "Ready");
/// assert_eq!(condition.status, "True");
/// ```
#[must_use]
pub fn create_condition(
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) -> Condition {
    Condition {
        r#type: condition_type.to_string(),
        status: status.to_string(),
        reason: Some(reason.to_string()),
        message: Some(message.to_string()),
        last_transition_time: Some(Utc::now().to_rfc3339()),
    }
}

/// Check if a condition has changed compared to the existing one.
///
/// Type, status, reason and message are compared; `lastTransitionTime` is not.
#[must_use]
pub fn condition_changed(existing: Option<&Condition>, new_condition: &Condition) -> bool {
    existing.is_none_or(|current| {
        current.r#type != new_condition.r#type
            || current.status != new_condition.status
            || current.reason != new_condition.reason
            || current.message != new_condition.message
    })
}

/// Find a condition by type.
#[must_use]
pub fn find_condition<'a>(
    conditions: &'a [Condition],
    condition_type: &str,
) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.r#type == condition_type)
}

/// Update or add a condition in a conditions list (in-memory, no API call).
///
/// The existing `lastTransitionTime` is kept when the status value does not flip.
pub fn merge_condition(
    conditions: &mut Vec<Condition>,
    condition_type: &str,
    status: &str,
    reason: &str,
    message: &str,
) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == condition_type) {
        let last_transition_time = if existing.status == status {
            existing
                .last_transition_time
                .clone()
                .unwrap_or_else(|| Utc::now().to_rfc3339())
        } else {
            Utc::now().to_rfc3339()
        };

        existing.status = status.to_string();
        existing.reason = Some(reason.to_string());
        existing.message = Some(message.to_string());
        existing.last_transition_time = Some(last_transition_time);
    } else {
        conditions.push(create_condition(condition_type, status, reason, message));
    }
}

/// Compare two condition lists, ignoring `lastTransitionTime`.
#[must_use]
pub fn conditions_equal(current: &[Condition], new: &[Condition]) -> bool {
    current.len() == new.len()
        && new
            .iter()
            .all(|c| !condition_changed(find_condition(current, &c.r#type), c))
}

/// Status a pass wants to see on the `Provisioning` singleton.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DesiredStatus {
    /// `Ready` condition status ("True"/"False")
    pub ready: &'static str,
    pub reason: &'static str,
    pub message: String,
    /// Derived values; `None` leaves the stored ones untouched.
    pub derived: Option<DerivedStatus>,
}

/// Values computed on the success path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DerivedStatus {
    pub network_stack: String,
    pub api_server_internal_host: String,
}

/// Collects status changes for one `Provisioning` object and writes them in a single call.
pub struct ProvisioningStatusUpdater {
    object: Provisioning,
    current_status: Option<ProvisioningStatus>,
    new_status: ProvisioningStatus,
}

impl ProvisioningStatusUpdater {
    /// Start from the status currently stored on `object`.
    #[must_use]
    pub fn new(object: Provisioning) -> Self {
        let current_status = object.status.clone();
        let new_status = current_status.clone().unwrap_or_default();
        Self {
            object,
            current_status,
            new_status,
        }
    }

    pub fn set_condition(&mut self, condition_type: &str, status: &str, reason: &str, message: &str) {
        merge_condition(
            &mut self.new_status.conditions,
            condition_type,
            status,
            reason,
            message,
        );
    }

    pub fn set_derived(&mut self, derived: &DerivedStatus) {
        self.new_status.network_stack = Some(derived.network_stack.clone());
        self.new_status.api_server_internal_host = Some(derived.api_server_internal_host.clone());
    }

    pub fn set_observed_generation(&mut self, generation: Option<i64>) {
        self.new_status.observed_generation = generation;
    }

    /// Apply everything in `desired` and stamp the observed generation.
    pub fn set_desired(&mut self, desired: &DesiredStatus) {
        self.set_condition(
            CONDITION_TYPE_READY,
            desired.ready,
            desired.reason,
            &desired.message,
        );
        if let Some(derived) = &desired.derived {
            self.set_derived(derived);
        }
        self.set_observed_generation(self.object.metadata.generation);
    }

    /// Whether the collected status differs semantically from the stored one.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        match &self.current_status {
            None => true,
            Some(current) => {
                current.observed_generation != self.new_status.observed_generation
                    || current.network_stack != self.new_status.network_stack
                    || current.api_server_internal_host != self.new_status.api_server_internal_host
                    || !conditions_equal(&current.conditions, &self.new_status.conditions)
            }
        }
    }

    #[cfg(test)]
    #[must_use]
    pub fn new_status(&self) -> &ProvisioningStatus {
        &self.new_status
    }

    /// Write the collected status. Returns whether a write happened.
    ///
    /// # Errors
    ///
    /// Returns the store error unchanged, including conflicts, so the caller can
    /// decide whether to re-read.
    pub async fn apply<S: ResourceStore>(
        self,
        store: &S,
    ) -> Result<bool, crate::store::StoreError> {
        let name = self.object.name_any();
        if !self.has_changes() {
            debug!(name = %name, "Provisioning status unchanged, skipping update");
            return Ok(false);
        }

        let mut object = self.object;
        object.status = Some(self.new_status);
        store.update_status(&object).await?;

        debug!(name = %name, "Updated Provisioning status");
        Ok(true)
    }
}

/// Bring the `Provisioning` singleton's status in line with `desired`.
///
/// Re-reads the object on every attempt, so a conflict with a concurrent writer
/// is resolved against its latest state. Returns whether a write happened; a
/// missing singleton is not an error.
///
/// # Errors
///
/// Returns [`ProvisioningError::StoreAccessFailure`] on read or write failure, or
/// when conflicts persist for [`MAX_STATUS_UPDATE_ATTEMPTS`] attempts.
pub async fn write_status<S: ResourceStore>(
    store: &S,
    desired: &DesiredStatus,
) -> Result<bool, ProvisioningError> {
    let mut attempt = 0;
    loop {
        attempt += 1;

        let Some(object) = read_provisioning_cr(store).await? else {
            debug!("Provisioning singleton disappeared, nothing to update");
            return Ok(false);
        };

        let mut updater = ProvisioningStatusUpdater::new(object);
        updater.set_desired(desired);

        match updater.apply(store).await {
            Ok(written) => return Ok(written),
            Err(e) if e.is_conflict() && attempt < MAX_STATUS_UPDATE_ATTEMPTS => {
                warn!(attempt, error = %e, "Status update conflicted, re-reading");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod status_tests;
