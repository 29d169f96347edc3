// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for a provisioning reconcile pass.
//!
//! Every failure a pass can hit is represented here. None of them is fatal to the
//! process: the reconciler captures the error in its outcome, records it, and
//! schedules a retry. "Provisioning not configured" is deliberately absent; it is a
//! normal outcome, not an error.

use crate::status_reasons::{
    REASON_ADDRESS_LOOKUP_FAILED, REASON_CANCELLED, REASON_DEADLINE_EXCEEDED,
    REASON_ENDPOINT_MALFORMED, REASON_PLATFORM_INDETERMINATE, REASON_SINK_FAILED,
    REASON_STORE_ACCESS_FAILED,
};
use crate::store::StoreError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while deciding on and converging the provisioning subsystem.
#[derive(Error, Debug, Clone)]
pub enum ProvisioningError {
    /// The platform of the cluster could not be determined.
    ///
    /// Raised when the `Infrastructure` singleton is missing, carries no status, or
    /// reports a platform the operator does not know how to treat.
    #[error("Unable to determine platform: {reason}")]
    PlatformIndeterminate {
        /// What made the platform indeterminate
        reason: String,
    },

    /// The resource store could not be read or written.
    #[error("Resource store access failed: {0}")]
    StoreAccessFailure(#[from] StoreError),

    /// The internal API server URL is missing or cannot be turned into a host.
    #[error("Internal API server endpoint '{url}' is malformed: {reason}")]
    EndpointMalformed {
        /// The offending URL (empty when absent)
        url: String,
        /// Why the URL was rejected
        reason: String,
    },

    /// Addresses of the internal API server host could not be discovered.
    #[error("Failed to look up addresses of '{host}': {reason}")]
    AddressLookupFailure {
        /// The host that was looked up
        host: String,
        /// Resolver error text
        reason: String,
    },

    /// The deployment sink rejected the configuration snapshot.
    #[error("Deployment sink failed: {0}")]
    SinkFailure(String),

    /// The pass was cancelled before convergence.
    #[error("Reconcile pass cancelled before convergence")]
    Cancelled,

    /// The pass ran past its deadline before convergence.
    #[error("Reconcile pass exceeded its deadline of {0:?}")]
    DeadlineExceeded(Duration),
}

/// Payload-free classification of [`ProvisioningError`], carried in the
/// reconcile outcome so identical passes compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    PlatformIndeterminate,
    StoreAccessFailure,
    EndpointMalformed,
    AddressLookupFailure,
    SinkFailure,
    Cancelled,
    DeadlineExceeded,
}

impl ProvisioningError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PlatformIndeterminate { .. } => ErrorKind::PlatformIndeterminate,
            Self::StoreAccessFailure(_) => ErrorKind::StoreAccessFailure,
            Self::EndpointMalformed { .. } => ErrorKind::EndpointMalformed,
            Self::AddressLookupFailure { .. } => ErrorKind::AddressLookupFailure,
            Self::SinkFailure(_) => ErrorKind::SinkFailure,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
        }
    }

    /// Whether another pass should be scheduled for this error.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }
}

impl ErrorKind {
    /// Cancellation means the process is going away; everything else is retried.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Condition reason reported on the `Provisioning` status.
    #[must_use]
    pub fn reason(self) -> &'static str {
        match self {
            Self::PlatformIndeterminate => REASON_PLATFORM_INDETERMINATE,
            Self::StoreAccessFailure => REASON_STORE_ACCESS_FAILED,
            Self::EndpointMalformed => REASON_ENDPOINT_MALFORMED,
            Self::AddressLookupFailure => REASON_ADDRESS_LOOKUP_FAILED,
            Self::SinkFailure => REASON_SINK_FAILED,
            Self::Cancelled => REASON_CANCELLED,
            Self::DeadlineExceeded => REASON_DEADLINE_EXCEEDED,
        }
    }

    /// Label value used for the error metrics.
    #[must_use]
    pub fn metric_label(self) -> &'static str {
        match self {
            Self::PlatformIndeterminate => "platform_indeterminate",
            Self::StoreAccessFailure => "store_access_failure",
            Self::EndpointMalformed => "endpoint_malformed",
            Self::AddressLookupFailure => "address_lookup_failure",
            Self::SinkFailure => "sink_failure",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
