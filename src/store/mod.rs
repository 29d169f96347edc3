// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Key-addressed access to the resources the operator reads and writes.
//!
//! The reconciler never talks to the Kubernetes API directly. It goes through a
//! [`ResourceStore`], which is generic over the closed set of kinds the operator
//! understands ([`StoreKind`] is sealed and implemented only for
//! [`Infrastructure`] and [`Provisioning`]).
//!
//! Two implementations are provided:
//!
//! - [`KubeStore`] - backed by the Kubernetes API server
//! - [`MemoryStore`] - an in-memory `(kind, name) -> object` map for tests
//!
//! Watching is not part of this interface; events are delivered by the
//! controller runtime and every pass re-reads current state through the store.

pub mod kube_store;
pub mod memory;

pub use kube_store::KubeStore;
pub use memory::MemoryStore;

use crate::constants::{KIND_INFRASTRUCTURE, KIND_PROVISIONING};
use crate::crd::{Infrastructure, Provisioning};
use async_trait::async_trait;
use kube::Resource;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use thiserror::Error;

mod sealed {
    pub trait Sealed {}
    impl Sealed for crate::crd::Infrastructure {}
    impl Sealed for crate::crd::Provisioning {}
}

/// A resource kind the store can address.
pub trait StoreKind:
    Resource<DynamicType = ()>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
    + sealed::Sealed
{
    /// Kind name used as the first half of the store key.
    const KIND: &'static str;
}

impl StoreKind for Infrastructure {
    const KIND: &'static str = KIND_INFRASTRUCTURE;
}

impl StoreKind for Provisioning {
    const KIND: &'static str = KIND_PROVISIONING;
}

/// Errors returned by a [`ResourceStore`].
///
/// A missing object on read is not an error; `get` returns `Ok(None)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Network, timeout, or server-side failure.
    #[error("Transport error accessing {kind}/{name}: {message}")]
    Transport {
        kind: String,
        name: String,
        message: String,
    },

    /// The operator is not allowed to access the object.
    #[error("Access to {kind}/{name} denied: {message}")]
    Forbidden {
        kind: String,
        name: String,
        message: String,
    },

    /// Optimistic concurrency check failed; the object changed since it was read.
    #[error("Conflict updating {kind}/{name}: object was modified")]
    Conflict { kind: String, name: String },

    /// The object to update does not exist.
    #[error("{kind}/{name} not found")]
    NotFound { kind: String, name: String },

    /// The stored object could not be (de)serialized.
    #[error("Malformed {kind}/{name}: {message}")]
    Malformed {
        kind: String,
        name: String,
        message: String,
    },
}

impl StoreError {
    /// Classify a Kubernetes client error by HTTP status.
    #[must_use]
    pub fn from_kube(kind: &str, name: &str, err: &kube::Error) -> Self {
        let (kind, name) = (kind.to_string(), name.to_string());
        match err {
            kube::Error::Api(api_err) => match api_err.code {
                409 => Self::Conflict { kind, name },
                404 => Self::NotFound { kind, name },
                401 | 403 => Self::Forbidden {
                    kind,
                    name,
                    message: api_err.message.clone(),
                },
                _ => Self::Transport {
                    kind,
                    name,
                    message: api_err.message.clone(),
                },
            },
            kube::Error::SerdeError(e) => Self::Malformed {
                kind,
                name,
                message: e.to_string(),
            },
            other => Self::Transport {
                kind,
                name,
                message: other.to_string(),
            },
        }
    }

    /// Whether the write should be retried after re-reading the object.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

/// Typed, key-addressed access to cluster resources.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Fetch the object of kind `K` named `name`.
    ///
    /// # Errors
    ///
    /// Returns an error only for genuine access failures. A missing object is `Ok(None)`.
    async fn get<K: StoreKind>(&self, name: &str) -> Result<Option<K>, StoreError>;

    /// Write the status of `object`, guarded by its `metadata.resourceVersion`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the object changed since it was read.
    async fn update_status<K: StoreKind>(&self, object: &K) -> Result<K, StoreError>;
}
