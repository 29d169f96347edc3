// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory [`ResourceStore`] for tests and dry runs.
//!
//! Objects are kept as JSON keyed by `(kind, name)`, so every read and write goes
//! through the same serialization boundary as the real API server. Resource
//! versions are bumped on every write and checked on status updates, and
//! failures or conflicts can be injected per kind.

use super::{ResourceStore, StoreError, StoreKind};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

type Key = (String, String);

/// In-memory object store.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<Key, Value>>,
    failures: Mutex<BTreeMap<String, StoreError>>,
    pending_conflicts: AtomicU32,
    resource_version: AtomicU64,
    status_writes: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_resource_version(&self) -> String {
        (self.resource_version.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }

    fn malformed<K: StoreKind>(name: &str, err: &serde_json::Error) -> StoreError {
        StoreError::Malformed {
            kind: K::KIND.to_string(),
            name: name.to_string(),
            message: err.to_string(),
        }
    }

    fn injected_failure<K: StoreKind>(&self) -> Option<StoreError> {
        lock(&self.failures).get(K::KIND).cloned()
    }

    /// Insert or replace an object, keyed by its name, and stamp a fresh resource version.
    ///
    /// Objects without a name are stored under the empty name and are therefore
    /// never found by a lookup for a real name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Malformed`] if the object cannot be serialized.
    pub fn insert<K: StoreKind>(&self, mut object: K) -> Result<(), StoreError> {
        let name = object.meta().name.clone().unwrap_or_default();
        object.meta_mut().resource_version = Some(self.next_resource_version());
        let value = serde_json::to_value(&object).map_err(|e| Self::malformed::<K>(&name, &e))?;
        lock(&self.objects).insert((K::KIND.to_string(), name), value);
        Ok(())
    }

    /// Remove an object. Returns whether it existed.
    pub fn remove<K: StoreKind>(&self, name: &str) -> bool {
        lock(&self.objects)
            .remove(&(K::KIND.to_string(), name.to_string()))
            .is_some()
    }

    /// Make every subsequent access to kind `K` fail with `error`.
    pub fn fail<K: StoreKind>(&self, error: StoreError) {
        lock(&self.failures).insert(K::KIND.to_string(), error);
    }

    /// Clear all injected failures.
    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Make the next `count` status updates lose a race against a concurrent writer.
    pub fn inject_conflicts(&self, count: u32) {
        self.pending_conflicts.store(count, Ordering::SeqCst);
    }

    /// Number of status writes that were accepted.
    #[must_use]
    pub fn status_writes(&self) -> u64 {
        self.status_writes.load(Ordering::SeqCst)
    }

    fn take_conflict(&self) -> bool {
        self.pending_conflicts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn get<K: StoreKind>(&self, name: &str) -> Result<Option<K>, StoreError> {
        if let Some(err) = self.injected_failure::<K>() {
            return Err(err);
        }

        let value = lock(&self.objects)
            .get(&(K::KIND.to_string(), name.to_string()))
            .cloned();

        match value {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Self::malformed::<K>(name, &e)),
            None => Ok(None),
        }
    }

    async fn update_status<K: StoreKind>(&self, object: &K) -> Result<K, StoreError> {
        if let Some(err) = self.injected_failure::<K>() {
            return Err(err);
        }

        let name = object.name_any();
        let key = (K::KIND.to_string(), name.clone());
        let incoming = serde_json::to_value(object).map_err(|e| Self::malformed::<K>(&name, &e))?;

        let mut objects = lock(&self.objects);
        let Some(stored) = objects.get_mut(&key) else {
            return Err(StoreError::NotFound {
                kind: K::KIND.to_string(),
                name,
            });
        };

        if self.take_conflict() {
            // Simulate a concurrent writer that bumped the object first
            stored["metadata"]["resourceVersion"] = Value::String(self.next_resource_version());
        }

        let stored_version = stored["metadata"]["resourceVersion"].as_str();
        let incoming_version = object.meta().resource_version.as_deref();
        if incoming_version.is_some() && incoming_version != stored_version {
            debug!(
                kind = K::KIND,
                name = %name,
                incoming = ?incoming_version,
                stored = ?stored_version,
                "Rejecting status update with stale resource version"
            );
            return Err(StoreError::Conflict {
                kind: K::KIND.to_string(),
                name,
            });
        }

        stored["status"] = incoming.get("status").cloned().unwrap_or(Value::Null);
        stored["metadata"]["resourceVersion"] = Value::String(self.next_resource_version());
        self.status_writes.fetch_add(1, Ordering::SeqCst);

        serde_json::from_value(stored.clone()).map_err(|e| Self::malformed::<K>(&name, &e))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
