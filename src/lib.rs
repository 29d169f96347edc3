// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # baremetal-operator - bare-metal provisioning operator for Kubernetes
//!
//! Decides whether the bare-metal provisioning subsystem applies to a cluster and,
//! when it does, with which parameters, then hands a normalized configuration
//! snapshot to a deployment sink.
//!
//! ## Overview
//!
//! Each reconcile pass:
//!
//! 1. Reads the `Infrastructure` singleton and evaluates the platform predicate
//! 2. Reads the `Provisioning` singleton (absent means "not configured")
//! 3. Resolves the internal API server host and classifies its network stack
//! 4. Applies the snapshot to the sink and records status on `Provisioning`
//!
//! ## Modules
//!
//! - [`crd`] - `Provisioning` and `Infrastructure` resource types
//! - [`store`] - Resource store interface with Kubernetes and in-memory backends
//! - [`reconcilers`] - Decision core and the reconcile pass
//! - [`resolver`] - Address discovery for the internal API host
//! - [`sink`] - Deployment sinks
//! - [`controller`] - Controller runtime wiring
//! - [`context`] - Shared pass context
//!
//! ## Example
//!
//! ```rust,no_run
//! use baremetal_operator::context::Context;
//! use baremetal_operator::reconcilers::{reconcile_provisioning, PassGuard};
//! use baremetal_operator::resolver::StaticResolver;
//! use baremetal_operator::sink::RecordingSink;
//! use baremetal_operator::store::MemoryStore;
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() {
//! let ctx = Context::new(
//!     MemoryStore::new(),
//!     Arc::new(StaticResolver::new()),
//!     Arc::new(RecordingSink::new()),
//! );
//! let guard = PassGuard::new(CancellationToken::new(), Duration::from_secs(60));
//! let outcome = reconcile_provisioning(&ctx, &guard).await;
//! println!("enabled: {}", outcome.enabled);
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod context;
pub mod controller;
pub mod crd;
pub mod errors;
#[cfg(test)]
mod fake_apiserver;
pub mod health;
pub mod labels;
pub mod leader;
pub mod metrics;
pub mod reconcilers;
pub mod resolver;
pub mod sink;
pub mod status_reasons;
pub mod store;
