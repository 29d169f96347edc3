// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Decision core and reconcile pass for the provisioning subsystem.
//!
//! # Components
//!
//! - [`platform`] - Platform predicate: does provisioning apply to this cluster?
//! - [`network`] - Network stack classifier over a set of addresses
//! - [`endpoint`] - Internal API server host from the `Infrastructure` status
//! - [`provisioning_config`] - Reader for the `Provisioning` singleton
//! - [`provisioning`] - The reconcile pass tying the above together
//! - [`status`] - Condition helpers and the status writer
//! - [`retry`] - Backoff for API calls and the requeue schedule

pub mod endpoint;
pub mod network;
pub mod platform;
pub mod provisioning;
pub mod provisioning_config;
pub mod retry;
pub mod status;

pub use endpoint::{api_server_internal_host, resolve_api_server_internal_host};
pub use network::{network_stack, NetworkStack};
pub use platform::{is_enabled, platform_enabled};
pub use provisioning::{reconcile_provisioning, PassGuard, ReconcileOutcome};
pub use provisioning_config::read_provisioning_cr;
