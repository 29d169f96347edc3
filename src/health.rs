// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP server for Prometheus scraping and Kubernetes probes.
//!
//! - `/metrics` - Prometheus text format
//! - `/healthz` - liveness, always OK while the process serves requests
//! - `/readyz` - readiness, OK once the controller has started

use crate::constants::METRICS_SERVER_PATH;
use crate::metrics::gather_metrics;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Shared state for the probe endpoints.
#[derive(Debug, Default)]
pub struct HealthState {
    started: AtomicBool,
}

impl HealthState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the controller as running.
    pub fn mark_started(&self) {
        self.started.store(true, Ordering::SeqCst);
        info!("Health check: controller marked as started");
    }

    /// Mark the controller as stopped, e.g. after losing leadership.
    pub fn mark_stopped(&self) {
        self.started.store(false, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

/// Routes served by the operator.
pub fn router(state: Arc<HealthState>) -> Router {
    Router::new()
        .route(METRICS_SERVER_PATH, get(metrics))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .with_state(state)
}

/// Serve [`router`] on `addr` until `shutdown` is cancelled.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run_http_server(
    state: Arc<HealthState>,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(address = %addr, "Metrics and health server listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

async fn healthz() -> StatusCode {
    debug!("Liveness probe: OK");
    StatusCode::OK
}

async fn readyz(State(state): State<Arc<HealthState>>) -> StatusCode {
    if state.is_started() {
        StatusCode::OK
    } else {
        debug!("Readiness probe: NOT READY (controller not running)");
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics() -> impl IntoResponse {
    match gather_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "text/plain")],
                e.to_string(),
            )
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod health_tests;
