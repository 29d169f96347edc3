// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the bare-metal provisioning operator.
//!
//! All metrics carry the namespace prefix `metal3_io_` (prometheus-safe version
//! of "metal3.io").
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Passes, their outcomes and durations
//! - **Error Metrics** - Failures by error kind
//! - **Subsystem Metrics** - Whether provisioning currently applies to the cluster
//! - **Leader Election Metrics** - Leadership state changes
//!
//! # Example
//!
//! ```rust,no_run
//! use baremetal_operator::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success(std::time::Duration::from_secs(1));
//! ```

use prometheus::{
    CounterVec, Encoder, Gauge, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;

// ============================================================================
// Metric Name Constants
// ============================================================================

/// Namespace prefix for all operator metrics (prometheus-safe)
const METRICS_NAMESPACE: &str = "metal3_io";

/// Label value for the only resource kind this operator reconciles
const RESOURCE_TYPE: &str = "Provisioning";

// ============================================================================
// Global Metrics Registry
// ============================================================================

/// Global Prometheus metrics registry
///
/// All metrics are registered in this registry and exposed via `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of reconcile passes by outcome
///
/// Labels:
/// - `resource_type`: Always `Provisioning`
/// - `status`: `success`, `disabled`, `unconfigured`, `error`
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_reconciliations_total"),
        "Total number of reconcile passes by resource type and status",
    );
    let counter = CounterVec::new(opts, &["resource_type", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of reconcile passes in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_reconciliation_duration_seconds"),
        "Duration of reconcile passes in seconds by resource type",
    )
    .buckets(vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]);
    let histogram = HistogramVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of requeues
///
/// Labels:
/// - `reason`: `error` or `resync`
pub static REQUEUE_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_requeues_total"),
        "Total number of requeue operations by resource type and reason",
    );
    let counter = CounterVec::new(opts, &["resource_type", "reason"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Total number of status writes
pub static STATUS_UPDATES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_status_updates_total"),
        "Total number of status subresource writes by resource type",
    );
    let counter = CounterVec::new(opts, &["resource_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Total number of errors by kind
///
/// Labels:
/// - `error_type`: snake_case error kind (e.g. `platform_indeterminate`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_errors_total"),
        "Total number of errors by resource type and error type",
    );
    let counter = CounterVec::new(opts, &["resource_type", "error_type"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

// ============================================================================
// Subsystem Metrics
// ============================================================================

/// 1 when the last determinate pass found the platform to be bare metal, else 0
pub static PROVISIONING_ENABLED: LazyLock<Gauge> = LazyLock::new(|| {
    let gauge = Gauge::new(
        format!("{METRICS_NAMESPACE}_provisioning_enabled"),
        "Whether the provisioning subsystem applies to this cluster",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Leader Election Metrics
// ============================================================================

/// Total number of leader election events
///
/// Labels:
/// - `status`: `acquired` or `lost`
pub static LEADER_ELECTIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_elections_total"),
        "Total number of leader election events by status",
    );
    let counter = CounterVec::new(opts, &["status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Current leader status (1 = leader, 0 = follower)
pub static LEADER_STATUS: LazyLock<GaugeVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_leader_status"),
        "Current leader election status (1 = leader, 0 = follower)",
    );
    let gauge = GaugeVec::new(opts, &["pod_name"]).unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

// ============================================================================
// Helper Functions
// ============================================================================

fn record_pass(status: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[RESOURCE_TYPE, status])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[RESOURCE_TYPE])
        .observe(duration.as_secs_f64());
}

/// Record a pass that converged the subsystem
pub fn record_reconciliation_success(duration: Duration) {
    record_pass("success", duration);
}

/// Record a pass that exited early because the subsystem does not apply
pub fn record_reconciliation_disabled(duration: Duration) {
    record_pass("disabled", duration);
}

/// Record a pass that exited early because the singleton does not exist
pub fn record_reconciliation_unconfigured(duration: Duration) {
    record_pass("unconfigured", duration);
}

/// Record a failed pass
pub fn record_reconciliation_error(duration: Duration) {
    record_pass("error", duration);
}

/// Record a requeue
///
/// # Arguments
/// * `reason` - `error` or `resync`
pub fn record_reconciliation_requeue(reason: &str) {
    REQUEUE_TOTAL
        .with_label_values(&[RESOURCE_TYPE, reason])
        .inc();
}

/// Record a status write
pub fn record_status_update() {
    STATUS_UPDATES_TOTAL
        .with_label_values(&[RESOURCE_TYPE])
        .inc();
}

/// Record an error by kind label
pub fn record_error(error_type: &str) {
    ERRORS_TOTAL
        .with_label_values(&[RESOURCE_TYPE, error_type])
        .inc();
}

/// Record whether provisioning applies to the cluster
pub fn set_provisioning_enabled(enabled: bool) {
    PROVISIONING_ENABLED.set(if enabled { 1.0 } else { 0.0 });
}

/// Record leader election acquired
///
/// # Arguments
/// * `pod_name` - Name of the pod that acquired leadership
pub fn record_leader_elected(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL
        .with_label_values(&["acquired"])
        .inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(1.0);
}

/// Record leader election lost
pub fn record_leader_lost(pod_name: &str) {
    LEADER_ELECTIONS_TOTAL.with_label_values(&["lost"]).inc();
    LEADER_STATUS.with_label_values(&[pod_name]).set(0.0);
}

/// Gather all metrics in Prometheus text format
///
/// # Errors
///
/// Returns an error if metrics cannot be encoded
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}
