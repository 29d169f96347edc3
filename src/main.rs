// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

use anyhow::{Context as _, Result};
use baremetal_operator::{
    config::{LogFormat, OperatorConfig},
    constants::TOKIO_WORKER_THREADS,
    context::Context,
    controller::{run_controller, ControllerState},
    health::{run_http_server, HealthState},
    leader::{LeaseSettings, Leadership},
    resolver::{AddressResolver, DnsResolver, StaticResolver},
    sink::ConfigMapSink,
    store::KubeStore,
};
use clap::Parser;
use kube::Client;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

fn main() -> Result<()> {
    // Build Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("baremetal-operator")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging.
///
/// Format: timestamp file:line LEVEL message. Respects `RUST_LOG` if set,
/// otherwise defaults to INFO level.
fn init_logging(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match format {
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_file(true)
                .with_line_number(true)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }
}

async fn async_main() -> Result<()> {
    let config = OperatorConfig::parse();
    init_logging(config.log_format);

    info!("Starting bare-metal provisioning operator");
    config.validate().context("invalid operator configuration")?;
    debug!(?config, "Configuration loaded");

    debug!("Initializing Kubernetes client");
    let client = Client::try_default().await?;
    debug!("Kubernetes client initialized successfully");

    let resolver: Arc<dyn AddressResolver> = if config.api_server_internal_addresses.is_empty() {
        Arc::new(DnsResolver::new())
    } else {
        info!(
            addresses = ?config.api_server_internal_addresses,
            "Using static addresses for the internal API server host"
        );
        Arc::new(StaticResolver::new().with_fallback(config.api_server_internal_addresses.clone()))
    };
    let sink = Arc::new(ConfigMapSink::new(client.clone(), config.namespace.clone()));
    let ctx = Context::new(KubeStore::new(client.clone()), resolver, sink)
        .with_reconcile_timeout(config.reconcile_timeout())
        .with_resync_interval(config.resync_interval());

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let health = Arc::new(HealthState::new());
    let server = tokio::spawn(run_http_server(
        health.clone(),
        config.metrics_bind_address,
        shutdown.clone(),
    ));

    let result = match LeaseSettings::from_config(&config) {
        Some(settings) => run_as_leader(client, ctx, &settings, &health, &shutdown).await,
        None => {
            info!("Leader election disabled");
            let state = Arc::new(ControllerState::new(ctx, shutdown.clone()));
            health.mark_started();
            run_controller(client, state).await;
            health.mark_stopped();
            Ok(())
        }
    };

    shutdown.cancel();
    match server.await {
        Ok(Ok(())) => debug!("Metrics and health server stopped"),
        Ok(Err(e)) => warn!(error = %e, "Metrics and health server failed"),
        Err(e) => warn!(error = %e, "Metrics and health server task panicked"),
    }

    info!("Operator stopped");
    result
}

/// Wait for the lease, run the controller while holding it, and stop on shutdown
/// or on loss of leadership.
///
/// Losing the lease is an error so the pod restarts and rejoins the election.
async fn run_as_leader(
    client: Client,
    ctx: Context<KubeStore>,
    settings: &LeaseSettings,
    health: &HealthState,
    shutdown: &CancellationToken,
) -> Result<()> {
    let mut leadership = tokio::select! {
        () = shutdown.cancelled() => {
            info!("Shutdown requested before leadership was acquired");
            return Ok(());
        }
        leadership = Leadership::acquire(client.clone(), settings) => leadership?,
    };

    let controller_token = shutdown.child_token();
    let state = Arc::new(ControllerState::new(ctx, controller_token.clone()));
    let controller = tokio::spawn(run_controller(client, state));
    health.mark_started();

    let lost = tokio::select! {
        () = leadership.lost() => true,
        () = shutdown.cancelled() => false,
    };

    controller_token.cancel();
    if let Err(e) = controller.await {
        error!(error = %e, "Provisioning controller task panicked");
    }
    health.mark_stopped();
    leadership.release().await;

    if lost {
        anyhow::bail!("leadership lost, restarting");
    }
    Ok(())
}

/// Cancel `shutdown` on SIGTERM or SIGINT.
async fn watch_signals(shutdown: CancellationToken) {
    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "Failed to install signal handlers");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down"),
    }
    shutdown.cancel();
}
