// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bastionq daemon (bqd)
//!
//! Owns the HTTP wire surface (§6.1/§6.3), one `Worker` per compute
//! node draining that node's queue over `bq-transport`, and the
//! background result-retention sweep.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use bq_api::config::ApiConfig;
use bq_api::{build_router, reaper, AppState};
use bq_auth::AuthService;
use bq_core::SystemClock;
use bq_storage::Store;
use bq_transport::SshTransport;
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "bqd", version, about = "bastionq dispatch daemon")]
struct Args {
    /// Path to the TOML config file. Defaults to `$BQ_CONFIG`.
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _log_guard = setup_logging();

    let config_path = args
        .config
        .or_else(bq_api::env::config_path)
        .ok_or("no config path given and BQ_CONFIG is not set")?;
    let config = Arc::new(ApiConfig::load(&config_path)?);
    let state_dir = config.resolved_state_dir()?;
    std::fs::create_dir_all(&state_dir)?;

    let store = Arc::new(Store::open(&state_dir)?);
    let auth = Arc::new(AuthService::new(store.clone(), config.credential_max_validity_days * 86_400));
    let clock = SystemClock;
    let state = AppState::new(store.clone(), auth, config.clone(), clock);

    let shutdown = CancellationToken::new();
    // §8's seed scenarios exercise transport recovery and node placement
    // without a real bastion; `test-support` swaps every node's transport
    // for `bq_transport::FakeTransport` so this same binary drives those
    // scenarios end-to-end.
    let use_fake_transport = fake_transport_requested();
    let mut worker_handles = Vec::new();
    for node in config.all_node_indices() {
        let worker_config = config.worker_config(node);
        let store = store.clone();
        let shutdown = shutdown.clone();

        if use_fake_transport {
            worker_handles.push(tokio::spawn(run_fake_worker(store, worker_config, shutdown)));
        } else {
            let target = config.node_target(node.0 as usize);
            let reconnect = config.reconnect_policy();
            let timeouts = config.timeout_policy();
            worker_handles.push(tokio::spawn(async move {
                run_ssh_worker(store, worker_config, target, reconnect, timeouts, shutdown).await
            }));
        }
    }

    let retention = std::time::Duration::from_secs(config.result_retention_hours * 3600);
    let reaper_handle = tokio::spawn(reaper::run(store.clone(), SystemClock, retention, shutdown.clone()));

    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_shutdown.cancel();
    });

    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "bqd listening");

    let serve_shutdown = shutdown.clone();
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { serve_shutdown.cancelled().await })
        .await?;

    // §5's drain timeout: give in-flight workers a bounded window to
    // reach a clean stopping point after the HTTP surface has already
    // drained, rather than waiting on them indefinitely.
    shutdown.cancel();
    let drain = bq_api::env::drain_timeout();
    let drain_all = async {
        for handle in worker_handles {
            let _ = handle.await;
        }
        let _ = reaper_handle.await;
    };
    if tokio::time::timeout(drain, drain_all).await.is_err() {
        warn!("drain timeout elapsed with workers still shutting down");
    }
    info!("bqd stopped");
    Ok(())
}

fn fake_transport_requested() -> bool {
    cfg!(feature = "test-support") && std::env::var_os("BQ_FAKE_TRANSPORT").is_some()
}

#[cfg(feature = "test-support")]
async fn run_fake_worker(store: Arc<Store>, worker_config: bq_engine::WorkerConfig, shutdown: CancellationToken) {
    let node = worker_config.node;
    let transport = bq_transport::FakeTransport::new();
    let worker = bq_engine::Worker::new(store, transport, worker_config, SystemClock);
    worker.run(shutdown).await;
    info!(node = %node, "fake worker stopped");
}

#[cfg(not(feature = "test-support"))]
async fn run_fake_worker(_store: Arc<Store>, _worker_config: bq_engine::WorkerConfig, _shutdown: CancellationToken) {
    unreachable!("fake_transport_requested() only returns true when test-support is enabled")
}

async fn run_ssh_worker(
    store: Arc<Store>,
    worker_config: bq_engine::WorkerConfig,
    target: bq_transport::NodeTarget,
    reconnect: bq_transport::ReconnectPolicy,
    timeouts: bq_transport::TimeoutPolicy,
    shutdown: CancellationToken,
) {
    let transport = SshTransport::new(target, reconnect, timeouts);
    let node = worker_config.node;
    let worker = bq_engine::Worker::new(store, transport, worker_config, SystemClock);
    worker.run(shutdown).await;
    info!(node = %node, "worker stopped");
}

async fn wait_for_shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "could not install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "could not install SIGINT handler");
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => info!("received SIGTERM"),
        _ = sigint.recv() => info!("received SIGINT"),
    }
}

fn setup_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match bq_api::env::log_dir() {
        Some(dir) => {
            if let Err(e) = std::fs::create_dir_all(&dir) {
                eprintln!("could not create log directory {}: {e}", dir.display());
            }
            let file_appender = tracing_appender::rolling::daily(&dir, "bqd.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
            None
        }
    }
}
