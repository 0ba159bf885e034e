use hopq_core::api::{shutdown_channel, AppConfig, CliError};
use hopq_plugins::factory::{build_substrate, MEMORY_URL};
use tracing::info;

use crate::http::{build_state, start_server, wait_triggered};

use super::cli::{ServeArgs, StandaloneArgs};
use super::signal::spawn_signal_listener;
use super::worker::{apply_worker_args, run_worker};

pub fn apply_serve_args(cfg: &mut AppConfig, args: &ServeArgs) {
    if let Some(host) = args.host.as_deref().map(str::trim).filter(|h| !h.is_empty()) {
        cfg.http_server.host = host.to_string();
    }
    if let Some(port) = args.port {
        cfg.http_server.port = port;
    }
}

/// Standalone mode falls back to the in-process queue for any unset address.
pub fn default_to_memory(cfg: &mut AppConfig) {
    if cfg.queue.broker.trim().is_empty() {
        cfg.queue.broker = MEMORY_URL.to_string();
    }
    if cfg.queue.backend.trim().is_empty() {
        cfg.queue.backend = MEMORY_URL.to_string();
    }
}

/// `hopq serve`
pub async fn handle_serve(mut cfg: AppConfig, args: ServeArgs) -> Result<(), CliError> {
    apply_serve_args(&mut cfg, &args);
    cfg.queue.ensure_substrate()?;

    let substrate = build_substrate(&cfg).await?;
    let (trigger, listener) = shutdown_channel();
    spawn_signal_listener(trigger);

    let state = build_state(&cfg, &substrate);
    start_server(&cfg.http_server, state, wait_triggered(listener)).await
}

/// `hopq standalone`: HTTP API and worker sharing one substrate and one
/// shutdown signal.
pub async fn handle_standalone(mut cfg: AppConfig, args: StandaloneArgs) -> Result<(), CliError> {
    apply_serve_args(&mut cfg, &args.serve);
    apply_worker_args(&mut cfg, &args.worker);
    default_to_memory(&mut cfg);

    let substrate = build_substrate(&cfg).await?;
    let (trigger, listener) = shutdown_channel();
    spawn_signal_listener(trigger.clone());

    let state = build_state(&cfg, &substrate);
    let server = async {
        let served = start_server(&cfg.http_server, state, wait_triggered(listener.clone())).await;
        // a server that never came up must not leave the worker running
        if served.is_err() {
            trigger.trigger();
        }
        served
    };
    let worker = run_worker(&cfg, substrate, listener.clone());

    let (served, report) = tokio::join!(server, worker);
    served?;
    let report = report?;
    info!(
        dequeued = report.dequeued,
        succeeded = report.succeeded,
        failed = report.failed,
        "standalone stopped"
    );
    Ok(())
}
