use hopq_core::api::{shutdown_channel, AppConfig, CliError, ShutdownListener, Worker, WorkerReport};
use hopq_plugins::factory::{build_bridge, build_substrate, Substrate};

use super::cli::WorkerArgs;
use super::signal::spawn_signal_listener;

pub fn apply_worker_args(cfg: &mut AppConfig, args: &WorkerArgs) {
    if let Some(n) = args.workers.filter(|n| *n > 0) {
        cfg.queue.workers = n;
    }
}

/// `hopq worker`: run until SIGINT/SIGTERM, then drain.
pub async fn handle_worker(mut cfg: AppConfig, args: WorkerArgs) -> Result<WorkerReport, CliError> {
    apply_worker_args(&mut cfg, &args);
    cfg.queue.ensure_substrate()?;

    let substrate = build_substrate(&cfg).await?;
    let (trigger, listener) = shutdown_channel();
    spawn_signal_listener(trigger);

    run_worker(&cfg, substrate, listener).await
}

pub async fn run_worker(
    cfg: &AppConfig,
    substrate: Substrate,
    shutdown: ShutdownListener,
) -> Result<WorkerReport, CliError> {
    let worker = Worker::new(cfg, substrate.broker, substrate.backend, build_bridge(cfg))?;
    let report = worker.run(shutdown).await?;
    Ok(report)
}
