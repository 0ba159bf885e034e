use hopq_core::api::ShutdownTrigger;
use tokio::signal;
use tracing::{info, warn};

/// Resolves on Ctrl+C or SIGTERM.
pub async fn wait_for_shutdown_signal() {
    tokio::select! {
        res = signal::ctrl_c() => match res {
            Ok(()) => info!("received Ctrl+C signal"),
            Err(e) => {
                warn!("failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        },
        _ = wait_for_sigterm() => info!("received SIGTERM signal"),
    }
}

/// Fire `trigger` once a shutdown signal arrives.
pub fn spawn_signal_listener(trigger: ShutdownTrigger) {
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        info!("starting graceful shutdown...");
        trigger.trigger();
    });
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
