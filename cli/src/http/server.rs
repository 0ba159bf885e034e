use std::future::Future;
use std::net::SocketAddr;

use axum::middleware;
use hopq_core::api::{
    AppConfig, CliError, HttpServerConfig, ShutdownListener, StatusQueryService, SubmissionService,
};
use hopq_plugins::factory::Substrate;
use tracing::info;

use super::middleware::{create_middleware_stack, request_logger};
use super::routes::create_router;
use super::state::AppState;

pub fn build_state(cfg: &AppConfig, substrate: &Substrate) -> AppState {
    AppState::new(
        SubmissionService::new(
            substrate.broker.clone(),
            cfg.queue.clone(),
            cfg.executor.timeout_seconds,
        ),
        StatusQueryService::new(substrate.backend.clone()),
    )
}

/// Serve until `shutdown` resolves, then finish in-flight requests.
pub async fn start_server<F>(
    config: &HttpServerConfig,
    state: AppState,
    shutdown: F,
) -> Result<(), CliError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = create_router(state)
        .layer(middleware::from_fn(request_logger))
        .layer(create_middleware_stack());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| CliError::Server(format!("invalid listen address: {e}")))?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("server shutdown complete");
    Ok(())
}

pub async fn wait_triggered(mut listener: ShutdownListener) {
    listener.triggered().await;
}
