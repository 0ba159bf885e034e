use clap::Parser;
use hopq_cli::commands::{cli, serve, worker};
use hopq_core::api::{
    load_config, load_env_file, CliError, ConfigError, LoggingConfig, WorkerError,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

static LOG_GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
    std::sync::OnceLock::new();

#[tokio::main]
async fn main() {
    let exit = match real_main().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{e}");
            exit_code_for_error(&e)
        }
    };

    std::process::exit(exit);
}

async fn real_main() -> Result<i32, CliError> {
    let args = cli::Args::parse();
    let env_file = std::path::Path::new(".env");
    let env_loaded = load_env_file(env_file);
    let cfg = load_config(args.config.as_deref())?;
    init_tracing(&cfg.logging).map_err(|e| CliError::Config(ConfigError::Invalid(e)))?;
    match env_loaded {
        Ok(true) => tracing::info!("loaded {}", env_file.display()),
        Ok(false) => {}
        Err(e) => tracing::warn!("{}", e),
    }

    match args.command {
        cli::Commands::Worker(worker_args) => {
            let report = worker::handle_worker(cfg, worker_args).await?;
            Ok(if report.store_errors > 0 { 1 } else { 0 })
        }
        cli::Commands::Serve(serve_args) => {
            serve::handle_serve(cfg, serve_args).await?;
            Ok(0)
        }
        cli::Commands::Standalone(args) => {
            serve::handle_standalone(cfg, args).await?;
            Ok(0)
        }
    }
}

fn exit_code_for_error(e: &CliError) -> i32 {
    // 11: config error
    // 20: queue / IO / server error
    // 50: internal/uncategorized
    match e {
        CliError::Config(_) => 11,
        CliError::Worker(WorkerError::Config(_)) => 11,
        CliError::Worker(_) => 20,
        CliError::Server(_) => 20,
        CliError::Io(_) => 20,
        CliError::Anyhow(_) => 50,
    }
}

fn init_tracing(logging: &LoggingConfig) -> Result<(), String> {
    if !logging.enabled {
        return Ok(());
    }

    let filter = match std::env::var("RUST_LOG") {
        Ok(v) if !v.trim().is_empty() => EnvFilter::from_default_env(),
        _ => EnvFilter::try_new(logging.level.clone()).map_err(|e| e.to_string())?,
    };

    let mut maybe_writer = None;

    if logging.file {
        let dir = match logging
            .directory
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            Some(d) => std::path::PathBuf::from(d),
            None => dirs::home_dir()
                .map(|home| home.join(".hopq").join("logs"))
                .unwrap_or_else(|| std::env::temp_dir().join("hopq")),
        };

        std::fs::create_dir_all(&dir).map_err(|e| format!("create log dir failed: {e}"))?;
        let file_name = format!("hopq.{}.log", std::process::id());
        let appender = tracing_appender::rolling::never(dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let _ = LOG_GUARD.set(guard);
        maybe_writer = Some(non_blocking);
    }

    if !logging.console && maybe_writer.is_none() {
        return Err("logging disabled for both console and file".to_string());
    }

    let console_layer = logging.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(atty::is(atty::Stream::Stderr))
    });

    let file_layer = maybe_writer.map(|w| {
        tracing_subscriber::fmt::layer()
            .with_writer(w)
            .with_ansi(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(())
}
