use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "hopq", version, about = "Queue-driven SSH command and upload worker")]
pub struct Args {
    /// Config file. Defaults to ./hopq.toml, then ~/.hopq/config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Consume tasks from the broker and run them through the engine.
    Worker(WorkerArgs),
    /// Serve the submission and status HTTP API.
    Serve(ServeArgs),
    /// HTTP API and worker in one process (in-memory queue unless configured).
    Standalone(StandaloneArgs),
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct WorkerArgs {
    /// Handler invocations in flight at once.
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ServeArgs {
    #[arg(long)]
    pub host: Option<String>,

    #[arg(long)]
    pub port: Option<u16>,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct StandaloneArgs {
    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(flatten)]
    pub worker: WorkerArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_worker_with_global_config() {
        let args = Args::parse_from([
            "hopq",
            "worker",
            "--workers",
            "4",
            "--config",
            "/etc/hopq.toml",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/etc/hopq.toml")));
        let Commands::Worker(w) = args.command else {
            panic!("expected worker");
        };
        assert_eq!(w.workers, Some(4));
    }

    #[test]
    fn parses_standalone_flags() {
        let args = Args::parse_from(["hopq", "standalone", "--port", "9000", "--workers", "2"]);
        let Commands::Standalone(s) = args.command else {
            panic!("expected standalone");
        };
        assert_eq!(s.serve.port, Some(9000));
        assert_eq!(s.worker.workers, Some(2));
    }
}
