use thiserror::Error;

use super::queue::QueueError;
use crate::worker::TransitionError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("worker failed: {0}")]
    Worker(#[from] WorkerError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("server error: {0}")]
    Server(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("queue broker/backend not configured")]
    SubstrateMissing,
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("failed to load {path}: {reason}")]
    EnvFile { path: String, reason: String },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),
    #[error("lifecycle error: {0}")]
    Transition(#[from] TransitionError),
    #[error("worker pool closed unexpectedly")]
    PoolClosed,
}
