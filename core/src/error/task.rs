use thiserror::Error;

use crate::payload::TaskKind;

/// Rejection of an untyped task payload. Messages are returned verbatim to
/// submitters and stored as the failure reason of dequeued tasks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("payload must be an object")]
    NotObject,
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} must be an array")]
    NotArray { field: &'static str },
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    #[error("proxy credentials are required")]
    ProxyIncomplete,
    #[error("target[{index}] must be object")]
    TargetNotObject { index: usize },
    #[error("target[{index}] host/user/password are required")]
    TargetIncomplete { index: usize },
    #[error("commands[{index}] cannot be empty")]
    EmptyCommand { index: usize },
}

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("decode engine output: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("engine output must be an array of result records")]
    NotArray,
    #[error("engine output record {index} is not an object")]
    RecordNotObject { index: usize },
    #[error("engine returned empty result")]
    Empty,
}

#[derive(Error, Debug)]
#[error("failed to launch {program}: {source}")]
pub struct EngineLaunchError {
    pub program: String,
    #[source]
    pub source: std::io::Error,
}

/// Hard failures of a bridge run. Engine launch problems and non-zero exits are
/// not represented here: they become synthetic failure records instead.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("{kind} script path is empty")]
    ScriptMissing { kind: TaskKind },
    #[error("local path does not exist: {0}")]
    LocalPathMissing(String),
    #[error("encode engine arguments: {0}")]
    Encode(#[source] serde_json::Error),
    #[error(transparent)]
    Output(#[from] ReconcileError),
}

#[derive(Error, Debug)]
pub enum TaskError {
    #[error("no handler registered for task {0}")]
    UnknownTask(String),
    #[error(transparent)]
    Decode(#[from] ValidationError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error("undecodable task message: {0}")]
    Malformed(String),
}

impl TaskError {
    /// Exception type name recorded in the Celery failure payload.
    pub fn exc_type(&self) -> &'static str {
        match self {
            Self::UnknownTask(_) => "NotRegistered",
            Self::Decode(_) => "ValidationError",
            Self::Bridge(BridgeError::Output(_)) => "EngineOutputError",
            Self::Bridge(_) => "BridgeError",
            Self::Malformed(_) => "DecodeError",
        }
    }
}
