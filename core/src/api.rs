//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `hopq_core::api` instead of reaching into internal modules.

pub use crate::bridge::{
    BridgeSettings, EngineInvocation, EngineOutput, EngineRunner, ProcessBridge,
};
pub use crate::config::{
    load_config, load_env_file, AppConfig, ExecutorConfig, HttpServerConfig, LoggingConfig,
    QueueConfig,
};
pub use crate::error::{
    BridgeError, CliError, ConfigError, EngineLaunchError, LookupError, QueueError, StatusError,
    SubmitError, TaskError, ValidationError, WorkerError,
};
pub use crate::payload::{Kwargs, TaskDescriptor, TaskKind};
pub use crate::queue::{
    MemoryQueue, ResultBackend, ResultMessage, TaskBroker, TaskHandle, TaskMessage, TaskState,
};
pub use crate::reconcile::{ExecutionResult, TaskResults, UploadResult};
pub use crate::status::{StatusQueryService, TaskStatusReport};
pub use crate::submit::{SubmissionService, SubmitReceipt};
pub use crate::worker::{
    shutdown_channel, ShutdownListener, ShutdownTrigger, Worker, WorkerPhase, WorkerReport,
};
