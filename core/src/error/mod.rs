#[allow(clippy::module_inception)]
pub mod error;
pub mod queue;
pub mod task;

pub use error::{CliError, ConfigError, WorkerError};
pub use queue::{LookupError, QueueError, StatusError, SubmitError};
pub use task::{BridgeError, EngineLaunchError, ReconcileError, TaskError, ValidationError};
