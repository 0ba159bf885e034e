//! Worker lifecycle: handler registry, bounded pool, drain-then-stop shutdown.

mod handler;
mod phase;
mod pool;
mod shutdown;

pub use handler::{EngineTaskHandler, HandlerRegistry, TaskHandler};
pub use phase::{PhaseTransition, TransitionError, WorkerPhase};
pub use pool::{Worker, WorkerReport};
pub use shutdown::{shutdown_channel, ShutdownListener, ShutdownTrigger};
