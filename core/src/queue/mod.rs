//! Broker and result backend contract plus the in-process substrate.

mod memory;
mod traits;
mod types;

pub use memory::MemoryQueue;
pub use traits::{ResultBackend, TaskBroker};
pub use types::{ResultMessage, TaskHandle, TaskMessage, TaskState};
