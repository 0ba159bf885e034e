use std::time::Duration;

use async_trait::async_trait;

use crate::error::{LookupError, QueueError};
use crate::payload::Kwargs;

use super::types::{ResultMessage, TaskHandle, TaskMessage};

#[async_trait]
pub trait TaskBroker: Send + Sync {
    fn name(&self) -> &str;

    /// Enqueue one invocation of `task` and return its fresh handle.
    async fn submit(&self, task: &str, kwargs: Kwargs) -> Result<TaskHandle, QueueError>;

    /// Wait at most `wait` for the next message. `Ok(None)` on timeout.
    async fn fetch(&self, wait: Duration) -> Result<Option<TaskMessage>, QueueError>;

    /// True when a pending `fetch` can be dropped without losing a message.
    fn cancel_safe_fetch(&self) -> bool {
        false
    }

    /// Return a fetched but unprocessed message to the head of the queue.
    async fn requeue(&self, message: TaskMessage) -> Result<(), QueueError>;
}

#[async_trait]
pub trait ResultBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn store(&self, handle: &TaskHandle, result: &ResultMessage) -> Result<(), QueueError>;

    /// `LookupError::NotFound` for unknown and unfinished tasks.
    async fn get(&self, handle: &TaskHandle) -> Result<ResultMessage, LookupError>;
}
