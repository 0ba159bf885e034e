use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

use crate::error::{LookupError, QueueError};
use crate::payload::Kwargs;

use super::traits::{ResultBackend, TaskBroker};
use super::types::{ResultMessage, TaskHandle, TaskMessage};

struct StoredResult {
    result: ResultMessage,
    stored_at: Instant,
}

/// In-process broker and result backend. Results expire after the configured
/// ttl, matching the expiry of the Redis backend.
#[derive(Default)]
pub struct MemoryQueue {
    pending: Mutex<VecDeque<TaskMessage>>,
    results: Mutex<HashMap<String, StoredResult>>,
    result_ttl: Option<Duration>,
    arrived: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_result_ttl(ttl: Duration) -> Self {
        Self {
            result_ttl: Some(ttl),
            ..Self::default()
        }
    }

    /// Enqueue an already-built message, bypassing handle generation.
    pub async fn push_raw(&self, message: TaskMessage) {
        self.pending.lock().await.push_back(message);
        self.arrived.notify_one();
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Number of results currently held, expired ones included until the next store.
    pub async fn stored(&self) -> usize {
        self.results.lock().await.len()
    }

    fn expired(&self, stored: &StoredResult, now: Instant) -> bool {
        self.result_ttl
            .is_some_and(|ttl| now.duration_since(stored.stored_at) >= ttl)
    }
}

#[async_trait]
impl TaskBroker for MemoryQueue {
    fn name(&self) -> &str {
        "memory"
    }

    async fn submit(&self, task: &str, kwargs: Kwargs) -> Result<TaskHandle, QueueError> {
        let handle = TaskHandle::generate();
        self.push_raw(TaskMessage::new(&handle, task, kwargs)).await;
        Ok(handle)
    }

    async fn fetch(&self, wait: Duration) -> Result<Option<TaskMessage>, QueueError> {
        let deadline = Instant::now() + wait;
        loop {
            // notify_one keeps a permit when nobody is waiting yet.
            let notified = self.arrived.notified();
            if let Some(message) = self.pending.lock().await.pop_front() {
                return Ok(Some(message));
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    // The pop and the return happen without an await in between.
    fn cancel_safe_fetch(&self) -> bool {
        true
    }

    async fn requeue(&self, message: TaskMessage) -> Result<(), QueueError> {
        self.pending.lock().await.push_front(message);
        self.arrived.notify_one();
        Ok(())
    }
}

#[async_trait]
impl ResultBackend for MemoryQueue {
    fn name(&self) -> &str {
        "memory"
    }

    async fn store(&self, handle: &TaskHandle, result: &ResultMessage) -> Result<(), QueueError> {
        let now = Instant::now();
        let mut results = self.results.lock().await;
        results.retain(|_, stored| !self.expired(stored, now));
        results.insert(
            handle.as_str().to_string(),
            StoredResult {
                result: result.clone(),
                stored_at: now,
            },
        );
        Ok(())
    }

    async fn get(&self, handle: &TaskHandle) -> Result<ResultMessage, LookupError> {
        let results = self.results.lock().await;
        match results.get(handle.as_str()) {
            Some(stored) if !self.expired(stored, Instant::now()) => Ok(stored.result.clone()),
            _ => Err(LookupError::NotFound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn fetch_is_fifo() {
        let q = MemoryQueue::new();
        let a = q.submit("t", Kwargs::new()).await.unwrap();
        let b = q.submit("t", Kwargs::new()).await.unwrap();

        let wait = Duration::from_millis(10);
        assert_eq!(q.fetch(wait).await.unwrap().unwrap().id, a.as_str());
        assert_eq!(q.fetch(wait).await.unwrap().unwrap().id, b.as_str());
        assert!(q.fetch(wait).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_wakes_on_submit() {
        let q = Arc::new(MemoryQueue::new());
        let fetcher = {
            let q = q.clone();
            tokio::spawn(async move { q.fetch(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        q.submit("tasks.execute_ssh", Kwargs::new()).await.unwrap();

        let message = fetcher.await.unwrap().unwrap().unwrap();
        assert_eq!(message.task, "tasks.execute_ssh");
    }

    #[tokio::test]
    async fn unknown_result_is_not_found() {
        let q = MemoryQueue::new();
        let handle = TaskHandle::from("missing");
        assert!(matches!(q.get(&handle).await, Err(LookupError::NotFound)));

        q.store(&handle, &ResultMessage::success("missing", json!([])))
            .await
            .unwrap();
        assert_eq!(q.get(&handle).await.unwrap().status, "SUCCESS");
    }

    #[tokio::test]
    async fn requeued_message_is_fetched_first() {
        let q = MemoryQueue::new();
        q.submit("later", Kwargs::new()).await.unwrap();
        let handle = TaskHandle::from("put-back");
        q.requeue(TaskMessage::new(&handle, "first", Kwargs::new()))
            .await
            .unwrap();

        let wait = Duration::from_millis(10);
        assert_eq!(q.fetch(wait).await.unwrap().unwrap().id, "put-back");
        assert_eq!(q.fetch(wait).await.unwrap().unwrap().task, "later");
    }

    #[tokio::test]
    async fn results_expire_after_ttl() {
        let q = MemoryQueue::with_result_ttl(Duration::from_millis(50));
        let old = TaskHandle::from("old");
        q.store(&old, &ResultMessage::success("old", json!([])))
            .await
            .unwrap();
        assert!(q.get(&old).await.is_ok());

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(matches!(q.get(&old).await, Err(LookupError::NotFound)));

        let fresh = TaskHandle::from("fresh");
        q.store(&fresh, &ResultMessage::success("fresh", json!([])))
            .await
            .unwrap();
        assert_eq!(q.stored().await, 1);
        assert!(q.get(&fresh).await.is_ok());
    }
}
