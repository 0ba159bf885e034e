use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::QueueConfig;
use crate::error::SubmitError;
use crate::payload::{decode_kwargs, normalize_timeout, TaskKind};
use crate::queue::{TaskBroker, TaskState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub task_id: String,
    pub status: TaskState,
    pub message: String,
}

/// Validates payloads and enqueues them under the configured task names.
#[derive(Clone)]
pub struct SubmissionService {
    broker: Arc<dyn TaskBroker>,
    queue: QueueConfig,
    default_timeout: i64,
}

impl SubmissionService {
    pub fn new(broker: Arc<dyn TaskBroker>, queue: QueueConfig, default_timeout: i64) -> Self {
        Self {
            broker,
            queue,
            default_timeout,
        }
    }

    /// Invalid payloads are rejected here and never reach the broker.
    pub async fn submit(
        &self,
        kind: TaskKind,
        payload: &Value,
    ) -> Result<SubmitReceipt, SubmitError> {
        let descriptor = decode_kwargs(kind, payload)?;
        let timeout = normalize_timeout(descriptor.timeout, self.default_timeout);
        let descriptor = descriptor.with_timeout(timeout);

        let task_name = self.queue.task_name_for(kind);
        let handle = self
            .broker
            .submit(task_name, descriptor.to_kwargs())
            .await
            .map_err(|e| {
                tracing::error!(task = %task_name, "submit task failed: {}", e);
                SubmitError::Dispatch(e)
            })?;

        tracing::info!(
            task_id = %handle,
            task = %task_name,
            targets = descriptor.targets.len(),
            "task submitted"
        );

        let message = match kind {
            TaskKind::Command => "ssh task submitted",
            TaskKind::Upload => "upload task submitted",
        };
        Ok(SubmitReceipt {
            task_id: handle.to_string(),
            status: TaskState::Pending,
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{QueueError, ValidationError};
    use crate::payload::Kwargs;
    use crate::queue::{MemoryQueue, TaskHandle, TaskMessage};
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    fn payload() -> Value {
        json!({
            "proxy_host": "bastion",
            "proxy_port": 0,
            "proxy_user": "ops",
            "proxy_password": "pw",
            "targets": [{"name": "h1", "host": "10.0.0.1", "user": "root", "password": "x"}],
            "commands": ["uptime"],
        })
    }

    #[tokio::test]
    async fn valid_payload_is_enqueued_with_default_timeout() {
        let q = Arc::new(MemoryQueue::new());
        let svc = SubmissionService::new(q.clone(), QueueConfig::default(), 120);

        let receipt = svc.submit(TaskKind::Command, &payload()).await.unwrap();
        assert_eq!(receipt.status, TaskState::Pending);

        let message = q.fetch(Duration::from_millis(10)).await.unwrap().unwrap();
        assert_eq!(message.id, receipt.task_id);
        assert_eq!(message.task, "tasks.execute_ssh");
        assert_eq!(message.kwargs["timeout"], 120);
        assert_eq!(message.kwargs["proxy_port"], 22);
        assert_eq!(message.kwargs["targets"][0]["port"], 22);
    }

    #[tokio::test]
    async fn invalid_payload_is_never_enqueued() {
        let q = Arc::new(MemoryQueue::new());
        let svc = SubmissionService::new(q.clone(), QueueConfig::default(), 120);

        let mut bad = payload();
        bad["targets"] = json!([]);
        let err = svc.submit(TaskKind::Command, &bad).await.unwrap_err();
        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::Empty { field: "targets" })
        ));
        assert!(q.is_empty().await);
    }

    struct DownBroker;

    #[async_trait]
    impl TaskBroker for DownBroker {
        fn name(&self) -> &str {
            "down"
        }

        async fn submit(&self, _task: &str, _kwargs: Kwargs) -> Result<TaskHandle, QueueError> {
            Err(QueueError::Unavailable("connection refused".into()))
        }

        async fn fetch(&self, _wait: Duration) -> Result<Option<TaskMessage>, QueueError> {
            Ok(None)
        }

        async fn requeue(&self, _message: TaskMessage) -> Result<(), QueueError> {
            Err(QueueError::Unavailable("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn broker_failure_is_dispatch_error() {
        let svc = SubmissionService::new(Arc::new(DownBroker), QueueConfig::default(), 120);
        let err = svc.submit(TaskKind::Command, &payload()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Dispatch(_)));
        assert!(err.to_string().starts_with("submit task to queue"));
    }

    #[tokio::test]
    async fn upload_uses_upload_task_name() {
        let q = Arc::new(MemoryQueue::new());
        let svc = SubmissionService::new(q.clone(), QueueConfig::default(), 60);

        let mut upload = payload();
        let obj = upload.as_object_mut().unwrap();
        obj.remove("commands");
        obj.insert("local_path".into(), json!("/tmp/a"));
        obj.insert("remote_path".into(), json!("/opt/a"));
        obj.insert("timeout".into(), json!(15));

        svc.submit(TaskKind::Upload, &upload).await.unwrap();
        let message = q.fetch(Duration::from_millis(10)).await.unwrap().unwrap();
        assert_eq!(message.task, "tasks.upload_file");
        assert_eq!(message.kwargs["timeout"], 15);
    }
}
