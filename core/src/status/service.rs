use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::error::{LookupError, StatusError};
use crate::payload::TaskKind;
use crate::queue::{ResultBackend, ResultMessage, TaskHandle, TaskState};
use crate::reconcile::{decode_records, records_from_value, TaskResults};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskStatusReport {
    pub task_id: String,
    pub status: TaskState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<TaskResults>,
}

/// Read-only view over the result backend.
#[derive(Clone)]
pub struct StatusQueryService {
    backend: Arc<dyn ResultBackend>,
}

impl StatusQueryService {
    pub fn new(backend: Arc<dyn ResultBackend>) -> Self {
        Self { backend }
    }

    pub async fn query(
        &self,
        kind: TaskKind,
        task_id: &str,
    ) -> Result<TaskStatusReport, StatusError> {
        let task_id = task_id.trim();
        if task_id.is_empty() {
            return Err(StatusError::InvalidRequest("task_id is required".into()));
        }

        let stored = match self.backend.get(&TaskHandle::from(task_id)).await {
            Ok(stored) => stored,
            Err(LookupError::Corrupt(detail)) => return Err(StatusError::Decode(detail)),
            Err(e) => {
                tracing::debug!(task_id = %task_id, "result not ready: {}", e);
                return Ok(TaskStatusReport {
                    task_id: task_id.to_string(),
                    status: TaskState::Pending,
                    error: Some(e.to_string()),
                    results: None,
                });
            }
        };

        report_from_stored(kind, task_id, &stored)
    }
}

fn report_from_stored(
    kind: TaskKind,
    task_id: &str,
    stored: &ResultMessage,
) -> Result<TaskStatusReport, StatusError> {
    let status = TaskState::from_raw(&stored.status);

    let results = match &stored.result {
        Value::Array(_) => {
            let records = records_from_value(stored.result.clone())
                .map_err(|e| StatusError::Decode(e.to_string()))?;
            Some(decode_records(kind, &records))
        }
        _ if status == TaskState::Success => {
            return Err(StatusError::Decode(
                "successful task result is not an array".into(),
            ));
        }
        _ => None,
    };

    let error = results
        .as_ref()
        .and_then(TaskResults::aggregate_error)
        .or_else(|| stored.failure_message())
        .or_else(|| {
            (stored.status != "SUCCESS").then(|| format!("task status: {}", stored.status))
        });

    Ok(TaskStatusReport {
        task_id: task_id.to_string(),
        status,
        error,
        results,
    })
}
