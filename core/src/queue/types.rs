use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::payload::Kwargs;

/// Opaque task id, a UUID v4 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskHandle(String);

impl TaskHandle {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TaskHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskHandle {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dequeued task invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskMessage {
    pub id: String,
    pub task: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Kwargs,
    #[serde(default)]
    pub retries: u32,
}

impl TaskMessage {
    pub fn new(handle: &TaskHandle, task: &str, kwargs: Kwargs) -> Self {
        Self {
            id: handle.as_str().to_string(),
            task: task.to_string(),
            args: Vec::new(),
            kwargs,
            retries: 0,
        }
    }
}

/// Stored task outcome in the Celery result layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(rename = "task_id", alias = "id")]
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub traceback: Option<String>,
    #[serde(default)]
    pub children: Vec<Value>,
    #[serde(default)]
    pub date_done: Option<String>,
}

impl ResultMessage {
    pub fn success(id: &str, result: Value) -> Self {
        Self::finished(id, TaskState::Success, result)
    }

    /// Failure payload `{exc_type, exc_message}`.
    pub fn failure(id: &str, exc_type: &str, message: &str) -> Self {
        Self::finished(
            id,
            TaskState::Failure,
            json!({ "exc_type": exc_type, "exc_message": message }),
        )
    }

    fn finished(id: &str, state: TaskState, result: Value) -> Self {
        Self {
            id: id.to_string(),
            status: state.as_str().to_string(),
            result,
            traceback: None,
            children: Vec::new(),
            date_done: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Message of a stored failure, when the result carries one.
    pub fn failure_message(&self) -> Option<String> {
        let message = match &self.result {
            Value::Object(obj) => match obj.get("exc_message") {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Array(parts)) => {
                    let joined = parts
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(" ");
                    Some(joined)
                }
                _ => None,
            },
            Value::String(s) if TaskState::from_raw(&self.status) == TaskState::Failure => {
                Some(s.clone())
            }
            _ => None,
        };
        message.filter(|m| !m.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskState {
    Pending,
    Success,
    Failure,
}

impl TaskState {
    /// Map a raw backend status. In-progress states read as pending; anything
    /// unrecognised is a failure.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "SUCCESS" => Self::Success,
            "PENDING" | "STARTED" | "RECEIVED" | "RETRY" => Self::Pending,
            _ => Self::Failure,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
