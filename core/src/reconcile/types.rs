use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::payload::TaskKind;

pub const PARTIAL_FAILURE_PREFIX: &str = "some targets failed: ";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub name: String,
    pub host: String,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UploadResult {
    pub name: String,
    pub host: String,
    pub success: bool,
    pub uploaded_files: Vec<String>,
    pub failed_files: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TaskResults {
    Execution(Vec<ExecutionResult>),
    Upload(Vec<UploadResult>),
}

impl TaskResults {
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Execution(_) => TaskKind::Command,
            Self::Upload(_) => TaskKind::Upload,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Execution(r) => r.len(),
            Self::Upload(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn success_count(&self) -> usize {
        match self {
            Self::Execution(r) => r.iter().filter(|r| r.success).count(),
            Self::Upload(r) => r.iter().filter(|r| r.success).count(),
        }
    }

    /// First failed target's error, prefixed, when not every target succeeded.
    /// A hint only; per-target entries remain authoritative.
    pub fn aggregate_error(&self) -> Option<String> {
        let mut failed: Box<dyn Iterator<Item = (bool, Option<&String>)> + '_> = match self {
            Self::Execution(r) => Box::new(r.iter().map(|r| (r.success, r.error.as_ref()))),
            Self::Upload(r) => Box::new(r.iter().map(|r| (r.success, r.error.as_ref()))),
        };
        failed
            .find_map(|(success, error)| (!success).then_some(error).flatten())
            .map(|error| format!("{PARTIAL_FAILURE_PREFIX}{error}"))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Array(Vec::new()))
    }
}
