use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::bridge::ProcessBridge;
use crate::error::{ConfigError, TaskError, ValidationError};
use crate::payload::{decode_task, Kwargs, TaskDescriptor, TaskKind};

/// A named task the worker can execute. Each invocation decodes into its own
/// descriptor and returns its own result value.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    fn name(&self) -> &str;
    fn decode(&self, kwargs: &Kwargs) -> Result<TaskDescriptor, ValidationError>;
    async fn run(&self, task_id: &str, descriptor: TaskDescriptor) -> Result<Value, TaskError>;
}

/// Handler that hands the descriptor to the engine bridge.
pub struct EngineTaskHandler {
    name: String,
    kind: TaskKind,
    bridge: ProcessBridge,
}

impl EngineTaskHandler {
    pub fn command(name: impl Into<String>, bridge: ProcessBridge) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Command,
            bridge,
        }
    }

    pub fn upload(name: impl Into<String>, bridge: ProcessBridge) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Upload,
            bridge,
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }
}

#[async_trait]
impl TaskHandler for EngineTaskHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn decode(&self, kwargs: &Kwargs) -> Result<TaskDescriptor, ValidationError> {
        decode_task(self.kind, kwargs)
    }

    async fn run(&self, task_id: &str, descriptor: TaskDescriptor) -> Result<Value, TaskError> {
        let results = self.bridge.execute(task_id, &descriptor).await?;
        Ok(results.to_value())
    }
}

#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn TaskHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn TaskHandler>) -> Result<(), ConfigError> {
        let name = handler.name().trim().to_string();
        if name.is_empty() {
            return Err(ConfigError::Invalid("task name cannot be empty".into()));
        }
        if self.handlers.contains_key(&name) {
            return Err(ConfigError::Invalid(format!(
                "task {name} registered more than once"
            )));
        }
        self.handlers.insert(name, handler);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn TaskHandler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
