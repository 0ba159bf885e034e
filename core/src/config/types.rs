use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::payload::TaskKind;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub queue: QueueConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub http_server: HttpServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    #[serde(default = "default_logging_console")]
    pub console: bool,

    #[serde(default = "default_logging_file")]
    pub file: bool,

    #[serde(default = "default_logging_level")]
    pub level: String,

    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_file() -> bool {
    false
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: default_logging_file(),
            level: default_logging_level(),
            directory: None,
        }
    }
}

/// Broker and result backend addresses plus task routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// `redis://...` or `memory://`. Empty means unconfigured.
    #[serde(default)]
    pub broker: String,

    #[serde(default)]
    pub backend: String,

    #[serde(default = "default_task_name")]
    pub task_name: String,

    #[serde(default = "default_upload_task_name")]
    pub upload_task_name: String,

    #[serde(default = "default_queue_name")]
    pub queue_name: String,

    /// Handler invocations allowed in flight per process.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_result_expires_secs")]
    pub result_expires_secs: u64,
}

fn default_task_name() -> String {
    "tasks.execute_ssh".to_string()
}

fn default_upload_task_name() -> String {
    "tasks.upload_file".to_string()
}

fn default_queue_name() -> String {
    "celery".to_string()
}

fn default_workers() -> usize {
    1
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_result_expires_secs() -> u64 {
    86_400
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            broker: String::new(),
            backend: String::new(),
            task_name: default_task_name(),
            upload_task_name: default_upload_task_name(),
            queue_name: default_queue_name(),
            workers: default_workers(),
            poll_interval_ms: default_poll_interval_ms(),
            result_expires_secs: default_result_expires_secs(),
        }
    }
}

impl QueueConfig {
    pub fn ensure_substrate(&self) -> Result<(), ConfigError> {
        if self.broker.trim().is_empty() || self.backend.trim().is_empty() {
            return Err(ConfigError::SubstrateMissing);
        }
        Ok(())
    }

    pub fn task_name_for(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Command => &self.task_name,
            TaskKind::Upload => &self.upload_task_name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Program the engine script is handed to. Empty runs the script directly.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    #[serde(default = "default_script")]
    pub script: String,

    #[serde(default = "default_upload_script")]
    pub upload_script: String,

    #[serde(default = "default_concurrency")]
    pub concurrency: i64,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: i64,

    #[serde(default = "default_engine_log_level")]
    pub engine_log_level: String,

    /// Where per-task engine logs go when a task asks for `save_log`.
    #[serde(default)]
    pub log_directory: Option<String>,
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_script() -> String {
    "./scripts/ssh_executor.py".to_string()
}

fn default_upload_script() -> String {
    "./scripts/ssh_uploader.py".to_string()
}

fn default_concurrency() -> i64 {
    5
}

fn default_timeout_seconds() -> i64 {
    120
}

fn default_engine_log_level() -> String {
    "INFO".to_string()
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            script: default_script(),
            upload_script: default_upload_script(),
            concurrency: default_concurrency(),
            timeout_seconds: default_timeout_seconds(),
            engine_log_level: default_engine_log_level(),
            log_directory: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    #[serde(default = "default_http_host")]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub port: u16,
}

fn default_http_host() -> String {
    "127.0.0.1".to_string()
}

fn default_http_port() -> u16 {
    8888
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_http_host(),
            port: default_http_port(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [queue]
            broker = "redis://127.0.0.1:6379/0"
            workers = 4

            [executor]
            timeout_seconds = 30
            "#,
        )
        .unwrap();

        assert_eq!(cfg.queue.workers, 4);
        assert_eq!(cfg.queue.task_name, "tasks.execute_ssh");
        assert_eq!(cfg.queue.upload_task_name, "tasks.upload_file");
        assert_eq!(cfg.executor.timeout_seconds, 30);
        assert_eq!(cfg.executor.concurrency, 5);
        assert_eq!(cfg.http_server.port, 8888);
        assert!(cfg.logging.console);
    }

    #[test]
    fn substrate_requires_both_addresses() {
        let mut queue = QueueConfig::default();
        assert!(matches!(
            queue.ensure_substrate(),
            Err(ConfigError::SubstrateMissing)
        ));
        queue.broker = "memory://".into();
        assert!(queue.ensure_substrate().is_err());
        queue.backend = "memory://".into();
        assert!(queue.ensure_substrate().is_ok());
    }
}
