use std::path::Path;
use std::sync::Arc;

use crate::config::ExecutorConfig;
use crate::error::BridgeError;
use crate::payload::{effective_concurrency, normalize_timeout, JobSpec, TaskDescriptor, TaskKind};
use crate::reconcile::{
    decode_records, log_results, parse_engine_records, ExecutionResult, TaskResults, UploadResult,
};
use crate::util::preview;

use super::args::{build_engine_args, LogHint};
use super::traits::{EngineInvocation, EngineOutput, EngineRunner};

pub const ENGINE_STDOUT_PREVIEW: usize = 500;

#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub interpreter: String,
    pub script: String,
    pub upload_script: String,
    pub default_concurrency: i64,
    pub default_timeout: i64,
    pub engine_log_level: String,
    pub log_directory: Option<String>,
}

impl BridgeSettings {
    pub fn from_config(cfg: &ExecutorConfig) -> Self {
        Self {
            interpreter: cfg.interpreter.clone(),
            script: cfg.script.clone(),
            upload_script: cfg.upload_script.clone(),
            default_concurrency: cfg.concurrency,
            default_timeout: cfg.timeout_seconds,
            engine_log_level: cfg.engine_log_level.clone(),
            log_directory: cfg.log_directory.clone(),
        }
    }

    fn script_for(&self, kind: TaskKind) -> &str {
        match kind {
            TaskKind::Command => &self.script,
            TaskKind::Upload => &self.upload_script,
        }
    }

    fn log_hint(&self, task_id: &str, kind: TaskKind) -> Option<LogHint> {
        let dir = self
            .log_directory
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())?;
        let file = Path::new(dir).join(format!("engine-{kind}-{task_id}.log"));
        Some(LogHint {
            level: self.engine_log_level.clone(),
            file: file.to_string_lossy().to_string(),
        })
    }
}

/// Runs one engine subprocess per task and reconciles its stdout.
#[derive(Clone)]
pub struct ProcessBridge {
    engine: Arc<dyn EngineRunner>,
    settings: BridgeSettings,
}

impl ProcessBridge {
    pub fn new(engine: Arc<dyn EngineRunner>, settings: BridgeSettings) -> Self {
        Self { engine, settings }
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Launch failures and non-zero exits come back as a single synthetic
    /// failure record. Only unreadable output from a successful run, a missing
    /// script or a missing upload source is a hard error.
    pub async fn execute(
        &self,
        task_id: &str,
        descriptor: &TaskDescriptor,
    ) -> Result<TaskResults, BridgeError> {
        let kind = descriptor.kind();
        let script = self.settings.script_for(kind);
        if script.trim().is_empty() {
            return Err(BridgeError::ScriptMissing { kind });
        }

        if let JobSpec::Upload { local_path, .. } = &descriptor.job {
            if tokio::fs::metadata(local_path).await.is_err() {
                tracing::error!(task_id = %task_id, "local path does not exist: {}", local_path);
                return Err(BridgeError::LocalPathMissing(local_path.clone()));
            }
        }

        let hint = if descriptor.concurrency > 0 {
            descriptor.concurrency
        } else {
            self.settings.default_concurrency
        };
        let concurrency = effective_concurrency(hint, descriptor.targets.len());
        let timeout = normalize_timeout(descriptor.timeout, self.settings.default_timeout);
        let log_hint = if descriptor.save_log {
            self.settings.log_hint(task_id, kind)
        } else {
            None
        };

        let args = build_engine_args(script, descriptor, concurrency, timeout, log_hint.as_ref())?;
        let invocation = EngineInvocation::new(&self.settings.interpreter, args);

        tracing::info!(
            task_id = %task_id,
            engine = %self.engine.name(),
            kind = %kind,
            targets = descriptor.targets.len(),
            concurrency,
            timeout,
            "executing script: {} {}",
            invocation.program,
            script
        );
        for (i, target) in descriptor.targets.iter().enumerate() {
            tracing::debug!("target[{}]: {} ({}:{})", i, target.name, target.host, target.port);
        }

        let output = match self.engine.run(&invocation).await {
            Ok(output) => output,
            Err(e) => {
                tracing::error!(task_id = %task_id, "script execution failed: {}", e);
                return Ok(synthetic_failure(kind, &EngineOutput::default(), e.to_string()));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.success() {
            let description = output.failure_description();
            tracing::error!(task_id = %task_id, "script execution failed: {}", description);
            if !stderr.is_empty() {
                tracing::warn!(task_id = %task_id, "script stderr: {}", stderr);
            }
            return Ok(synthetic_failure(kind, &output, description));
        }

        tracing::info!(
            task_id = %task_id,
            "script execution completed, stdout length={}",
            output.stdout.len()
        );
        if !stdout.is_empty() {
            tracing::debug!("raw stdout: {}", preview(&stdout, ENGINE_STDOUT_PREVIEW));
        }
        if !stderr.is_empty() {
            tracing::warn!(task_id = %task_id, "script stderr: {}", stderr);
        }

        let records = parse_engine_records(&output.stdout).map_err(|e| {
            tracing::error!(task_id = %task_id, "failed to decode engine output: {}", e);
            BridgeError::Output(e)
        })?;
        let results = decode_records(kind, &records);
        log_results(task_id, &results);
        Ok(results)
    }
}

fn synthetic_failure(kind: TaskKind, output: &EngineOutput, error: String) -> TaskResults {
    match kind {
        TaskKind::Command => TaskResults::Execution(vec![ExecutionResult {
            name: String::new(),
            host: String::new(),
            success: false,
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: 1,
            error: Some(error),
        }]),
        TaskKind::Upload => TaskResults::Upload(vec![UploadResult {
            success: false,
            error: Some(error),
            ..Default::default()
        }]),
    }
}
