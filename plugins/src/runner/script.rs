use std::process::Stdio;

use async_trait::async_trait;
use hopq_core::api::{EngineInvocation, EngineLaunchError, EngineOutput, EngineRunner};
use tokio::process::Command;

/// Runs the engine as a child process and collects its full output.
pub struct ScriptEngine {}

impl ScriptEngine {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EngineRunner for ScriptEngine {
    fn name(&self) -> &str {
        "script"
    }

    async fn run(&self, invocation: &EngineInvocation) -> Result<EngineOutput, EngineLaunchError> {
        let output = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| EngineLaunchError {
                program: invocation.program.clone(),
                source,
            })?;

        Ok(EngineOutput {
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
