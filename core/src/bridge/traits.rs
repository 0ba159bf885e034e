use async_trait::async_trait;

use crate::error::EngineLaunchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl EngineInvocation {
    /// `interpreter script args...`, or `script args...` when no interpreter is set.
    pub fn new(interpreter: &str, script_and_args: Vec<String>) -> Self {
        let interpreter = interpreter.trim();
        if interpreter.is_empty() {
            let mut iter = script_and_args.into_iter();
            let program = iter.next().unwrap_or_default();
            Self {
                program,
                args: iter.collect(),
            }
        } else {
            Self {
                program: interpreter.to_string(),
                args: script_and_args,
            }
        }
    }

    pub fn argv(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOutput {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl EngineOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn failure_description(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs one engine invocation to completion.
#[async_trait]
pub trait EngineRunner: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, invocation: &EngineInvocation) -> Result<EngineOutput, EngineLaunchError>;
}
