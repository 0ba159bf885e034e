use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Untyped keyword arguments as carried by a queue message.
pub type Kwargs = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Command,
    Upload,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bastion host the engine hops through. Serialises to the engine's
/// `--bastion` JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyCredential {
    pub host: String,
    pub port: i64,
    pub user: String,
    pub password: String,
}

/// One remote host. Identity is its position in the target list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetCredential {
    pub name: String,
    pub host: String,
    pub port: i64,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobSpec {
    Commands(Vec<String>),
    Upload {
        local_path: String,
        remote_path: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub proxy: ProxyCredential,
    pub targets: Vec<TargetCredential>,
    pub job: JobSpec,
    /// Seconds, as requested. Zero or negative means "use the default".
    pub timeout: i64,
    /// Engine fan-out hint. Zero or negative means "use the default".
    pub concurrency: i64,
    pub save_log: bool,
}

impl TaskDescriptor {
    pub fn kind(&self) -> TaskKind {
        match self.job {
            JobSpec::Commands(_) => TaskKind::Command,
            JobSpec::Upload { .. } => TaskKind::Upload,
        }
    }

    pub fn with_timeout(self, timeout: i64) -> Self {
        Self { timeout, ..self }
    }

    /// Wire form used when enqueueing a validated descriptor.
    pub fn to_kwargs(&self) -> Kwargs {
        let mut kwargs = Map::new();
        kwargs.insert("proxy_host".into(), json!(self.proxy.host));
        kwargs.insert("proxy_port".into(), json!(self.proxy.port));
        kwargs.insert("proxy_user".into(), json!(self.proxy.user));
        kwargs.insert("proxy_password".into(), json!(self.proxy.password));
        kwargs.insert(
            "targets".into(),
            serde_json::to_value(&self.targets).unwrap_or(Value::Array(Vec::new())),
        );
        match &self.job {
            JobSpec::Commands(commands) => {
                kwargs.insert("commands".into(), json!(commands));
            }
            JobSpec::Upload {
                local_path,
                remote_path,
            } => {
                kwargs.insert("local_path".into(), json!(local_path));
                kwargs.insert("remote_path".into(), json!(remote_path));
            }
        }
        kwargs.insert("timeout".into(), json!(self.timeout));
        if self.concurrency > 0 {
            kwargs.insert("concurrency".into(), json!(self.concurrency));
        }
        kwargs.insert("save_log".into(), json!(self.save_log));
        kwargs
    }
}
