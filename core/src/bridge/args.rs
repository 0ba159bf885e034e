use crate::error::BridgeError;
use crate::payload::{JobSpec, TaskDescriptor};

/// Optional engine-side logging flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHint {
    pub level: String,
    pub file: String,
}

/// Script path followed by the engine's flags.
pub fn build_engine_args(
    script: &str,
    descriptor: &TaskDescriptor,
    concurrency: usize,
    timeout: i64,
    log_hint: Option<&LogHint>,
) -> Result<Vec<String>, BridgeError> {
    let bastion = serde_json::to_string(&descriptor.proxy).map_err(BridgeError::Encode)?;
    let targets = serde_json::to_string(&descriptor.targets).map_err(BridgeError::Encode)?;

    let mut args = vec![
        script.to_string(),
        "--bastion".to_string(),
        bastion,
        "--targets".to_string(),
        targets,
    ];

    match &descriptor.job {
        JobSpec::Commands(commands) => {
            let commands = serde_json::to_string(commands).map_err(BridgeError::Encode)?;
            args.push("--commands".to_string());
            args.push(commands);
        }
        JobSpec::Upload {
            local_path,
            remote_path,
        } => {
            args.push("--local-path".to_string());
            args.push(local_path.clone());
            args.push("--remote-path".to_string());
            args.push(remote_path.clone());
        }
    }

    args.push("--concurrency".to_string());
    args.push(concurrency.to_string());
    args.push("--timeout".to_string());
    args.push(timeout.to_string());

    if let Some(hint) = log_hint {
        args.push("--log-level".to_string());
        args.push(hint.level.clone());
        args.push("--log-file".to_string());
        args.push(hint.file.clone());
    }

    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ProxyCredential, TargetCredential};
    use pretty_assertions::assert_eq;

    fn descriptor(job: JobSpec) -> TaskDescriptor {
        TaskDescriptor {
            proxy: ProxyCredential {
                host: "bastion".into(),
                port: 22,
                user: "ops".into(),
                password: "pw".into(),
            },
            targets: vec![TargetCredential {
                name: "h1".into(),
                host: "10.0.0.1".into(),
                port: 2222,
                user: "root".into(),
                password: "secret".into(),
            }],
            job,
            timeout: 30,
            concurrency: 0,
            save_log: false,
        }
    }

    #[test]
    fn command_args_carry_compact_json() {
        let d = descriptor(JobSpec::Commands(vec!["uptime".into(), "df -h".into()]));
        let args = build_engine_args("exec.py", &d, 1, 30, None).unwrap();
        assert_eq!(
            args,
            vec![
                "exec.py",
                "--bastion",
                r#"{"host":"bastion","port":22,"user":"ops","password":"pw"}"#,
                "--targets",
                r#"[{"name":"h1","host":"10.0.0.1","port":2222,"user":"root","password":"secret"}]"#,
                "--commands",
                r#"["uptime","df -h"]"#,
                "--concurrency",
                "1",
                "--timeout",
                "30",
            ]
        );
    }

    #[test]
    fn upload_args_and_log_hint() {
        let d = descriptor(JobSpec::Upload {
            local_path: "/tmp/a.tar".into(),
            remote_path: "/opt/a.tar".into(),
        });
        let hint = LogHint {
            level: "DEBUG".into(),
            file: "/var/log/hopq/engine-upload-t1.log".into(),
        };
        let args = build_engine_args("up.py", &d, 1, 120, Some(&hint)).unwrap();
        let tail: Vec<&str> = args[5..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "--local-path",
                "/tmp/a.tar",
                "--remote-path",
                "/opt/a.tar",
                "--concurrency",
                "1",
                "--timeout",
                "120",
                "--log-level",
                "DEBUG",
                "--log-file",
                "/var/log/hopq/engine-upload-t1.log",
            ]
        );
    }
}
