use serde_json::Value;

use crate::error::ValidationError;

use super::normalize::normalize_port;
use super::types::{JobSpec, Kwargs, ProxyCredential, TargetCredential, TaskDescriptor, TaskKind};
use super::value::{value_to_bool, value_to_int, value_to_string};

pub fn decode_target(index: usize, raw: &Value) -> Result<TargetCredential, ValidationError> {
    let obj = raw
        .as_object()
        .ok_or(ValidationError::TargetNotObject { index })?;

    let target = TargetCredential {
        name: value_to_string(obj.get("name")),
        host: value_to_string(obj.get("host")),
        port: normalize_port(value_to_int(obj.get("port"))),
        user: value_to_string(obj.get("user")),
        password: value_to_string(obj.get("password")),
    };

    if target.host.is_empty() || target.user.is_empty() || target.password.is_empty() {
        return Err(ValidationError::TargetIncomplete { index });
    }
    Ok(target)
}

/// All-or-nothing: the first bad record rejects the whole list.
pub fn decode_targets(raw: &Value) -> Result<Vec<TargetCredential>, ValidationError> {
    let items = raw
        .as_array()
        .ok_or(ValidationError::NotArray { field: "targets" })?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| decode_target(index, item))
        .collect()
}

pub fn decode_commands(raw: &Value) -> Result<Vec<String>, ValidationError> {
    let items = raw
        .as_array()
        .ok_or(ValidationError::NotArray { field: "commands" })?;
    let mut commands = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let command = value_to_string(Some(item));
        if command.is_empty() {
            return Err(ValidationError::EmptyCommand { index });
        }
        commands.push(command);
    }
    Ok(commands)
}

pub fn decode_proxy(kwargs: &Kwargs) -> Result<ProxyCredential, ValidationError> {
    let proxy = ProxyCredential {
        host: value_to_string(kwargs.get("proxy_host")),
        port: normalize_port(value_to_int(kwargs.get("proxy_port"))),
        user: value_to_string(kwargs.get("proxy_user")),
        password: value_to_string(kwargs.get("proxy_password")),
    };
    if proxy.host.is_empty() || proxy.user.is_empty() || proxy.password.is_empty() {
        return Err(ValidationError::ProxyIncomplete);
    }
    Ok(proxy)
}

/// Decode a task message of the given kind. Pure; the caller gets either a
/// complete descriptor or a single descriptive error.
pub fn decode_task(kind: TaskKind, kwargs: &Kwargs) -> Result<TaskDescriptor, ValidationError> {
    let raw_targets = kwargs
        .get("targets")
        .ok_or(ValidationError::MissingField { field: "targets" })?;
    let targets = decode_targets(raw_targets)?;

    let commands = match kind {
        TaskKind::Command => {
            let raw = kwargs
                .get("commands")
                .ok_or(ValidationError::MissingField { field: "commands" })?;
            Some(decode_commands(raw)?)
        }
        TaskKind::Upload => None,
    };

    let proxy = decode_proxy(kwargs)?;
    if targets.is_empty() {
        return Err(ValidationError::Empty { field: "targets" });
    }

    let job = match commands {
        Some(commands) if commands.is_empty() => {
            return Err(ValidationError::Empty { field: "commands" })
        }
        Some(commands) => JobSpec::Commands(commands),
        None => {
            let local_path = value_to_string(kwargs.get("local_path"));
            if local_path.is_empty() {
                return Err(ValidationError::MissingField {
                    field: "local_path",
                });
            }
            let remote_path = value_to_string(kwargs.get("remote_path"));
            if remote_path.is_empty() {
                return Err(ValidationError::MissingField {
                    field: "remote_path",
                });
            }
            JobSpec::Upload {
                local_path,
                remote_path,
            }
        }
    };

    Ok(TaskDescriptor {
        proxy,
        targets,
        job,
        timeout: value_to_int(kwargs.get("timeout")),
        concurrency: value_to_int(kwargs.get("concurrency")),
        save_log: value_to_bool(kwargs.get("save_log")),
    })
}

/// Like [`decode_task`] but for a payload that has not been checked to be a
/// mapping yet.
pub fn decode_kwargs(kind: TaskKind, payload: &Value) -> Result<TaskDescriptor, ValidationError> {
    let kwargs = payload.as_object().ok_or(ValidationError::NotObject)?;
    decode_task(kind, kwargs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn command_payload() -> Value {
        json!({
            "proxy_host": "bastion.internal",
            "proxy_port": 2222.0,
            "proxy_user": "jump",
            "proxy_password": "pw",
            "targets": [
                {"name": "web-1", "host": "10.0.0.5", "user": "root", "password": "x", "port": 0},
                {"name": "web-2", "host": "10.0.0.6", "user": "root", "password": "y", "port": "2200"}
            ],
            "commands": ["uptime", "df -h"],
            "timeout": "45",
            "save_log": true
        })
    }

    #[test]
    fn target_port_zero_normalizes() {
        let raw = json!({"host": "10.0.0.5", "user": "root", "password": "x", "port": 0});
        let target = decode_target(0, &raw).unwrap();
        assert_eq!(
            target,
            TargetCredential {
                name: String::new(),
                host: "10.0.0.5".into(),
                port: 22,
                user: "root".into(),
                password: "x".into(),
            }
        );
    }

    #[test]
    fn decodes_full_command_payload() {
        let task = decode_kwargs(TaskKind::Command, &command_payload()).unwrap();
        assert_eq!(task.kind(), TaskKind::Command);
        assert_eq!(task.proxy.port, 2222);
        assert_eq!(task.targets.len(), 2);
        assert_eq!(task.targets[1].port, 2200);
        assert_eq!(
            task.job,
            JobSpec::Commands(vec!["uptime".into(), "df -h".into()])
        );
        assert_eq!(task.timeout, 45);
        assert_eq!(task.concurrency, 0);
        assert!(task.save_log);
    }

    #[test]
    fn rejects_empty_targets() {
        let mut payload = command_payload();
        payload["targets"] = json!([]);
        let err = decode_kwargs(TaskKind::Command, &payload).unwrap_err();
        assert_eq!(err.to_string(), "targets cannot be empty");
    }

    #[test]
    fn rejects_empty_commands() {
        let mut payload = command_payload();
        payload["commands"] = json!([]);
        let err = decode_kwargs(TaskKind::Command, &payload).unwrap_err();
        assert_eq!(err.to_string(), "commands cannot be empty");
    }

    #[test]
    fn rejects_blank_command_entry_with_index() {
        let mut payload = command_payload();
        payload["commands"] = json!(["uptime", ""]);
        let err = decode_kwargs(TaskKind::Command, &payload).unwrap_err();
        assert_eq!(err, ValidationError::EmptyCommand { index: 1 });
    }

    #[test]
    fn missing_password_names_the_target_index() {
        let mut payload = command_payload();
        payload["targets"] = json!([
            {"host": "a", "user": "u", "password": "p"},
            {"host": "b", "user": "u", "password": "p"},
            {"host": "c", "user": "u"}
        ]);
        let err = decode_kwargs(TaskKind::Command, &payload).unwrap_err();
        assert_eq!(err, ValidationError::TargetIncomplete { index: 2 });
        assert!(err.to_string().contains("target[2]"));
    }

    #[test]
    fn non_object_target_is_rejected() {
        let mut payload = command_payload();
        payload["targets"] = json!(["10.0.0.1"]);
        let err = decode_kwargs(TaskKind::Command, &payload).unwrap_err();
        assert_eq!(err.to_string(), "target[0] must be object");
    }

    #[test]
    fn rejects_missing_proxy_user() {
        let mut payload = command_payload();
        payload.as_object_mut().unwrap().remove("proxy_user");
        let err = decode_kwargs(TaskKind::Command, &payload).unwrap_err();
        assert_eq!(err, ValidationError::ProxyIncomplete);
    }

    #[test]
    fn missing_keys_are_reported() {
        let mut payload = command_payload();
        payload.as_object_mut().unwrap().remove("commands");
        assert_eq!(
            decode_kwargs(TaskKind::Command, &payload).unwrap_err(),
            ValidationError::MissingField { field: "commands" }
        );

        payload.as_object_mut().unwrap().remove("targets");
        assert_eq!(
            decode_kwargs(TaskKind::Command, &payload).unwrap_err(),
            ValidationError::MissingField { field: "targets" }
        );
        assert_eq!(
            decode_kwargs(TaskKind::Command, &json!("nope")).unwrap_err(),
            ValidationError::NotObject
        );
    }

    #[test]
    fn upload_requires_both_paths() {
        let mut payload = command_payload();
        payload.as_object_mut().unwrap().remove("commands");
        payload["local_path"] = json!("/srv/build");
        let err = decode_kwargs(TaskKind::Upload, &payload).unwrap_err();
        assert_eq!(err.to_string(), "remote_path is required");

        payload["remote_path"] = json!("/opt/app");
        let task = decode_kwargs(TaskKind::Upload, &payload).unwrap();
        assert_eq!(task.kind(), TaskKind::Upload);
        assert_eq!(
            task.job,
            JobSpec::Upload {
                local_path: "/srv/build".into(),
                remote_path: "/opt/app".into()
            }
        );
    }

    #[test]
    fn kwargs_re_decode_to_the_same_descriptor() {
        let task = decode_kwargs(TaskKind::Command, &command_payload()).unwrap();
        let again = decode_task(TaskKind::Command, &task.to_kwargs()).unwrap();
        assert_eq!(task, again);
    }
}
