//! Celery wire format: protocol v1 task envelopes with a base64 body, and the
//! `celery-task-meta-<id>` result layout. Protocol v2 messages are accepted on
//! decode.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use hopq_core::api::{Kwargs, QueueError, TaskMessage};

pub const RESULT_KEY_PREFIX: &str = "celery-task-meta-";

pub fn result_key(task_id: &str) -> String {
    format!("{RESULT_KEY_PREFIX}{task_id}")
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    body: String,
    #[serde(default)]
    headers: Map<String, Value>,
    #[serde(rename = "content-type", default)]
    content_type: String,
    #[serde(default)]
    properties: Properties,
    #[serde(rename = "content-encoding", default)]
    content_encoding: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Properties {
    #[serde(default)]
    body_encoding: String,
    #[serde(default)]
    correlation_id: String,
    #[serde(default)]
    reply_to: String,
    #[serde(default)]
    delivery_info: DeliveryInfo,
    #[serde(default)]
    delivery_mode: u8,
    #[serde(default)]
    delivery_tag: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct DeliveryInfo {
    #[serde(default)]
    priority: u8,
    #[serde(default)]
    routing_key: String,
    #[serde(default)]
    exchange: String,
}

pub fn encode_task(message: &TaskMessage, queue: &str) -> Result<String, QueueError> {
    let body = json!({
        "id": message.id,
        "task": message.task,
        "args": message.args,
        "kwargs": message.kwargs,
        "retries": message.retries,
        "eta": Value::Null,
    });
    let body = serde_json::to_vec(&body).map_err(|e| QueueError::Encode(e.to_string()))?;

    let envelope = Envelope {
        body: STANDARD.encode(body),
        headers: Map::new(),
        content_type: "application/json".to_string(),
        properties: Properties {
            body_encoding: "base64".to_string(),
            correlation_id: message.id.clone(),
            reply_to: uuid::Uuid::new_v4().to_string(),
            delivery_info: DeliveryInfo {
                priority: 0,
                routing_key: queue.to_string(),
                exchange: queue.to_string(),
            },
            delivery_mode: 2,
            delivery_tag: uuid::Uuid::new_v4().to_string(),
        },
        content_encoding: "utf-8".to_string(),
    };
    serde_json::to_string(&envelope).map_err(|e| QueueError::Encode(e.to_string()))
}

/// Decode a raw queue entry. When the message is unusable but still names its
/// task id, the error is `QueueError::Malformed` so the failure can be stored
/// against that id.
pub fn decode_task(raw: &str) -> Result<TaskMessage, QueueError> {
    parse_task(raw).map_err(|reason| match recover_task_id(raw) {
        Some(task_id) => QueueError::Malformed { task_id, reason },
        None => QueueError::Decode(reason),
    })
}

fn parse_task(raw: &str) -> Result<TaskMessage, String> {
    let envelope: Envelope = serde_json::from_str(raw).map_err(|e| format!("envelope: {e}"))?;
    let body = decode_body(&envelope.body, &envelope.properties.body_encoding)?;

    match envelope.headers.get("task").and_then(Value::as_str) {
        Some(task) => decode_v2(task, &envelope.headers, body),
        None => {
            serde_json::from_value::<TaskMessage>(body).map_err(|e| format!("task message: {e}"))
        }
    }
}

fn decode_body(body: &str, encoding: &str) -> Result<Value, String> {
    let bytes = if encoding == "base64" {
        STANDARD
            .decode(body.as_bytes())
            .map_err(|e| format!("body encoding: {e}"))?
    } else {
        body.as_bytes().to_vec()
    };
    serde_json::from_slice(&bytes).map_err(|e| format!("body: {e}"))
}

/// Best-effort id lookup: v2 `headers.id`, then the v1 body `id`, then the
/// correlation id set at publish time.
fn recover_task_id(raw: &str) -> Option<String> {
    fn non_empty(value: Option<&Value>) -> Option<String> {
        value
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    let envelope: Value = serde_json::from_str(raw).ok()?;

    non_empty(envelope.pointer("/headers/id"))
        .or_else(|| {
            let body = envelope.get("body").and_then(Value::as_str)?;
            let encoding = envelope
                .pointer("/properties/body_encoding")
                .and_then(Value::as_str)
                .unwrap_or_default();
            let body = decode_body(body, encoding).ok()?;
            non_empty(body.get("id"))
        })
        .or_else(|| non_empty(envelope.pointer("/properties/correlation_id")))
}

/// v2 keeps routing in the headers and the body is `[args, kwargs, embed]`.
fn decode_v2(
    task: &str,
    headers: &Map<String, Value>,
    body: Value,
) -> Result<TaskMessage, String> {
    let id = headers
        .get("id")
        .and_then(Value::as_str)
        .ok_or("v2 message without id header")?;

    let Value::Array(mut parts) = body else {
        return Err("v2 body must be an array".into());
    };
    parts.truncate(2);
    let mut parts = parts.into_iter();
    let args = match parts.next() {
        Some(Value::Array(args)) => args,
        _ => Vec::new(),
    };
    let kwargs: Kwargs = match parts.next() {
        Some(Value::Object(kwargs)) => kwargs,
        _ => Map::new(),
    };
    let retries = headers
        .get("retries")
        .and_then(Value::as_u64)
        .and_then(|r| u32::try_from(r).ok())
        .unwrap_or(0);

    Ok(TaskMessage {
        id: id.to_string(),
        task: task.to_string(),
        args,
        kwargs,
        retries,
    })
}
