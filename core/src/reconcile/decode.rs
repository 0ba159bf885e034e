use serde_json::{Map, Value};

use crate::error::ReconcileError;
use crate::payload::TaskKind;

use super::types::{ExecutionResult, TaskResults, UploadResult};

/// One loosely-typed result record as emitted by the engine.
pub type Record = Map<String, Value>;

/// Parse raw engine stdout. Anything other than a non-empty JSON array of
/// objects is an error.
pub fn parse_engine_records(stdout: &[u8]) -> Result<Vec<Record>, ReconcileError> {
    let value: Value = serde_json::from_slice(stdout)?;
    let records = records_from_value(value)?;
    if records.is_empty() {
        return Err(ReconcileError::Empty);
    }
    Ok(records)
}

pub fn records_from_value(value: Value) -> Result<Vec<Record>, ReconcileError> {
    let Value::Array(items) = value else {
        return Err(ReconcileError::NotArray);
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(record) => Ok(record),
            _ => Err(ReconcileError::RecordNotObject { index }),
        })
        .collect()
}

fn str_field(record: &Record, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn error_field(record: &Record) -> Option<String> {
    record
        .get("error")
        .and_then(Value::as_str)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
}

fn exit_code_field(record: &Record) -> i64 {
    match record.get("exit_code") {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Remote paths from a file list. Engine entries are `{local, remote, ...}`
/// records; plain strings (our own stored results) are taken as-is.
fn file_list(record: &Record, key: &str) -> Vec<String> {
    let Some(Value::Array(entries)) = record.get(key) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(file) => file.get("remote").and_then(Value::as_str),
            Value::String(remote) => Some(remote.as_str()),
            _ => None,
        })
        .map(str::to_string)
        .collect()
}

pub fn decode_execution_record(record: &Record) -> ExecutionResult {
    ExecutionResult {
        name: str_field(record, "name"),
        host: str_field(record, "host"),
        success: record
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        stdout: str_field(record, "stdout"),
        stderr: str_field(record, "stderr"),
        exit_code: exit_code_field(record),
        error: error_field(record),
    }
}

pub fn decode_upload_record(record: &Record) -> UploadResult {
    UploadResult {
        name: str_field(record, "name"),
        host: str_field(record, "host"),
        success: record
            .get("success")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        uploaded_files: file_list(record, "uploaded_files"),
        failed_files: file_list(record, "failed_files"),
        error: error_field(record),
    }
}

pub fn decode_records(kind: TaskKind, records: &[Record]) -> TaskResults {
    match kind {
        TaskKind::Command => {
            TaskResults::Execution(records.iter().map(decode_execution_record).collect())
        }
        TaskKind::Upload => TaskResults::Upload(records.iter().map(decode_upload_record).collect()),
    }
}
