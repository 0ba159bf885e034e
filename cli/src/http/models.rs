use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hopq_core::api::{StatusError, SubmitError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub task_id: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors_total: u64,
    pub requests_by_endpoint: BTreeMap<String, u64>,
    pub timestamp: String,
}

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    Queue(String),
    Internal(String),
}

impl From<SubmitError> for HttpServerError {
    fn from(e: SubmitError) -> Self {
        match e {
            SubmitError::Validation(v) => Self::InvalidRequest(v.to_string()),
            dispatch @ SubmitError::Dispatch(_) => Self::Queue(dispatch.to_string()),
        }
    }
}

impl From<StatusError> for HttpServerError {
    fn from(e: StatusError) -> Self {
        match e {
            StatusError::InvalidRequest(msg) => Self::InvalidRequest(msg),
            decode @ StatusError::Decode(_) => Self::Internal(decode.to_string()),
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            Self::Queue(msg) => (StatusCode::BAD_GATEWAY, "QUEUE_ERROR", msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
        };

        let body = serde_json::json!({
            "success": false,
            "error": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hopq_core::api::{QueueError, ValidationError};

    #[test]
    fn status_request_tolerates_missing_id() {
        let req: StatusRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.task_id, "");
    }

    #[test]
    fn submit_errors_map_to_status_codes() {
        let invalid: HttpServerError =
            SubmitError::Validation(ValidationError::ProxyIncomplete).into();
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let down: HttpServerError =
            SubmitError::Dispatch(QueueError::Unavailable("refused".into())).into();
        assert_eq!(down.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn decode_failure_is_internal() {
        let err: HttpServerError = StatusError::Decode("bad".into()).into();
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
