use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use hopq_core::api::{SubmitReceipt, TaskKind, TaskStatusReport};
use serde_json::Value;

use super::models::{HealthResponse, HttpServerError, StatusRequest};
use super::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/ssh/execute", post(execute_ssh_handler))
        .route("/api/v1/upload/execute", post(execute_upload_handler))
        .route("/api/v1/ssh/status", post(ssh_status_handler))
        .route("/api/v1/upload/status", post(upload_status_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

async fn submit(
    state: &AppState,
    endpoint: &str,
    kind: TaskKind,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitReceipt>, HttpServerError> {
    state.record_request(endpoint);

    let result = match body {
        Ok(Json(payload)) => state
            .submit
            .submit(kind, &payload)
            .await
            .map_err(HttpServerError::from),
        Err(rejection) => Err(HttpServerError::InvalidRequest(rejection.body_text())),
    };
    if result.is_err() {
        state.record_error();
    }
    result.map(Json)
}

async fn query(
    state: &AppState,
    endpoint: &str,
    kind: TaskKind,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<TaskStatusReport>, HttpServerError> {
    state.record_request(endpoint);

    let result = match body {
        Ok(Json(req)) => state
            .status
            .query(kind, &req.task_id)
            .await
            .map_err(HttpServerError::from),
        Err(rejection) => Err(HttpServerError::InvalidRequest(rejection.body_text())),
    };
    if result.is_err() {
        state.record_error();
    }
    result.map(Json)
}

/// POST /api/v1/ssh/execute
async fn execute_ssh_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitReceipt>, HttpServerError> {
    submit(&state, "/api/v1/ssh/execute", TaskKind::Command, body).await
}

/// POST /api/v1/upload/execute
async fn execute_upload_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SubmitReceipt>, HttpServerError> {
    submit(&state, "/api/v1/upload/execute", TaskKind::Upload, body).await
}

/// POST /api/v1/ssh/status
async fn ssh_status_handler(
    State(state): State<AppState>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<TaskStatusReport>, HttpServerError> {
    query(&state, "/api/v1/ssh/status", TaskKind::Command, body).await
}

/// POST /api/v1/upload/status
async fn upload_status_handler(
    State(state): State<AppState>,
    body: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<TaskStatusReport>, HttpServerError> {
    query(&state, "/api/v1/upload/status", TaskKind::Upload, body).await
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    state.record_request("/health");
    let stats = state.stats.read().unwrap_or_else(|e| e.into_inner());

    Json(HealthResponse {
        status: "healthy".into(),
        uptime_seconds: stats.uptime_seconds(),
        requests_handled: stats.requests_total,
        errors_total: stats.errors_total,
        requests_by_endpoint: stats
            .requests_by_endpoint
            .iter()
            .map(|(endpoint, count)| (endpoint.clone(), *count))
            .collect(),
        timestamp: Local::now().to_rfc3339(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use hopq_core::api::{
        MemoryQueue, QueueConfig, ResultBackend, ResultMessage, StatusQueryService,
        SubmissionService, TaskBroker, TaskHandle,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> (Router, Arc<MemoryQueue>) {
        let queue = Arc::new(MemoryQueue::new());
        let state = AppState::new(
            SubmissionService::new(queue.clone(), QueueConfig::default(), 120),
            StatusQueryService::new(queue.clone()),
        );
        (create_router(state), queue)
    }

    async fn post(router: Router, uri: &str, body: String) -> (StatusCode, Value) {
        let response = router
            .oneshot(
                Request::post(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn ssh_payload() -> Value {
        json!({
            "proxy_host": "bastion",
            "proxy_port": 22,
            "proxy_user": "ops",
            "proxy_password": "pw",
            "targets": [{"name": "h1", "host": "10.0.0.1", "port": 22, "user": "root", "password": "x"}],
            "commands": ["uptime"]
        })
    }

    #[tokio::test]
    async fn execute_returns_pending_receipt() {
        let (router, queue) = app();
        let (status, body) = post(router, "/api/v1/ssh/execute", ssh_payload().to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "PENDING");
        let message = queue.fetch(Duration::from_millis(10)).await.unwrap().unwrap();
        assert_eq!(body["task_id"], message.id.as_str());
    }

    #[tokio::test]
    async fn invalid_payload_is_400_and_not_enqueued() {
        let (router, queue) = app();
        let mut payload = ssh_payload();
        payload["proxy_password"] = json!("");
        let (status, body) = post(router, "/api/v1/ssh/execute", payload.to_string()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "proxy credentials are required");
        assert_eq!(body["error_code"], "INVALID_REQUEST");
        assert!(queue.is_empty().await);
    }

    #[tokio::test]
    async fn malformed_json_is_400() {
        let (router, _) = app();
        let (status, body) = post(router, "/api/v1/upload/execute", "{not json".into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "INVALID_REQUEST");
    }

    #[tokio::test]
    async fn status_of_unknown_task_is_pending() {
        let (router, _) = app();
        let (status, body) =
            post(router, "/api/v1/ssh/status", json!({"task_id": "nope"}).to_string()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "PENDING");
        assert_eq!(body["error"], "result not available");
        assert!(body.get("results").is_none());
    }

    #[tokio::test]
    async fn status_without_task_id_is_400() {
        let (router, _) = app();
        let (status, body) = post(router, "/api/v1/upload/status", "{}".into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "task_id is required");
    }

    #[tokio::test]
    async fn upload_status_reports_results() {
        let (router, queue) = app();
        let handle = TaskHandle::from("u1");
        queue
            .store(
                &handle,
                &ResultMessage::success(
                    "u1",
                    json!([{"name": "h1", "host": "a", "success": true, "uploaded_files": ["/opt/x"], "failed_files": []}]),
                ),
            )
            .await
            .unwrap();

        let (status, body) =
            post(router, "/api/v1/upload/status", json!({"task_id": "u1"}).to_string()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "SUCCESS");
        assert_eq!(body["results"][0]["uploaded_files"][0], "/opt/x");
    }

    #[tokio::test]
    async fn health_reports_request_count() {
        let (router, _) = app();
        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["requests_handled"], 1);
    }

    #[tokio::test]
    async fn health_breaks_down_requests_and_errors() {
        let (router, _) = app();
        let (status, _) = post(router.clone(), "/api/v1/ssh/execute", "{}".into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        post(router.clone(), "/api/v1/ssh/execute", ssh_payload().to_string()).await;

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["requests_handled"], 3);
        assert_eq!(body["errors_total"], 1);
        assert_eq!(body["requests_by_endpoint"]["/api/v1/ssh/execute"], 2);
        assert_eq!(body["requests_by_endpoint"]["/health"], 1);
    }
}
