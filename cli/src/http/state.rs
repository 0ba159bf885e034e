use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Local};
use hopq_core::api::{StatusQueryService, SubmissionService};

/// Shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub submit: SubmissionService,
    pub status: StatusQueryService,
    pub stats: Arc<RwLock<ServerStats>>,
}

impl AppState {
    pub fn new(submit: SubmissionService, status: StatusQueryService) -> Self {
        Self {
            submit,
            status,
            stats: Arc::new(RwLock::new(ServerStats::new())),
        }
    }

    pub fn record_request(&self, endpoint: &str) {
        let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());
        stats.increment_request(endpoint);
    }

    pub fn record_error(&self) {
        let mut stats = self.stats.write().unwrap_or_else(|e| e.into_inner());
        stats.increment_error();
    }
}

pub struct ServerStats {
    pub requests_total: u64,
    pub requests_by_endpoint: HashMap<String, u64>,
    pub errors_total: u64,
    pub start_time: DateTime<Local>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            requests_total: 0,
            requests_by_endpoint: HashMap::new(),
            errors_total: 0,
            start_time: Local::now(),
        }
    }

    pub fn increment_request(&mut self, endpoint: &str) {
        self.requests_total += 1;
        *self
            .requests_by_endpoint
            .entry(endpoint.to_string())
            .or_insert(0) += 1;
    }

    pub fn increment_error(&mut self) {
        self.errors_total += 1;
    }

    pub fn uptime_seconds(&self) -> f64 {
        (Local::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
