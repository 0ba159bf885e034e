#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hopq_core::api::{
    AppConfig, EngineInvocation, EngineLaunchError, EngineOutput, EngineRunner, MemoryQueue,
};
use serde_json::{json, Value};
use tokio::sync::Semaphore;

/// Engine stand-in that echoes one successful record per `--targets` entry.
/// When gated, every run blocks until `release` hands out a permit.
pub struct FakeEngine {
    gate: Option<Arc<Semaphore>>,
    exit_code: i32,
    pub calls: AtomicUsize,
    running: AtomicUsize,
    pub peak: AtomicUsize,
}

impl FakeEngine {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::build(None, 0))
    }

    pub fn gated() -> Arc<Self> {
        Arc::new(Self::build(Some(Arc::new(Semaphore::new(0))), 0))
    }

    pub fn exiting(code: i32) -> Arc<Self> {
        Arc::new(Self::build(None, code))
    }

    fn build(gate: Option<Arc<Semaphore>>, exit_code: i32) -> Self {
        Self {
            gate,
            exit_code,
            calls: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EngineRunner for FakeEngine {
    fn name(&self) -> &str {
        "fake"
    }

    async fn run(&self, invocation: &EngineInvocation) -> Result<EngineOutput, EngineLaunchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        } else {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        let pos = invocation
            .args
            .iter()
            .position(|a| a == "--targets")
            .expect("targets flag");
        let targets: Vec<Value> = serde_json::from_str(&invocation.args[pos + 1]).unwrap();
        let records: Vec<Value> = targets
            .iter()
            .map(|t| {
                json!({
                    "name": t["name"],
                    "host": t["host"],
                    "success": true,
                    "stdout": "ok\n",
                    "stderr": "",
                    "exit_code": 0
                })
            })
            .collect();

        Ok(EngineOutput {
            exit_code: Some(self.exit_code),
            stdout: serde_json::to_vec(&records).unwrap(),
            stderr: Vec::new(),
        })
    }
}

pub fn memory_config(workers: usize) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.queue.broker = "memory://".into();
    cfg.queue.backend = "memory://".into();
    cfg.queue.workers = workers;
    cfg.queue.poll_interval_ms = 10;
    cfg
}

pub fn command_payload(targets: usize) -> Value {
    let targets: Vec<Value> = (0..targets)
        .map(|i| {
            json!({
                "name": format!("h{i}"),
                "host": format!("10.0.0.{}", i + 1),
                "port": 22,
                "user": "root",
                "password": "secret"
            })
        })
        .collect();
    json!({
        "proxy_host": "bastion.example",
        "proxy_port": 22,
        "proxy_user": "ops",
        "proxy_password": "pw",
        "targets": targets,
        "commands": ["uptime"],
        "timeout": 30
    })
}

pub async fn wait_until<F: Fn() -> bool>(what: &str, cond: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub async fn wait_for_stored(queue: &MemoryQueue, n: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while queue.stored().await < n {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {n} stored results");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
