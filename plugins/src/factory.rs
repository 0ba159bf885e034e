use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};

use hopq_core::api::{
    AppConfig, BridgeSettings, EngineRunner, MemoryQueue, ProcessBridge, ResultBackend, TaskBroker,
};

use crate::queue::{RedisBackend, RedisBroker};
use crate::runner::ScriptEngine;

pub const MEMORY_URL: &str = "memory://";

/// Broker and result backend pair.
#[derive(Clone)]
pub struct Substrate {
    pub broker: Arc<dyn TaskBroker>,
    pub backend: Arc<dyn ResultBackend>,
}

pub fn build_engine(_cfg: &AppConfig) -> Arc<dyn EngineRunner> {
    Arc::new(ScriptEngine::new())
}

pub fn build_bridge(cfg: &AppConfig) -> ProcessBridge {
    ProcessBridge::new(build_engine(cfg), BridgeSettings::from_config(&cfg.executor))
}

fn is_memory(url: &str) -> bool {
    url.trim() == MEMORY_URL
}

fn is_redis(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("redis://") || url.starts_with("rediss://")
}

pub async fn build_substrate(cfg: &AppConfig) -> Result<Substrate> {
    cfg.queue.ensure_substrate()?;
    let broker_url = cfg.queue.broker.trim();
    let backend_url = cfg.queue.backend.trim();
    let expires = Duration::from_secs(cfg.queue.result_expires_secs.max(1));

    // One in-process queue serves both roles so results land where status reads them.
    let memory = Arc::new(MemoryQueue::with_result_ttl(expires));

    let broker: Arc<dyn TaskBroker> = if is_memory(broker_url) {
        memory.clone()
    } else if is_redis(broker_url) {
        Arc::new(RedisBroker::connect(broker_url, &cfg.queue.queue_name).await?)
    } else {
        bail!("unsupported broker url: {}", broker_url);
    };

    let backend: Arc<dyn ResultBackend> = if is_memory(backend_url) {
        memory
    } else if is_redis(backend_url) {
        Arc::new(RedisBackend::connect(backend_url, expires).await?)
    } else {
        bail!("unsupported result backend url: {}", backend_url);
    };

    Ok(Substrate { broker, backend })
}
