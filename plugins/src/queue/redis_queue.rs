//! Redis broker and result backend speaking the Celery wire format.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;

use hopq_core::api::{
    Kwargs, LookupError, QueueError, ResultBackend, ResultMessage, TaskBroker, TaskHandle,
    TaskMessage,
};

use super::celery::{decode_task, encode_task, result_key};

async fn connect(url: &str) -> Result<ConnectionManager, QueueError> {
    let client = redis::Client::open(url).map_err(|e| {
        QueueError::Unavailable(format!("invalid redis url {}: {}", redact_url(url), e))
    })?;
    ConnectionManager::new(client).await.map_err(|e| {
        QueueError::Unavailable(format!("failed to connect to {}: {}", redact_url(url), e))
    })
}

/// LPUSH / BRPOP on a single list. Blocking pops get their own connection so
/// submissions from the same process are not queued behind them.
#[derive(Clone)]
pub struct RedisBroker {
    push_conn: ConnectionManager,
    pop_conn: ConnectionManager,
    queue: String,
}

impl std::fmt::Debug for RedisBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBroker")
            .field("queue", &self.queue)
            .finish()
    }
}

impl RedisBroker {
    pub async fn connect(url: &str, queue: &str) -> Result<Self, QueueError> {
        let push_conn = connect(url).await?;
        let pop_conn = connect(url).await?;
        tracing::info!(url = %redact_url(url), queue = %queue, "connected to broker");
        Ok(Self {
            push_conn,
            pop_conn,
            queue: queue.to_string(),
        })
    }
}

#[async_trait]
impl TaskBroker for RedisBroker {
    fn name(&self) -> &str {
        "redis"
    }

    async fn submit(&self, task: &str, kwargs: Kwargs) -> Result<TaskHandle, QueueError> {
        let handle = TaskHandle::generate();
        let raw = encode_task(&TaskMessage::new(&handle, task, kwargs), &self.queue)?;

        let mut conn = self.push_conn.clone();
        redis::cmd("LPUSH")
            .arg(&self.queue)
            .arg(raw)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| QueueError::Unavailable(format!("redis LPUSH failed: {e}")))?;

        tracing::debug!(task_id = %handle, task = %task, "task pushed");
        Ok(handle)
    }

    async fn fetch(&self, wait: Duration) -> Result<Option<TaskMessage>, QueueError> {
        let mut conn = self.pop_conn.clone();
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.queue)
            .arg(wait.as_secs().max(1))
            .query_async(&mut conn)
            .await
            .map_err(|e| QueueError::Unavailable(format!("redis BRPOP failed: {e}")))?;

        match popped {
            Some((_, raw)) => decode_task(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// BRPOP takes from the tail, so RPUSH puts the message back in front.
    async fn requeue(&self, message: TaskMessage) -> Result<(), QueueError> {
        let raw = encode_task(&message, &self.queue)?;
        let mut conn = self.push_conn.clone();
        redis::cmd("RPUSH")
            .arg(&self.queue)
            .arg(raw)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| QueueError::Unavailable(format!("redis RPUSH failed: {e}")))?;

        tracing::debug!(task_id = %message.id, "task returned to queue");
        Ok(())
    }
}

/// Results under `celery-task-meta-<id>`, expiring after `expires`.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    expires: Duration,
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("expires", &self.expires)
            .finish()
    }
}

impl RedisBackend {
    pub async fn connect(url: &str, expires: Duration) -> Result<Self, QueueError> {
        let conn = connect(url).await?;
        tracing::info!(url = %redact_url(url), "connected to result backend");
        Ok(Self { conn, expires })
    }
}

#[async_trait]
impl ResultBackend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    async fn store(&self, handle: &TaskHandle, result: &ResultMessage) -> Result<(), QueueError> {
        let payload = serde_json::to_string(result).map_err(|e| QueueError::Encode(e.to_string()))?;
        let mut conn = self.conn.clone();
        redis::cmd("SETEX")
            .arg(result_key(handle.as_str()))
            .arg(self.expires.as_secs().max(1))
            .arg(payload)
            .query_async::<()>(&mut conn)
            .await
            .map_err(|e| QueueError::Backend(format!("redis SETEX failed: {e}")))?;
        Ok(())
    }

    async fn get(&self, handle: &TaskHandle) -> Result<ResultMessage, LookupError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = redis::cmd("GET")
            .arg(result_key(handle.as_str()))
            .query_async(&mut conn)
            .await
            .map_err(|e| LookupError::Unavailable(format!("redis GET failed: {e}")))?;

        let raw = raw.ok_or(LookupError::NotFound)?;
        serde_json::from_str(&raw).map_err(|e| LookupError::Corrupt(e.to_string()))
    }
}

/// Redact the password from a Redis URL for logging.
pub fn redact_url(url: &str) -> String {
    if let Some(at_pos) = url.find('@') {
        if let Some(colon_pos) = url[..at_pos].rfind(':') {
            let scheme_end = url.find("://").map(|p| p + 2).unwrap_or(0);
            if colon_pos > scheme_end {
                return format!("{}***{}", &url[..=colon_pos], &url[at_pos..]);
            }
        }
    }
    url.to_string()
}
