pub mod celery;
pub mod redis_queue;

pub use redis_queue::{redact_url, RedisBackend, RedisBroker};
