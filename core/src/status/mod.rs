mod service;

pub use service::{StatusQueryService, TaskStatusReport};
