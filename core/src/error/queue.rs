use thiserror::Error;

use super::task::ValidationError;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("broker unavailable: {0}")]
    Unavailable(String),
    #[error("encode message: {0}")]
    Encode(String),
    #[error("decode message: {0}")]
    Decode(String),
    /// Undecodable message whose task id could still be read.
    #[error("malformed task message {task_id}: {reason}")]
    Malformed { task_id: String, reason: String },
    #[error("result backend error: {0}")]
    Backend(String),
}

/// Result-store lookup failure. `NotFound` and `Unavailable` are the expected
/// shape of an unfinished task; `Corrupt` means a stored payload exists but
/// cannot be read.
#[derive(Error, Debug)]
pub enum LookupError {
    #[error("result not available")]
    NotFound,
    #[error("result backend unavailable: {0}")]
    Unavailable(String),
    #[error("stored result is corrupt: {0}")]
    Corrupt(String),
}

#[derive(Error, Debug)]
pub enum StatusError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("decode stored result: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("submit task to queue: {0}")]
    Dispatch(#[source] QueueError),
}
