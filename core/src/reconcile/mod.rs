//! Engine output -> typed per-host results.

mod decode;
mod report;
mod types;

pub use decode::{
    decode_execution_record, decode_records, decode_upload_record, parse_engine_records,
    records_from_value, Record,
};
pub use report::log_results;
pub use types::{ExecutionResult, TaskResults, UploadResult, PARTIAL_FAILURE_PREFIX};
