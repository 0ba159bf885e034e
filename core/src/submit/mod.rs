mod service;

pub use service::{SubmissionService, SubmitReceipt};
