use crate::util::preview;

use super::types::TaskResults;

const RESULT_STDOUT_PREVIEW: usize = 200;

/// Emit the per-batch summary and one line per target.
pub fn log_results(task_id: &str, results: &TaskResults) {
    tracing::info!(
        task_id = %task_id,
        kind = %results.kind(),
        "task completed: {}/{} targets succeeded",
        results.success_count(),
        results.len()
    );

    match results {
        TaskResults::Execution(items) => {
            for (i, r) in items.iter().enumerate() {
                tracing::info!(
                    "result[{}]: {} ({}) success={} exit_code={}",
                    i,
                    r.name,
                    r.host,
                    r.success,
                    r.exit_code
                );
                if !r.success {
                    if let Some(error) = &r.error {
                        tracing::warn!("result[{}] error: {}", i, error);
                    }
                    if !r.stderr.is_empty() {
                        tracing::warn!("result[{}] stderr: {}", i, r.stderr);
                    }
                }
                if !r.stdout.is_empty() {
                    tracing::debug!(
                        "result[{}] stdout: {}",
                        i,
                        preview(&r.stdout, RESULT_STDOUT_PREVIEW)
                    );
                }
            }
        }
        TaskResults::Upload(items) => {
            for (i, r) in items.iter().enumerate() {
                tracing::info!(
                    "upload result[{}]: {} ({}) success={} uploaded={} failed={}",
                    i,
                    r.name,
                    r.host,
                    r.success,
                    r.uploaded_files.len(),
                    r.failed_files.len()
                );
                if let (false, Some(error)) = (r.success, &r.error) {
                    tracing::warn!("upload result[{}] error: {}", i, error);
                }
            }
        }
    }
}
