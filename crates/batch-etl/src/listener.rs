//! Job lifecycle listeners.
//!
//! Listeners observe a job run; they cannot change its outcome. `after_job`
//! is called exactly once per run with the terminal status.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tracing::{error, info, warn};

use crate::drivers::count_rows;
use crate::pipeline::{BatchStatus, JobExecution};

/// Callbacks around a job run.
#[async_trait]
pub trait JobListener: Send + Sync {
    /// Called before the step starts.
    async fn before_job(&self, _execution: &JobExecution) {}

    /// Called once the run has reached a terminal status.
    async fn after_job(&self, execution: &JobExecution);
}

/// Reports job start and outcome through `tracing`.
#[derive(Debug, Default)]
pub struct LoggingListener;

#[async_trait]
impl JobListener for LoggingListener {
    async fn before_job(&self, execution: &JobExecution) {
        info!(
            "Job '{}' starting (run {})",
            execution.job_name, execution.run_id
        );
    }

    async fn after_job(&self, execution: &JobExecution) {
        let step = &execution.step;
        match execution.status {
            BatchStatus::Completed => info!(
                "Job '{}' (run {}) COMPLETED in {:.2}s: read={}, written={}, commits={}, absent={}",
                execution.job_name,
                execution.run_id,
                execution.duration_seconds(),
                step.read_count,
                step.write_count,
                step.commit_count,
                step.absent_count
            ),
            BatchStatus::Failed => error!(
                "Job '{}' (run {}) FAILED after {} commits ({} rows): {}",
                execution.job_name,
                execution.run_id,
                step.commit_count,
                step.write_count,
                execution.exit_description.as_deref().unwrap_or("unknown error")
            ),
            other => warn!(
                "Job '{}' (run {}) ended with non-terminal status {}",
                execution.job_name,
                execution.run_id,
                other.as_str()
            ),
        }
    }
}

/// After a completed run, counts the rows present in the destination table.
pub struct CompletionNotificationListener {
    pool: Pool,
    target_table: String,
}

impl CompletionNotificationListener {
    /// `target_table` must already be validated as a plain identifier.
    pub fn new(pool: Pool, target_table: impl Into<String>) -> Self {
        Self {
            pool,
            target_table: target_table.into(),
        }
    }
}

#[async_trait]
impl JobListener for CompletionNotificationListener {
    async fn after_job(&self, execution: &JobExecution) {
        if execution.status != BatchStatus::Completed {
            return;
        }
        info!("Job finished, verifying destination table {}", self.target_table);
        match count_rows(&self.pool, &self.target_table).await {
            Ok(count) => info!(
                "Destination table {} holds {} rows ({} written by run {})",
                self.target_table, count, execution.step.write_count, execution.run_id
            ),
            Err(e) => warn!(
                "Could not count rows in {}: {}",
                self.target_table, e
            ),
        }
    }
}
