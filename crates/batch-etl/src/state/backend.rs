//! Job repository trait.
//!
//! A [`JobRepository`] records job executions for bookkeeping and hands out
//! run ids. The launcher works with `Arc<dyn JobRepository>` and never reads
//! previous executions back to resume a run.

use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::JobExecution;

/// Persistence for job executions.
///
/// Implementations must be `Send + Sync` to allow sharing across async tasks.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Create the storage structures. Safe to call more than once.
    async fn init_schema(&self) -> Result<()>;

    /// Allocate the run id for the next execution of `job_name`: one past
    /// the highest id recorded so far, or 1 for a job never run.
    async fn next_run_id(&self, job_name: &str) -> Result<i64>;

    /// Insert or update the record for `(job_name, run_id)`.
    async fn save(&self, execution: &JobExecution) -> Result<()>;

    /// Backend name for logging.
    fn backend_type(&self) -> &'static str;
}
