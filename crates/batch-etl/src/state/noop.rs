//! Repository that keeps nothing.
//!
//! Used when `job.record_history` is off. Every run gets id 1 unless the
//! caller supplies one.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tracing::warn;

use crate::error::Result;
use crate::pipeline::JobExecution;
use crate::state::backend::JobRepository;

/// No-op job repository.
pub struct NoOpJobRepository {
    warned: AtomicBool,
}

impl NoOpJobRepository {
    pub fn new() -> Self {
        Self {
            warned: AtomicBool::new(false),
        }
    }

    fn warn_once(&self) {
        if !self.warned.swap(true, Ordering::SeqCst) {
            warn!("Job history is disabled: executions will not be recorded");
        }
    }
}

impl Default for NoOpJobRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobRepository for NoOpJobRepository {
    async fn init_schema(&self) -> Result<()> {
        self.warn_once();
        Ok(())
    }

    async fn next_run_id(&self, _job_name: &str) -> Result<i64> {
        Ok(1)
    }

    async fn save(&self, _execution: &JobExecution) -> Result<()> {
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::JobParameters;

    #[tokio::test]
    async fn test_noop_always_allocates_first_run() {
        let repo = NoOpJobRepository::new();
        repo.init_schema().await.unwrap();
        assert_eq!(repo.next_run_id("importUserJob").await.unwrap(), 1);

        let execution = JobExecution::new("importUserJob", "step1", JobParameters::new(1));
        repo.save(&execution).await.unwrap();
        assert_eq!(repo.next_run_id("importUserJob").await.unwrap(), 1);
        assert_eq!(repo.backend_type(), "noop");
    }
}
