//! Job and step execution records.
//!
//! A [`JobExecution`] is created per run, updated by the step runner, and
//! handed to listeners and the job repository once the run ends.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EtlError, Result};

/// Lifecycle status of a job execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Starting,
    Started,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Starting => "starting",
            BatchStatus::Started => "started",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "starting" => Ok(BatchStatus::Starting),
            "started" => Ok(BatchStatus::Started),
            "completed" => Ok(BatchStatus::Completed),
            "failed" => Ok(BatchStatus::Failed),
            _ => Err(EtlError::State(format!("Invalid batch status: {}", s))),
        }
    }

    /// Whether the execution has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }
}

/// Parameters identifying one run of a job.
///
/// The run id distinguishes executions for bookkeeping only; the chunk
/// loop never reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameters {
    pub run_id: i64,
}

impl JobParameters {
    pub fn new(run_id: i64) -> Self {
        Self { run_id }
    }
}

/// Counters for one step run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepExecution {
    pub step_name: String,
    /// Records materialized by the reader.
    pub read_count: u64,
    /// Reads that yielded nothing but were not end of stream.
    pub absent_count: u64,
    /// Rows committed by the writer.
    pub write_count: u64,
    /// Chunks committed.
    pub commit_count: u64,
    /// Chunks abandoned by a failure.
    pub rollback_count: u64,
    /// Size of each committed chunk, in commit order.
    pub chunk_sizes: Vec<usize>,
}

impl StepExecution {
    pub fn new(step_name: impl Into<String>) -> Self {
        Self {
            step_name: step_name.into(),
            ..Default::default()
        }
    }
}

/// Record of a single job run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobExecution {
    pub job_name: String,
    pub run_id: i64,
    pub status: BatchStatus,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub step: StepExecution,
    /// Failure description for failed runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_description: Option<String>,
}

impl JobExecution {
    pub fn new(job_name: impl Into<String>, step_name: impl Into<String>, params: JobParameters) -> Self {
        Self {
            job_name: job_name.into(),
            run_id: params.run_id,
            status: BatchStatus::Starting,
            started_at: Utc::now(),
            ended_at: None,
            step: StepExecution::new(step_name),
            exit_description: None,
        }
    }

    pub fn mark_started(&mut self) {
        self.status = BatchStatus::Started;
        self.started_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.status = BatchStatus::Completed;
        self.ended_at = Some(Utc::now());
        self.exit_description = None;
    }

    pub fn mark_failed(&mut self, error: &EtlError) {
        self.status = BatchStatus::Failed;
        self.ended_at = Some(Utc::now());
        self.exit_description = Some(error.to_string());
    }

    pub fn is_success(&self) -> bool {
        self.status == BatchStatus::Completed
    }

    /// Wall-clock duration, or zero while the run is in progress.
    pub fn duration_seconds(&self) -> f64 {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    /// Convert a failed execution into an error for the caller.
    pub fn into_result(self) -> Result<Self> {
        match self.status {
            BatchStatus::Failed => Err(EtlError::JobFailed {
                job: self.job_name,
                run_id: self.run_id,
                message: self.exit_description.unwrap_or_default(),
            }),
            _ => Ok(self),
        }
    }

    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
