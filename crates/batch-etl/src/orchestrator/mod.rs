//! Job launcher: wires pools, reader, processor, writer, listeners and the
//! job repository from a [`Config`].

use std::sync::Arc;
use std::time::Instant;

use deadpool_postgres::Pool;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Config;
use crate::core::{ItemProcessor, ItemReader, ItemWriter};
use crate::drivers::{build_pool, count_rows, test_connection, PostgresReader, PostgresWriter};
use crate::error::{EtlError, Result};
use crate::listener::{CompletionNotificationListener, JobListener, LoggingListener};
use crate::pipeline::{ChunkStep, Job, JobExecution, JobParameters};
use crate::processor::RecordProcessor;
use crate::state::{JobRepository, NoOpJobRepository, PgJobRepository};

/// The import job, ready to run against configured databases.
pub struct EtlJob {
    config: Config,
    source: Pool,
    target: Pool,
    repository: Arc<dyn JobRepository>,
    listeners: Vec<Arc<dyn JobListener>>,
}

/// Result of a connectivity check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub source_connected: bool,
    pub source_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_error: Option<String>,
    pub target_connected: bool,
    pub target_latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_error: Option<String>,
    pub healthy: bool,
}

/// Row counts of the source and destination tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub source_table: String,
    pub source_rows: i64,
    pub target_table: String,
    pub target_rows: i64,
    pub matches: bool,
}

impl EtlJob {
    /// Build the pools and repository. No connection is opened yet.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let source = build_pool(&config.source, "source")?;
        let target = match &config.target {
            Some(target) => build_pool(target, "target")?,
            None => source.clone(),
        };

        let repository: Arc<dyn JobRepository> = if config.job.record_history {
            Arc::new(PgJobRepository::new(target.clone(), config.fingerprint()))
        } else {
            Arc::new(NoOpJobRepository::new())
        };

        Ok(Self {
            config,
            source,
            target,
            repository,
            listeners: Vec::new(),
        })
    }

    /// Override the configured chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(EtlError::Config("chunk size must be at least 1".into()));
        }
        self.config.job.chunk_size = chunk_size;
        Ok(self)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Attach a listener notified after the built-in ones.
    pub fn with_listener(mut self, listener: Arc<dyn JobListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Run the job once.
    ///
    /// Without `run_id` the repository allocates the next id. A failed run
    /// is returned as `Ok` with [`BatchStatus::Failed`](crate::BatchStatus);
    /// use [`JobExecution::into_result`] to turn it into an error.
    pub async fn run(&self, run_id: Option<i64>) -> Result<JobExecution> {
        let job_config = &self.config.job;
        let run_id = self.allocate_run_id(run_id).await;

        let step = ChunkStep::new(
            &job_config.step_name,
            job_config.chunk_size,
            PostgresReader::new(self.source.clone(), &job_config.source_table),
            RecordProcessor::new(),
            PostgresWriter::new(self.target.clone(), &job_config.target_table),
        );
        Ok(self.launch(run_id, step).await)
    }

    /// Prepare the history store and pick the run id.
    ///
    /// History is bookkeeping only: repository failures are logged and the
    /// run falls back to the supplied id, or 1.
    async fn allocate_run_id(&self, run_id: Option<i64>) -> i64 {
        if let Err(e) = self.repository.init_schema().await {
            warn!(
                "Job history ({}) unavailable: {}",
                self.repository.backend_type(),
                e
            );
        }
        match run_id {
            Some(id) => id,
            None => match self.repository.next_run_id(&self.config.job.name).await {
                Ok(id) => id,
                Err(e) => {
                    warn!("Could not allocate run id from job history, using 1: {}", e);
                    1
                }
            },
        }
    }

    async fn launch<R, P, W>(&self, run_id: i64, step: ChunkStep<R, P, W>) -> JobExecution
    where
        R: ItemReader,
        P: ItemProcessor,
        W: ItemWriter,
    {
        let job_config = &self.config.job;
        info!(
            "Launching job '{}' run {} (chunk size {}, history: {})",
            job_config.name,
            run_id,
            step.chunk_size(),
            self.repository.backend_type()
        );

        let execution = {
            let mut job = Job::new(&job_config.name, step)
                .with_listener(Arc::new(LoggingListener))
                .with_listener(Arc::new(CompletionNotificationListener::new(
                    self.target.clone(),
                    &job_config.target_table,
                )));
            for listener in &self.listeners {
                job = job.with_listener(listener.clone());
            }
            job.run(JobParameters::new(run_id)).await
        };

        if let Err(e) = self.repository.save(&execution).await {
            warn!("Failed to record execution of run {}: {}", run_id, e);
        }

        execution
    }

    /// Check connectivity to both databases.
    pub async fn health_check(&self) -> Result<HealthCheckResult> {
        let (source_connected, source_latency_ms, source_error) = probe(&self.source).await;
        let (target_connected, target_latency_ms, target_error) = probe(&self.target).await;

        Ok(HealthCheckResult {
            source_connected,
            source_latency_ms,
            source_error,
            target_connected,
            target_latency_ms,
            target_error,
            healthy: source_connected && target_connected,
        })
    }

    /// Compare row counts between the source and destination tables.
    pub async fn validate(&self) -> Result<ValidationResult> {
        let job_config = &self.config.job;
        let source_rows = count_rows(&self.source, &job_config.source_table).await?;
        let target_rows = count_rows(&self.target, &job_config.target_table).await?;
        let matches = source_rows == target_rows;

        if matches {
            info!(
                "{} -> {}: {} rows (match)",
                job_config.source_table, job_config.target_table, source_rows
            );
        } else {
            warn!(
                "{} -> {}: source={} target={} (MISMATCH)",
                job_config.source_table, job_config.target_table, source_rows, target_rows
            );
        }

        Ok(ValidationResult {
            source_table: job_config.source_table.clone(),
            source_rows,
            target_table: job_config.target_table.clone(),
            target_rows,
            matches,
        })
    }
}

async fn probe(pool: &Pool) -> (bool, u64, Option<String>) {
    let start = Instant::now();
    let outcome = test_connection(pool).await;
    let latency = start.elapsed().as_millis() as u64;
    match outcome {
        Ok(()) => (true, latency, None),
        Err(e) => (false, latency, Some(e.to_string())),
    }
}

impl HealthCheckResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ValidationResult {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
