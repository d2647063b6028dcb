//! # batch-etl
//!
//! Chunk-oriented import job between two PostgreSQL tables.
//!
//! The job streams rows from a source table through a cursor, turns each
//! record into a destination record (joined full name plus a fresh 5-digit
//! tag) and inserts them in chunks, one transaction per chunk:
//!
//! - **Chunked commits** with a configurable chunk size (default 5)
//! - **Lifecycle listeners** notified once with the terminal status
//! - **Job history** recorded in the target database
//!
//! ## Example
//!
//! ```rust,no_run
//! use batch_etl::{Config, EtlJob};
//!
//! #[tokio::main]
//! async fn main() -> batch_etl::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let job = EtlJob::new(config).await?;
//!     let execution = job.run(None).await?.into_result()?;
//!     println!("Wrote {} rows", execution.step.write_count);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod listener;
pub mod orchestrator;
pub mod pipeline;
pub mod processor;
pub mod state;

pub use config::{Config, DatabaseConfig, JobConfig};
pub use crate::core::{DestinationRecord, ItemProcessor, ItemReader, ItemWriter, ReadOutcome, SourceRecord};
pub use error::{EtlError, Result};
pub use listener::{CompletionNotificationListener, JobListener, LoggingListener};
pub use orchestrator::{EtlJob, HealthCheckResult, ValidationResult};
pub use pipeline::{BatchStatus, ChunkStep, Job, JobExecution, JobParameters, StepExecution};
pub use processor::{RandomTagGenerator, RecordProcessor, TagGenerator};
pub use state::{JobRepository, NoOpJobRepository, PgJobRepository};
