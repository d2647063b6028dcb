//! Error types for the batch ETL library.

use std::fmt;

use thiserror::Error;

/// Exit code for configuration errors (invalid YAML, missing fields).
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for database connection and query errors.
pub const EXIT_DATABASE_ERROR: u8 = 2;
/// Exit code for a job that ran and ended in failure.
pub const EXIT_JOB_FAILED: u8 = 3;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;

/// Main error type for ETL operations.
#[derive(Error, Debug)]
pub enum EtlError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection or query error
    #[error("Database error: {}", pg_cause(.0))]
    Database(#[from] tokio_postgres::Error),

    /// Connection checkout failed
    #[error("Pool error: {0}")]
    PoolCheckout(#[from] deadpool_postgres::PoolError),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A source row could not be materialized into a record
    #[error("Read failed: {0}")]
    Read(String),

    /// A required source field was NULL
    #[error("Record {id}: field '{field}' is null")]
    MissingField { id: i64, field: &'static str },

    /// Transformation of a record failed
    #[error("Transform failed for record {id}: {message}")]
    Transform { id: i64, message: String },

    /// Batch insert for a chunk failed
    #[error("Write failed for chunk {chunk}: {message}")]
    Write {
        chunk: u64,
        message: String,
        #[source]
        source: Option<tokio_postgres::Error>,
    },

    /// The job ran and ended with a failed status
    #[error("Job '{job}' (run {run_id}) failed: {message}")]
    JobFailed {
        job: String,
        run_id: i64,
        message: String,
    },

    /// Job repository error
    #[error("Job repository error: {0}")]
    State(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EtlError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl ToString, context: impl Into<String>) -> Self {
        EtlError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a Write error for the given chunk number
    pub fn write(chunk: u64, message: impl Into<String>) -> Self {
        EtlError::Write {
            chunk,
            message: message.into(),
            source: None,
        }
    }

    /// Create a Write error from a driver error, keeping the server's message.
    pub fn write_db(chunk: u64, context: impl fmt::Display, err: tokio_postgres::Error) -> Self {
        EtlError::Write {
            chunk,
            message: format!("{}: {}", context, pg_cause(&err)),
            source: Some(err),
        }
    }

    /// Process exit code for this error category.
    pub fn exit_code(&self) -> u8 {
        match self {
            EtlError::Config(_) | EtlError::Yaml(_) | EtlError::Json(_) => EXIT_CONFIG_ERROR,
            EtlError::Database(_)
            | EtlError::PoolCheckout(_)
            | EtlError::Pool { .. }
            | EtlError::State(_) => EXIT_DATABASE_ERROR,
            EtlError::Read(_)
            | EtlError::MissingField { .. }
            | EtlError::Transform { .. }
            | EtlError::Write { .. }
            | EtlError::JobFailed { .. } => EXIT_JOB_FAILED,
            EtlError::Io(_) => EXIT_IO_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Text of a driver error including the server-side cause.
///
/// `tokio_postgres::Error` displays only "db error" for server errors; the
/// SQLSTATE message and detail live in [`tokio_postgres::error::DbError`].
pub fn pg_cause(err: &tokio_postgres::Error) -> String {
    match err.as_db_error() {
        Some(db) => match db.detail() {
            Some(detail) => format!("{} ({}): {}", db.message(), db.code().code(), detail),
            None => format!("{} ({})", db.message(), db.code().code()),
        },
        None => err.to_string(),
    }
}

/// Result type alias for ETL operations.
pub type Result<T> = std::result::Result<T, EtlError>;
