//! Configuration type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Default chunk size (records per commit interval).
pub const DEFAULT_CHUNK_SIZE: usize = 5;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database the reader streams from.
    pub source: DatabaseConfig,

    /// Database the writer inserts into. Defaults to the source database.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DatabaseConfig>,

    /// Job behavior configuration.
    #[serde(default)]
    pub job: JobConfig,
}

impl Config {
    /// Effective destination database (the source when `target` is unset).
    pub fn target(&self) -> &DatabaseConfig {
        self.target.as_ref().unwrap_or(&self.source)
    }

    /// Whether reader and writer point at the same database.
    pub fn shares_database(&self) -> bool {
        match &self.target {
            None => true,
            Some(t) => {
                t.host == self.source.host
                    && t.port == self.source.port
                    && t.database == self.source.database
            }
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password.
    #[serde(default)]
    pub password: String,

    /// SSL mode: disable, require, verify-ca, verify-full (default: disable).
    #[serde(default = "default_disable")]
    pub ssl_mode: String,

    /// Pool size. The job holds one reader and one writer connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Job behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job name, used for run id allocation and log lines.
    #[serde(default = "default_job_name")]
    pub name: String,

    /// Step name.
    #[serde(default = "default_step_name")]
    pub step_name: String,

    /// Records per chunk (commit interval).
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Table the reader selects from.
    #[serde(default = "default_source_table")]
    pub source_table: String,

    /// Table the writer inserts into.
    #[serde(default = "default_target_table")]
    pub target_table: String,

    /// Record job executions in the target database.
    #[serde(default = "default_true")]
    pub record_history: bool,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            name: default_job_name(),
            step_name: default_step_name(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            source_table: default_source_table(),
            target_table: default_target_table(),
            record_history: true,
        }
    }
}

// Default value functions for serde
fn default_pg_port() -> u16 {
    5432
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_max_connections() -> usize {
    2
}

fn default_job_name() -> String {
    "importUserJob".to_string()
}

fn default_step_name() -> String {
    "step1".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_source_table() -> String {
    "reader".to_string()
}

fn default_target_table() -> String {
    "writer".to_string()
}

fn default_true() -> bool {
    true
}
