//! PostgreSQL job repository.
//!
//! Stores executions in `_batch_etl.job_execution` on the target database,
//! one row per `(job_name, run_id)`.

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tracing::debug;

use crate::error::Result;
use crate::pipeline::JobExecution;
use crate::state::backend::JobRepository;

const SCHEMA: &str = "_batch_etl";

/// Database-backed job repository.
pub struct PgJobRepository {
    pool: Pool,
    config_hash: String,
}

impl PgJobRepository {
    /// `config_hash` is stored with every execution to tell runs with
    /// different configurations apart.
    pub fn new(pool: Pool, config_hash: impl Into<String>) -> Self {
        Self {
            pool,
            config_hash: config_hash.into(),
        }
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn init_schema(&self) -> Result<()> {
        let conn = self.pool.get().await?;

        conn.execute(&format!("CREATE SCHEMA IF NOT EXISTS {}", SCHEMA), &[])
            .await?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {}.job_execution (
                    job_name TEXT NOT NULL,
                    run_id BIGINT NOT NULL,
                    step_name TEXT NOT NULL,
                    status TEXT NOT NULL CHECK (status IN ('starting', 'started', 'completed', 'failed')),
                    config_hash TEXT NOT NULL,
                    started_at TIMESTAMPTZ NOT NULL,
                    ended_at TIMESTAMPTZ,
                    read_count BIGINT NOT NULL DEFAULT 0,
                    write_count BIGINT NOT NULL DEFAULT 0,
                    commit_count BIGINT NOT NULL DEFAULT 0,
                    rollback_count BIGINT NOT NULL DEFAULT 0,
                    exit_description TEXT,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                    PRIMARY KEY (job_name, run_id)
                )",
                SCHEMA
            ),
            &[],
        )
        .await?;

        Ok(())
    }

    async fn next_run_id(&self, job_name: &str) -> Result<i64> {
        let conn = self.pool.get().await?;
        let row = conn
            .query_one(
                &format!(
                    "SELECT COALESCE(MAX(run_id), 0) + 1 FROM {}.job_execution WHERE job_name = $1",
                    SCHEMA
                ),
                &[&job_name],
            )
            .await?;
        Ok(row.get(0))
    }

    async fn save(&self, execution: &JobExecution) -> Result<()> {
        let conn = self.pool.get().await?;
        let step = &execution.step;

        conn.execute(
            &format!(
                "INSERT INTO {}.job_execution
                 (job_name, run_id, step_name, status, config_hash, started_at, ended_at,
                  read_count, write_count, commit_count, rollback_count, exit_description, updated_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
                 ON CONFLICT (job_name, run_id) DO UPDATE SET
                    status = EXCLUDED.status,
                    started_at = EXCLUDED.started_at,
                    ended_at = EXCLUDED.ended_at,
                    read_count = EXCLUDED.read_count,
                    write_count = EXCLUDED.write_count,
                    commit_count = EXCLUDED.commit_count,
                    rollback_count = EXCLUDED.rollback_count,
                    exit_description = EXCLUDED.exit_description,
                    updated_at = NOW()",
                SCHEMA
            ),
            &[
                &execution.job_name,
                &execution.run_id,
                &step.step_name,
                &execution.status.as_str(),
                &self.config_hash,
                &execution.started_at,
                &execution.ended_at,
                &(step.read_count as i64),
                &(step.write_count as i64),
                &(step.commit_count as i64),
                &(step.rollback_count as i64),
                &execution.exit_description,
            ],
        )
        .await?;

        debug!(
            "Recorded execution {} run {} as {}",
            execution.job_name,
            execution.run_id,
            execution.status.as_str()
        );
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "postgres"
    }
}
