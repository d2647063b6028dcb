//! PostgreSQL chunk writer.
//!
//! Each `write_chunk` call runs in its own transaction: every record of the
//! chunk is inserted, then the transaction commits. Any failure drops the
//! transaction guard, which rolls the chunk back.

use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use tokio_postgres::types::Type;
use tracing::{debug, info};

use crate::core::{DestinationRecord, ItemWriter};
use crate::error::{EtlError, Result};

/// Insert statement the writer prepares for `table`.
pub fn insert_statement(table: &str) -> String {
    format!(
        "insert into {} (id, full_name, random_num) values ($1, $2, $3)",
        table
    )
}

/// Destination writer over a PostgreSQL table.
pub struct PostgresWriter {
    pool: Pool,
    insert_sql: String,
    client: Option<Object>,
    chunks_written: u64,
}

impl PostgresWriter {
    pub fn new(pool: Pool, target_table: &str) -> Self {
        Self {
            pool,
            insert_sql: insert_statement(target_table),
            client: None,
            chunks_written: 0,
        }
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    /// Number of chunks committed so far.
    pub fn chunks_written(&self) -> u64 {
        self.chunks_written
    }

    async fn write_in_transaction(
        client: &mut Object,
        insert_sql: &str,
        chunk_no: u64,
        chunk: &[DestinationRecord],
    ) -> Result<u64> {
        let tx = client
            .transaction()
            .await
            .map_err(|e| EtlError::write_db(chunk_no, "begin transaction", e))?;

        let stmt = tx
            .prepare_typed(insert_sql, &[Type::INT8, Type::TEXT, Type::TEXT])
            .await
            .map_err(|e| EtlError::write_db(chunk_no, "prepare insert", e))?;

        let mut inserted = 0u64;
        for record in chunk {
            inserted += tx
                .execute(&stmt, &[&record.id, &record.full_name, &record.random_num])
                .await
                .map_err(|e| EtlError::write_db(chunk_no, format!("record {}", record.id), e))?;
        }

        tx.commit()
            .await
            .map_err(|e| EtlError::write_db(chunk_no, "commit", e))?;
        Ok(inserted)
    }
}

#[async_trait]
impl ItemWriter for PostgresWriter {
    async fn write_chunk(&mut self, chunk: &[DestinationRecord]) -> Result<u64> {
        if chunk.is_empty() {
            return Ok(0);
        }
        let chunk_no = self.chunks_written + 1;

        if self.client.is_none() {
            self.client = Some(self.pool.get().await?);
        }
        let client = self
            .client
            .as_mut()
            .ok_or_else(|| EtlError::State("writer connection unavailable".into()))?;

        match Self::write_in_transaction(client, &self.insert_sql, chunk_no, chunk).await {
            Ok(inserted) => {
                self.chunks_written = chunk_no;
                debug!("Chunk {} committed ({} rows)", chunk_no, inserted);
                Ok(inserted)
            }
            Err(e) => {
                // The connection may be mid-transaction; let the pool recycle it.
                self.client = None;
                info!("Chunk {} rolled back", chunk_no);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::postgres::test_db::{recreate_table, test_database, test_pool};
    use crate::drivers::{build_pool, count_rows};

    fn people(ids: std::ops::RangeInclusive<i64>) -> Vec<DestinationRecord> {
        ids.map(|id| DestinationRecord {
            id,
            full_name: format!("First{} Last{}", id, id),
            random_num: "01234".to_string(),
        })
        .collect()
    }

    #[test]
    fn test_insert_statement() {
        assert_eq!(
            insert_statement("writer"),
            "insert into writer (id, full_name, random_num) values ($1, $2, $3)"
        );
    }

    #[tokio::test]
    async fn test_empty_chunk_does_not_connect() {
        let mut unreachable = test_database();
        unreachable.port = 1;
        let pool = build_pool(&unreachable, "target").unwrap();
        let mut writer = PostgresWriter::new(pool, "writer");

        assert_eq!(writer.write_chunk(&[]).await.unwrap(), 0);
        assert_eq!(writer.chunks_written(), 0);
    }

    #[tokio::test]
    #[ignore] // Needs a PostgreSQL test database
    async fn test_failed_chunk_rolls_back_alone() {
        let pool = test_pool();
        recreate_table(
            &pool,
            "it_writer_rollback",
            "id integer primary key, full_name text, random_num text",
        )
        .await;
        let mut writer = PostgresWriter::new(pool.clone(), "it_writer_rollback");

        assert_eq!(writer.write_chunk(&people(1..=5)).await.unwrap(), 5);

        // Ids 6 and 7 insert fine before id 5 collides with chunk 1.
        let mut second = people(6..=7);
        second.extend(people(5..=5));
        let err = writer.write_chunk(&second).await.unwrap_err();

        assert!(matches!(err, EtlError::Write { chunk: 2, .. }));
        assert!(err.to_string().contains("record 5"), "{}", err);
        assert!(err.to_string().contains("duplicate key"), "{}", err);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(count_rows(&pool, "it_writer_rollback").await.unwrap(), 5);
        assert_eq!(writer.chunks_written(), 1);

        // The writer recovers with a fresh connection for the next chunk.
        assert_eq!(writer.write_chunk(&people(6..=7)).await.unwrap(), 2);
        assert_eq!(count_rows(&pool, "it_writer_rollback").await.unwrap(), 7);
    }
}
