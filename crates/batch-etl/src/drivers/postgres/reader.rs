//! PostgreSQL cursor reader.
//!
//! Streams the source query over one pooled connection. Rows arrive through
//! a forward-only [`RowStream`]; each `read` advances exactly one row.

use std::pin::Pin;

use async_trait::async_trait;
use deadpool_postgres::{Object, Pool};
use futures::StreamExt;
use tokio_postgres::types::{ToSql, Type};
use tokio_postgres::{Row, RowStream};
use tracing::{debug, info};

use crate::core::{ItemReader, ReadOutcome, SourceRecord};
use crate::error::{pg_cause, EtlError, Result};

/// Columns selected from the source table, in mapping order.
const SOURCE_COLUMNS: usize = 4;

/// Query the reader runs against `table`.
pub fn select_query(table: &str) -> String {
    format!("select id, firstName, lastname, random_num from {}", table)
}

enum Cursor {
    /// Not opened yet; the first `read` opens it.
    Closed,
    Open {
        // Keeps the connection checked out while rows stream.
        _client: Object,
        rows: Pin<Box<RowStream>>,
    },
    /// Drained. The connection has been returned to the pool.
    Exhausted,
}

/// Source reader over a PostgreSQL table.
pub struct PostgresReader {
    pool: Pool,
    query: String,
    cursor: Cursor,
    rows_read: u64,
}

impl PostgresReader {
    /// Create a reader over `source_table`. The table name must already be
    /// validated as a plain identifier.
    pub fn new(pool: Pool, source_table: &str) -> Self {
        Self {
            pool,
            query: select_query(source_table),
            cursor: Cursor::Closed,
            rows_read: 0,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    async fn open(&mut self) -> Result<()> {
        let client = self.pool.get().await?;
        let rows = client
            .query_raw(self.query.as_str(), no_params())
            .await
            .map_err(|e| EtlError::Read(format!("opening cursor '{}': {}", self.query, pg_cause(&e))))?;
        info!("Opened cursor: {}", self.query);
        self.cursor = Cursor::Open {
            _client: client,
            rows: Box::pin(rows),
        };
        Ok(())
    }
}

#[async_trait]
impl ItemReader for PostgresReader {
    async fn read(&mut self) -> Result<ReadOutcome> {
        if let Cursor::Closed = self.cursor {
            self.open().await?;
        }

        let next = match &mut self.cursor {
            Cursor::Open { rows, .. } => rows.next().await,
            _ => {
                debug!("Read called on exhausted cursor; returning no record");
                return Ok(ReadOutcome::Absent);
            }
        };

        match next {
            Some(row) => {
                let record = map_row(&row?)?;
                self.rows_read += 1;
                debug!("Read record: {}", record);
                Ok(ReadOutcome::Item(record))
            }
            None => {
                self.cursor = Cursor::Exhausted;
                info!("Cursor exhausted after {} rows", self.rows_read);
                Ok(ReadOutcome::EndOfStream)
            }
        }
    }
}

/// Map one result row to a [`SourceRecord`].
fn map_row(row: &Row) -> Result<SourceRecord> {
    if row.len() < SOURCE_COLUMNS {
        return Err(EtlError::Read(format!(
            "expected {} columns, row has {}",
            SOURCE_COLUMNS,
            row.len()
        )));
    }

    let id_type = row.columns()[0].type_();
    let id = if *id_type == Type::INT8 {
        row.try_get::<_, i64>(0)?
    } else if *id_type == Type::INT2 {
        i64::from(row.try_get::<_, i16>(0)?)
    } else {
        i64::from(row.try_get::<_, i32>(0)?)
    };

    Ok(SourceRecord {
        id,
        first_name: row.try_get(1)?,
        last_name: row.try_get(2)?,
        random_num: row.try_get(3)?,
    })
}

fn no_params() -> impl ExactSizeIterator<Item = &'static dyn ToSql> {
    std::iter::empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::postgres::test_db::{insert_people, recreate_table, test_pool};

    #[test]
    fn test_select_query() {
        assert_eq!(
            select_query("reader"),
            "select id, firstName, lastname, random_num from reader"
        );
        assert_eq!(
            select_query("staging.reader"),
            "select id, firstName, lastname, random_num from staging.reader"
        );
    }

    const SOURCE_COLUMNS_DDL: &str = "id integer, firstName text, lastname text, random_num text";

    #[tokio::test]
    #[ignore] // Needs a PostgreSQL test database
    async fn test_reader_end_of_stream_then_absent() {
        let pool = test_pool();
        recreate_table(&pool, "it_reader_exhaust", SOURCE_COLUMNS_DDL).await;
        insert_people(&pool, "it_reader_exhaust", 2).await;

        let mut reader = PostgresReader::new(pool.clone(), "it_reader_exhaust");
        let mut ids = Vec::new();
        loop {
            match reader.read().await.unwrap() {
                ReadOutcome::Item(record) => ids.push(record.id),
                ReadOutcome::EndOfStream => break,
                ReadOutcome::Absent => panic!("absent before end of stream"),
            }
        }
        ids.sort();
        assert_eq!(ids, vec![1, 2]);

        assert!(matches!(reader.read().await.unwrap(), ReadOutcome::Absent));
        assert!(matches!(reader.read().await.unwrap(), ReadOutcome::Absent));
        // The cursor connection went back to the pool at exhaustion.
        assert_eq!(pool.status().available, pool.status().size);
    }

    #[tokio::test]
    #[ignore] // Needs a PostgreSQL test database
    async fn test_reader_maps_nulls_and_bigint_ids() {
        let pool = test_pool();
        recreate_table(
            &pool,
            "it_reader_bigint",
            "id bigint, firstName text, lastname text, random_num text",
        )
        .await;
        pool.get()
            .await
            .unwrap()
            .batch_execute(
                "insert into it_reader_bigint values (5000000000, 'Ann', null, null)",
            )
            .await
            .unwrap();

        let mut reader = PostgresReader::new(pool, "it_reader_bigint");
        match reader.read().await.unwrap() {
            ReadOutcome::Item(record) => {
                assert_eq!(record.id, 5_000_000_000);
                assert_eq!(record.first_name.as_deref(), Some("Ann"));
                assert_eq!(record.last_name, None);
                assert_eq!(record.random_num, None);
            }
            other => panic!("expected a record, got {:?}", other),
        }
        assert!(matches!(reader.read().await.unwrap(), ReadOutcome::EndOfStream));
    }

    #[tokio::test]
    #[ignore] // Needs a PostgreSQL test database
    async fn test_missing_source_table_reports_server_message() {
        let pool = test_pool();
        pool.get()
            .await
            .unwrap()
            .batch_execute("DROP TABLE IF EXISTS it_reader_missing")
            .await
            .unwrap();

        let mut reader = PostgresReader::new(pool, "it_reader_missing");
        let err = reader.read().await.unwrap_err();
        assert!(matches!(err, EtlError::Read(_)));
        assert!(err.to_string().contains("does not exist"), "{}", err);
    }
}
