//! PostgreSQL driver.
//!
//! - [`build_pool`]: deadpool connection pools with optional TLS
//! - [`PostgresReader`]: cursor reader over the source table
//! - [`PostgresWriter`]: transactional chunk writer for the destination table

mod pool;
mod reader;
mod writer;

#[cfg(test)]
pub(crate) mod test_db;

pub use pool::{build_pool, test_connection};
pub use reader::{select_query, PostgresReader};
pub use writer::{insert_statement, PostgresWriter};

use deadpool_postgres::Pool;

use crate::error::Result;

/// Count the rows of `table`.
pub async fn count_rows(pool: &Pool, table: &str) -> Result<i64> {
    let client = pool.get().await?;
    let row = client
        .query_one(format!("select count(*) from {}", table).as_str(), &[])
        .await?;
    Ok(row.get(0))
}
