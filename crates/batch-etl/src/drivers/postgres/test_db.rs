//! Connection settings for database-backed tests.
//!
//! These tests are `#[ignore]`d. Run them against a scratch database with:
//! `cargo test -p batch-etl -- --ignored`
//! Update the settings below to match your environment.

use deadpool_postgres::Pool;

use crate::config::DatabaseConfig;

use super::build_pool;

pub fn test_database() -> DatabaseConfig {
    DatabaseConfig {
        host: "localhost".to_string(),
        port: 5432,
        database: "batch_etl_test".to_string(),
        user: "postgres".to_string(),
        password: "postgres".to_string(),
        ssl_mode: "disable".to_string(),
        max_connections: 4,
    }
}

pub fn test_pool() -> Pool {
    build_pool(&test_database(), "test").expect("build test pool")
}

/// Drop and create `table` with the given column list.
pub async fn recreate_table(pool: &Pool, table: &str, columns: &str) {
    let client = pool.get().await.expect("connect to test database");
    client
        .batch_execute(&format!(
            "DROP TABLE IF EXISTS {table}; CREATE TABLE {table} ({columns})"
        ))
        .await
        .expect("create test table");
}

/// Fill a source-shaped table with `n` people with ids `1..=n`.
pub async fn insert_people(pool: &Pool, table: &str, n: i32) {
    let client = pool.get().await.expect("connect to test database");
    for id in 1..=n {
        client
            .execute(
                &format!(
                    "insert into {} (id, firstName, lastname, random_num) values ($1, $2, $3, 'src')",
                    table
                ),
                &[&id, &format!("First{}", id), &format!("Last{}", id)],
            )
            .await
            .expect("insert source row");
    }
}
