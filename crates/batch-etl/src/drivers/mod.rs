//! Database drivers.
//!
//! - [`postgres`]: pools, cursor reader and chunk writer for PostgreSQL
//! - [`common`]: TLS setup shared by every connection

pub mod common;
pub mod postgres;

pub use common::{SslMode, TlsBuilder};
pub use postgres::{build_pool, count_rows, test_connection, PostgresReader, PostgresWriter};
