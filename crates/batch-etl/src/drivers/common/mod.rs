//! Utilities shared by the PostgreSQL reader, writer and job repository.
//!
//! - [`tls`]: TLS configuration for PostgreSQL connections

pub mod tls;

pub use tls::{SslMode, TlsBuilder};
