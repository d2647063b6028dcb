//! Job execution history.
//!
//! - [`PgJobRepository`]: executions stored in the target database
//! - [`NoOpJobRepository`]: history disabled

mod backend;
mod db;
mod noop;

pub use backend::JobRepository;
pub use db::PgJobRepository;
pub use noop::NoOpJobRepository;
