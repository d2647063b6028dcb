//! Chunk-oriented job execution.
//!
//! - [`ChunkStep`]: read-process-accumulate-write loop with per-chunk commits
//! - [`Job`]: a named step plus listeners, producing a [`JobExecution`]
//! - [`JobExecution`] / [`StepExecution`]: run status and counters

mod execution;
mod job;
mod step;

#[cfg(test)]
pub(crate) mod testing;

pub use execution::{BatchStatus, JobExecution, JobParameters, StepExecution};
pub use job::Job;
pub use step::{ChunkStep, StepState};
