//! Core traits for the chunk-oriented pipeline.
//!
//! - [`ItemReader`]: Streams source records one position at a time
//! - [`ItemProcessor`]: Maps one source record into one destination record
//! - [`ItemWriter`]: Writes one chunk of destination records atomically
//!
//! The step runner is generic over these traits, so the PostgreSQL drivers
//! and the in-memory fakes used by tests plug in the same way.

use async_trait::async_trait;

use crate::error::Result;

use super::record::{DestinationRecord, ReadOutcome, SourceRecord};

/// Read records from a source.
#[async_trait]
pub trait ItemReader: Send {
    /// Advance one position.
    ///
    /// Returns [`ReadOutcome::EndOfStream`] once the source is exhausted.
    /// Implementations return [`ReadOutcome::Absent`] rather than an error
    /// when called again after exhaustion.
    async fn read(&mut self) -> Result<ReadOutcome>;
}

/// Transform a source record into a destination record.
pub trait ItemProcessor: Send {
    /// Map one record. An error fails the current chunk.
    fn process(&mut self, item: SourceRecord) -> Result<DestinationRecord>;
}

/// Write chunks of destination records.
#[async_trait]
pub trait ItemWriter: Send {
    /// Write all records of one chunk as a single unit of work.
    ///
    /// Either every record is committed or none is. Returns the number of
    /// rows written.
    async fn write_chunk(&mut self, chunk: &[DestinationRecord]) -> Result<u64>;
}
