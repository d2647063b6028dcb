//! Chunk-oriented step runner.
//!
//! The step reads records one at a time, processes each one, and collects
//! the results into a chunk buffer. A full buffer (or a non-empty buffer at
//! end of stream) is handed to the writer, which commits it as one unit of
//! work. Any failure abandons the current chunk and ends the step; chunks
//! committed earlier stay committed.

use tracing::{debug, error, info};

use crate::core::{DestinationRecord, ItemProcessor, ItemReader, ItemWriter, ReadOutcome};
use crate::error::Result;

use super::execution::StepExecution;

/// Position of the step in its read/flush cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepState {
    /// Reading and processing records into the buffer.
    Running,
    /// Writing the buffered chunk.
    Flushing,
    /// Source exhausted and every chunk written.
    Complete,
}

/// Drives a reader, processor and writer through chunked commits.
pub struct ChunkStep<R, P, W> {
    name: String,
    chunk_size: usize,
    reader: R,
    processor: P,
    writer: W,
    state: StepState,
}

impl<R, P, W> ChunkStep<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor,
    W: ItemWriter,
{
    /// Create a step. A chunk size of zero is treated as one.
    pub fn new(name: impl Into<String>, chunk_size: usize, reader: R, processor: P, writer: W) -> Self {
        Self {
            name: name.into(),
            chunk_size: chunk_size.max(1),
            reader,
            processor,
            writer,
            state: StepState::Running,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn state(&self) -> StepState {
        self.state
    }

    /// Release the reader, processor and writer.
    pub fn into_parts(self) -> (R, P, W) {
        (self.reader, self.processor, self.writer)
    }

    /// Run the step to completion, updating `stats` as chunks commit.
    ///
    /// On error the counters reflect the work committed before the failure.
    pub async fn execute(&mut self, stats: &mut StepExecution) -> Result<()> {
        info!(
            "Executing step '{}' with chunk size {}",
            self.name, self.chunk_size
        );

        let mut buffer = Vec::with_capacity(self.chunk_size);
        let result = self.run_chunks(&mut buffer, stats).await;

        match &result {
            Ok(()) => info!(
                "Step '{}' complete: read={}, written={}, commits={}",
                self.name, stats.read_count, stats.write_count, stats.commit_count
            ),
            Err(e) => {
                // Records read since the last commit belong to the abandoned chunk.
                let committed: usize = stats.chunk_sizes.iter().sum();
                if stats.read_count as usize > committed {
                    stats.rollback_count += 1;
                }
                error!(
                    "Step '{}' failed in chunk {} ({} buffered records discarded): {}",
                    self.name,
                    stats.commit_count + 1,
                    buffer.len(),
                    e
                );
            }
        }
        result
    }

    async fn run_chunks(
        &mut self,
        buffer: &mut Vec<DestinationRecord>,
        stats: &mut StepExecution,
    ) -> Result<()> {
        let mut exhausted = false;
        self.state = StepState::Running;

        loop {
            match self.state {
                StepState::Running => match self.reader.read().await? {
                    ReadOutcome::Item(record) => {
                        stats.read_count += 1;
                        buffer.push(self.processor.process(record)?);
                        if buffer.len() >= self.chunk_size {
                            self.state = StepState::Flushing;
                        }
                    }
                    ReadOutcome::Absent => {
                        stats.absent_count += 1;
                        debug!("Reader returned no record; reading again");
                    }
                    ReadOutcome::EndOfStream => {
                        exhausted = true;
                        self.state = if buffer.is_empty() {
                            StepState::Complete
                        } else {
                            StepState::Flushing
                        };
                    }
                },
                StepState::Flushing => {
                    let written = self.writer.write_chunk(buffer).await?;
                    stats.write_count += written;
                    stats.commit_count += 1;
                    stats.chunk_sizes.push(buffer.len());
                    debug!(
                        "Committed chunk {} ({} records)",
                        stats.commit_count,
                        buffer.len()
                    );
                    buffer.clear();
                    self.state = if exhausted {
                        StepState::Complete
                    } else {
                        StepState::Running
                    };
                }
                StepState::Complete => return Ok(()),
            }
        }
    }
}
