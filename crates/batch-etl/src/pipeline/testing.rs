//! In-memory readers, writers and listeners for pipeline tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::{DestinationRecord, ItemReader, ItemWriter, ReadOutcome, SourceRecord};
use crate::error::{EtlError, Result};
use crate::listener::JobListener;
use crate::processor::TagGenerator;

use super::execution::{BatchStatus, JobExecution};

/// `n` complete source records with ids `1..=n`.
pub fn people(n: usize) -> Vec<SourceRecord> {
    (1..=n as i64)
        .map(|id| SourceRecord::new(id, format!("First{}", id), format!("Last{}", id), "src"))
        .collect()
}

/// Deterministic tags `00000`, `00001`, ...
#[derive(Default)]
pub struct SequenceTags {
    next: u32,
}

impl TagGenerator for SequenceTags {
    fn next_tag(&mut self) -> String {
        let tag = format!("{:05}", self.next % 100_000);
        self.next += 1;
        tag
    }
}

/// Reader that replays a fixed script, then end of stream, then `Absent`.
pub struct VecReader {
    script: VecDeque<ReadOutcome>,
    exhausted: bool,
    fail_on_open: bool,
}

impl VecReader {
    pub fn new(records: Vec<SourceRecord>) -> Self {
        Self::scripted(records.into_iter().map(ReadOutcome::Item).collect())
    }

    pub fn scripted(script: Vec<ReadOutcome>) -> Self {
        Self {
            script: script.into(),
            exhausted: false,
            fail_on_open: false,
        }
    }

    pub fn failing_on_open() -> Self {
        Self {
            script: VecDeque::new(),
            exhausted: false,
            fail_on_open: true,
        }
    }
}

#[async_trait]
impl ItemReader for VecReader {
    async fn read(&mut self) -> Result<ReadOutcome> {
        if self.fail_on_open {
            return Err(EtlError::Read("relation \"reader\" does not exist".into()));
        }
        if self.exhausted {
            return Ok(ReadOutcome::Absent);
        }
        match self.script.pop_front() {
            Some(outcome) => Ok(outcome),
            None => {
                self.exhausted = true;
                Ok(ReadOutcome::EndOfStream)
            }
        }
    }
}

/// Writer that keeps committed chunks in memory.
///
/// Clones share state, so a test can keep a handle after moving the writer
/// into a step.
#[derive(Clone, Default)]
pub struct MemoryWriter {
    committed: Arc<Mutex<Vec<Vec<DestinationRecord>>>>,
    calls: Arc<AtomicUsize>,
    fail_on_call: Option<usize>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writer whose `call`-th write (1-based) fails without committing.
    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on_call: Some(call),
            ..Self::default()
        }
    }

    pub fn committed(&self) -> Vec<Vec<DestinationRecord>> {
        self.committed.lock().unwrap().clone()
    }

    pub fn committed_ids(&self) -> Vec<i64> {
        self.committed().iter().flatten().map(|r| r.id).collect()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ItemWriter for MemoryWriter {
    async fn write_chunk(&mut self, chunk: &[DestinationRecord]) -> Result<u64> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(EtlError::write(call as u64, "simulated insert failure"));
        }
        self.committed.lock().unwrap().push(chunk.to_vec());
        Ok(chunk.len() as u64)
    }
}

/// Listener that records every callback it receives.
#[derive(Default)]
pub struct RecordingListener {
    before: AtomicUsize,
    after: Mutex<Vec<(BatchStatus, u64)>>,
}

impl RecordingListener {
    pub fn before_calls(&self) -> usize {
        self.before.load(Ordering::SeqCst)
    }

    /// Status and committed row count of each `after_job` call.
    pub fn after_calls(&self) -> Vec<(BatchStatus, u64)> {
        self.after.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobListener for RecordingListener {
    async fn before_job(&self, _execution: &JobExecution) {
        self.before.fetch_add(1, Ordering::SeqCst);
    }

    async fn after_job(&self, execution: &JobExecution) {
        self.after
            .lock()
            .unwrap()
            .push((execution.status, execution.step.write_count));
    }
}
