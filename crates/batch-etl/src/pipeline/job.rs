//! Job: a named chunk step plus its lifecycle listeners.

use std::sync::Arc;

use tracing::info;

use crate::core::{ItemProcessor, ItemReader, ItemWriter};
use crate::listener::JobListener;

use super::execution::{JobExecution, JobParameters};
use super::step::ChunkStep;

/// A runnable job wrapping one chunk step.
pub struct Job<R, P, W> {
    name: String,
    step: ChunkStep<R, P, W>,
    listeners: Vec<Arc<dyn JobListener>>,
}

impl<R, P, W> Job<R, P, W>
where
    R: ItemReader,
    P: ItemProcessor,
    W: ItemWriter,
{
    pub fn new(name: impl Into<String>, step: ChunkStep<R, P, W>) -> Self {
        Self {
            name: name.into(),
            step,
            listeners: Vec::new(),
        }
    }

    /// Register a listener. Listeners are notified in registration order.
    pub fn with_listener(mut self, listener: Arc<dyn JobListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn step(&self) -> &ChunkStep<R, P, W> {
        &self.step
    }

    /// Run the job once.
    ///
    /// Step failures do not surface as `Err`: they end the run with
    /// [`BatchStatus::Failed`](super::BatchStatus::Failed) and the error text
    /// in `exit_description`. Listeners see the terminal status exactly once.
    pub async fn run(&mut self, params: JobParameters) -> JobExecution {
        let mut execution = JobExecution::new(&self.name, self.step.name(), params);

        for listener in &self.listeners {
            listener.before_job(&execution).await;
        }

        execution.mark_started();
        info!(
            "Job '{}' launched with parameters run_id={}",
            self.name, params.run_id
        );

        match self.step.execute(&mut execution.step).await {
            Ok(()) => execution.mark_completed(),
            Err(e) => execution.mark_failed(&e),
        }

        for listener in &self.listeners {
            listener.after_job(&execution).await;
        }

        execution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{people, MemoryWriter, RecordingListener, SequenceTags, VecReader};
    use crate::pipeline::BatchStatus;
    use crate::processor::RecordProcessor;

    fn job(
        records: usize,
        writer: MemoryWriter,
        listener: Arc<RecordingListener>,
    ) -> Job<VecReader, RecordProcessor<SequenceTags>, MemoryWriter> {
        let step = ChunkStep::new(
            "step1",
            5,
            VecReader::new(people(records)),
            RecordProcessor::with_generator(SequenceTags::default()),
            writer,
        );
        Job::new("importUserJob", step).with_listener(listener)
    }

    #[tokio::test]
    async fn test_successful_run_reports_completed_once() {
        let listener = Arc::new(RecordingListener::default());
        let writer = MemoryWriter::new();
        let mut job = job(7, writer.clone(), listener.clone());

        let execution = job.run(JobParameters::new(1)).await;

        assert_eq!(execution.status, BatchStatus::Completed);
        assert_eq!(execution.run_id, 1);
        assert_eq!(execution.step.chunk_sizes, vec![5, 2]);
        assert!(execution.exit_description.is_none());
        assert_eq!(listener.before_calls(), 1);
        assert_eq!(listener.after_calls(), vec![(BatchStatus::Completed, 7)]);
    }

    #[tokio::test]
    async fn test_write_failure_on_second_chunk_reports_failed() {
        let listener = Arc::new(RecordingListener::default());
        let writer = MemoryWriter::failing_on(2);
        let mut job = job(7, writer.clone(), listener.clone());

        let execution = job.run(JobParameters::new(2)).await;

        assert_eq!(execution.status, BatchStatus::Failed);
        assert_eq!(writer.committed_ids(), vec![1, 2, 3, 4, 5]);
        assert!(execution
            .exit_description
            .as_deref()
            .unwrap()
            .contains("chunk 2"));
        assert_eq!(listener.after_calls(), vec![(BatchStatus::Failed, 5)]);
        assert!(execution.into_result().is_err());
    }

    #[tokio::test]
    async fn test_reader_open_failure_still_notifies() {
        let listener = Arc::new(RecordingListener::default());
        let step = ChunkStep::new(
            "step1",
            5,
            VecReader::failing_on_open(),
            RecordProcessor::with_generator(SequenceTags::default()),
            MemoryWriter::new(),
        );
        let mut job = Job::new("importUserJob", step).with_listener(listener.clone());

        let execution = job.run(JobParameters::new(3)).await;

        assert_eq!(execution.status, BatchStatus::Failed);
        assert_eq!(listener.after_calls(), vec![(BatchStatus::Failed, 0)]);
    }

    #[tokio::test]
    async fn test_empty_source_completes() {
        let listener = Arc::new(RecordingListener::default());
        let writer = MemoryWriter::new();
        let mut job = job(0, writer.clone(), listener.clone());

        let execution = job.run(JobParameters::new(1)).await;

        assert!(execution.is_success());
        assert_eq!(writer.calls(), 0);
        assert_eq!(listener.after_calls(), vec![(BatchStatus::Completed, 0)]);
    }
}
