//! Core abstractions for the batch pipeline.
//!
//! - [`record`]: Source and destination record types and the read outcome
//! - [`traits`]: Reader, processor and writer traits driven by the step runner

pub mod record;
pub mod traits;

pub use record::{DestinationRecord, ReadOutcome, SourceRecord};
pub use traits::{ItemProcessor, ItemReader, ItemWriter};
