//! Record types flowing through the chunk pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A row read from the source table.
///
/// Name and tag columns are nullable in the source schema and are carried
/// as read; the processor decides what a missing value means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub random_num: Option<String>,
}

impl SourceRecord {
    /// Build a record with all fields present.
    pub fn new(
        id: i64,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        random_num: impl Into<String>,
    ) -> Self {
        Self {
            id,
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            random_num: Some(random_num.into()),
        }
    }
}

impl fmt::Display for SourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SourceRecord [id={}, firstName={}, lastName={}, randomNum={}]",
            self.id,
            self.first_name.as_deref().unwrap_or("null"),
            self.last_name.as_deref().unwrap_or("null"),
            self.random_num.as_deref().unwrap_or("null"),
        )
    }
}

/// A row produced by the processor and inserted into the destination table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationRecord {
    pub id: i64,
    pub full_name: String,
    pub random_num: String,
}

impl fmt::Display for DestinationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DestinationRecord [id={}, fullName={}, randomNum={}]",
            self.id, self.full_name, self.random_num
        )
    }
}

/// Result of advancing the reader by one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The next record in source order.
    Item(SourceRecord),
    /// Nothing was materialized at this position. Not end of stream; the
    /// caller may read again.
    Absent,
    /// The source is exhausted.
    EndOfStream,
}
