//! Record processor: source row to destination row.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::core::{DestinationRecord, ItemProcessor, SourceRecord};
use crate::error::{EtlError, Result};

/// Number of digits in a generated tag.
pub const TAG_LEN: usize = 5;

/// Source of the short numeric tag stored in `random_num`.
pub trait TagGenerator: Send {
    /// Produce a tag of exactly [`TAG_LEN`] ASCII digits.
    fn next_tag(&mut self) -> String;
}

/// Tag generator sampling each digit uniformly from `0-9`.
pub struct RandomTagGenerator {
    rng: StdRng,
}

impl RandomTagGenerator {
    /// Generator seeded from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Generator with a fixed seed; the tag sequence is reproducible.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomTagGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl TagGenerator for RandomTagGenerator {
    fn next_tag(&mut self) -> String {
        (0..TAG_LEN)
            .map(|_| char::from(b'0' + self.rng.random_range(0..10u8)))
            .collect()
    }
}

/// Builds `full_name` from the name columns and stamps a fresh tag.
pub struct RecordProcessor<G = RandomTagGenerator> {
    tags: G,
}

impl RecordProcessor<RandomTagGenerator> {
    pub fn new() -> Self {
        Self::with_generator(RandomTagGenerator::new())
    }
}

impl Default for RecordProcessor<RandomTagGenerator> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: TagGenerator> RecordProcessor<G> {
    pub fn with_generator(tags: G) -> Self {
        Self { tags }
    }
}

impl<G: TagGenerator> ItemProcessor for RecordProcessor<G> {
    fn process(&mut self, item: SourceRecord) -> Result<DestinationRecord> {
        debug!("Processing record: {}", item);

        let first = item.first_name.as_deref().ok_or(EtlError::MissingField {
            id: item.id,
            field: "first_name",
        })?;
        let last = item.last_name.as_deref().ok_or(EtlError::MissingField {
            id: item.id,
            field: "last_name",
        })?;

        let random_num = self.tags.next_tag();
        if random_num.len() != TAG_LEN || !random_num.bytes().all(|b| b.is_ascii_digit()) {
            return Err(EtlError::Transform {
                id: item.id,
                message: format!("tag generator produced invalid tag '{}'", random_num),
            });
        }

        let output = DestinationRecord {
            id: item.id,
            full_name: format!("{} {}", first, last),
            random_num,
        };
        debug!("Processed record: {}", output);
        Ok(output)
    }
}
