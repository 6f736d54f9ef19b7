//! Patient identifier allocation.
//!
//! An identifier is the last six digits of the patient's national ID followed by a four digit
//! random suffix in `1000..=9999`, e.g. national ID `490012345678` gives `345678xxxx`. The
//! prefix lets support staff sanity-check an identifier against the person in front of them;
//! the suffix keeps identifiers from being trivially enumerable.
//!
//! Allocation checks each candidate against the [`MappingStore`] and retries on collision, up
//! to the configured attempt budget. It never writes: the caller persists the identifier with
//! [`MappingStore::create`], which is the real uniqueness gate.

use crate::constants::SUFFIX_RANGE;
use crate::mapping::MappingStore;
use crate::{IdentityError, IdentityResult};
use rand::Rng;
use std::sync::Arc;
use thejas_types::{NationalId, PatientIdentifier};

/// Source of identifier suffixes.
pub trait SuffixSource: Send + Sync {
    /// Returns a value in `1000..=9999`.
    fn next_suffix(&self) -> u16;
}

/// Uniformly random suffixes from the thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSuffix;

impl SuffixSource for RandomSuffix {
    fn next_suffix(&self) -> u16 {
        rand::thread_rng().gen_range(SUFFIX_RANGE)
    }
}

#[derive(Clone)]
pub struct IdentifierAllocator {
    mappings: Arc<dyn MappingStore>,
    suffixes: Arc<dyn SuffixSource>,
    attempts: u32,
}

impl IdentifierAllocator {
    pub fn new(
        mappings: Arc<dyn MappingStore>,
        suffixes: Arc<dyn SuffixSource>,
        attempts: u32,
    ) -> Self {
        Self {
            mappings,
            suffixes,
            attempts,
        }
    }

    /// Finds an identifier for `national_id` that is unused at check time.
    ///
    /// # Errors
    ///
    /// - [`IdentityError::AllocationExhausted`] if every candidate in the budget was taken.
    /// - Store errors from [`MappingStore::exists`] are returned unchanged.
    pub fn allocate(&self, national_id: &NationalId) -> IdentityResult<PatientIdentifier> {
        for attempt in 1..=self.attempts {
            let candidate = PatientIdentifier::from_parts(national_id, self.suffixes.next_suffix())?;

            if !self.mappings.exists(&candidate)? {
                tracing::debug!(attempt, identifier = %candidate, "allocated patient identifier");
                return Ok(candidate);
            }

            tracing::debug!(attempt, identifier = %candidate, "patient identifier taken, retrying");
        }

        tracing::warn!(
            attempts = self.attempts,
            prefix = national_id.suffix(),
            "patient identifier allocation exhausted"
        );
        Err(IdentityError::AllocationExhausted {
            attempts: self.attempts,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::SuffixSource;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays a fixed list of suffixes, then repeats the last one.
    pub(crate) struct ScriptedSuffix {
        script: Mutex<VecDeque<u16>>,
        last: Mutex<u16>,
    }

    impl ScriptedSuffix {
        pub(crate) fn new(script: impl IntoIterator<Item = u16>) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                last: Mutex::new(1000),
            }
        }
    }

    impl SuffixSource for ScriptedSuffix {
        fn next_suffix(&self) -> u16 {
            let mut last = self.last.lock().unwrap();
            if let Some(next) = self.script.lock().unwrap().pop_front() {
                *last = next;
            }
            *last
        }
    }
}
