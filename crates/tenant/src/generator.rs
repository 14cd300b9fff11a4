//! Identifier generation.
//!
//! An [`IdGenerator`] only proposes candidates. The bucket store checks each
//! candidate against the primary table and draws again on collision, giving
//! up after [`MAX_ID_GENERATION_ATTEMPTS`].

use rand::Rng;

use crate::id::Id;

/// Number of candidates drawn before id generation fails.
pub const MAX_ID_GENERATION_ATTEMPTS: usize = 100;

/// Source of candidate identifiers.
pub trait IdGenerator: Send + Sync {
    /// Returns a candidate id. Invalid (zero) candidates are discarded by
    /// the caller.
    fn id(&self) -> Id;
}

/// Draws uniformly random non-zero ids from the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl RandomIdGenerator {
    /// Creates a new generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl IdGenerator for RandomIdGenerator {
    fn id(&self) -> Id {
        let mut rng = rand::rng();
        loop {
            let value: u64 = rng.random();
            if value != 0 {
                return Id::new(value);
            }
        }
    }
}
