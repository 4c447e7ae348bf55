//! DeterministicSource — counter-derived randomness for tests and demos
//!
//! NOT unpredictable: anyone who knows the counter can compute every value.
//! Values are delivered into the sink during `request`, so they are waiting
//! in the provider's inbox as soon as the reveal request returns.

use super::{Fulfillment, FulfillmentSink, RandomnessRequest, RandomnessSource};
use crate::error::RevealError;
use crate::seed::Word;
use log::{debug, warn};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct DeterministicSource {
    counter: u64,
}

impl Default for DeterministicSource {
    fn default() -> Self {
        Self::new(0)
    }
}

impl DeterministicSource {
    pub fn new(start: u64) -> Self {
        warn!("Using deterministic randomness source, values are predictable");
        Self { counter: start }
    }

    /// Value that request number `counter` for `token_id` receives
    pub fn value_for(counter: u64, token_id: u64) -> Word {
        let mut hasher = Sha256::new();
        hasher.update(b"genome-stub-v1");
        hasher.update(counter.to_be_bytes());
        hasher.update(token_id.to_be_bytes());
        Word::from_bytes(hasher.finalize().into())
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }
}

impl RandomnessSource for DeterministicSource {
    fn name(&self) -> &str {
        "deterministic"
    }

    fn request(&mut self, request: &RandomnessRequest, sink: &FulfillmentSink) -> Result<(), RevealError> {
        let value = Self::value_for(self.counter, request.token_id);
        sink.deliver(Fulfillment::new(request, value))?;
        debug!("Stub randomness #{} for token {}", self.counter, request.token_id);
        self.counter += 1;
        Ok(())
    }
}
