//! GenomeEncoder — expands a token seed into a genome record
//!
//! Traits are drawn in index order from the same seed, each draw dividing the
//! seed down by that trait's divisor. Whatever is left fills the tail of the
//! record, low byte first.

use super::{Genome, GENOME_LEN, GENOME_VERSION};
use crate::error::RevealError;
use crate::seed::Word;
use crate::traits::{sample, TraitConfigRegistry};

/// Encoder bound to a trait registry
pub struct GenomeEncoder<'a> {
    registry: &'a TraitConfigRegistry,
}

impl<'a> GenomeEncoder<'a> {
    pub fn new(registry: &'a TraitConfigRegistry) -> Self {
        Self { registry }
    }

    /// Deterministic: the same `(seed, bonus_level)` always yields the same record
    pub fn encode(&self, seed: &Word, bonus_level: u8) -> Result<Genome, RevealError> {
        let mut genome = Genome::default();
        genome.set(0, GENOME_VERSION)?;

        let mut entropy = *seed;
        for config in self.registry.ordered()? {
            let drawn = sample(config, &entropy, bonus_level)?;
            let bytes = config
                .option_bytes(drawn.option)
                .ok_or_else(|| RevealError::ConfigurationMismatch {
                    trait_index: config.index(),
                    reason: format!("no option data for option {}", drawn.option),
                })?;
            for (&slot, &value) in config.byte_slots().iter().zip(bytes) {
                genome.set(slot, value)?;
            }
            entropy = drawn.remaining;
        }

        let filler_start = self.registry.highest_slot().map_or(1, |s| s + 1);
        for pos in filler_start..GENOME_LEN {
            genome.set(pos, entropy.low_byte())?;
            entropy = entropy.shr8();
        }
        Ok(genome)
    }
}

/// `computeGenome(tokenSeed, bonusLevel)` against `registry`
pub fn compute_genome(
    registry: &TraitConfigRegistry,
    token_seed: &Word,
    bonus_level: u8,
) -> Result<Genome, RevealError> {
    GenomeEncoder::new(registry).encode(token_seed, bonus_level)
}
