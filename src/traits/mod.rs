//! Trait configuration and weighted sampling
//!
//! - TraitConfig: byte layout + base / max-bonus weight tables for one trait
//! - TraitConfigRegistry: the ordered set of trait configs used for encoding
//! - sample: bonus-interpolated weighted draw from a shared entropy word

mod config;
mod registry;
mod sampler;

pub use config::{TraitConfig, TraitLayout, MAX_BONUS};
pub use registry::{TraitConfigRegistry, DEFAULT_TRAIT_COUNT};
pub use sampler::{sample, Sample};

/// Six-trait reference registry shared by unit tests
#[cfg(test)]
pub(crate) fn test_registry() -> TraitConfigRegistry {
    TraitConfigRegistry::reference_layout(&[
        (vec![1, 3, 4, 1], vec![5, 2, 1, 1]),
        (vec![1, 1], vec![1, 1]),
        (vec![1, 1, 1], vec![2, 2, 2]),
        (vec![1], vec![2]),
        (vec![1], vec![2]),
        (vec![1], vec![2]),
    ])
    .unwrap()
}
