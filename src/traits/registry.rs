//! TraitConfigRegistry — the ordered trait table used by the encoder
//!
//! Trait indices are 1-based and fixed at construction. Configuration writes
//! validate the layout against every other trait so no two traits share a
//! genome byte.

use super::config::{TraitConfig, TraitLayout};
use crate::error::RevealError;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Trait count of the reference genome layout
pub const DEFAULT_TRAIT_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitConfigRegistry {
    /// Slot `i - 1` holds trait `i`
    traits: Vec<Option<TraitConfig>>,
}

/// On-disk form of a registry
#[derive(Debug, Serialize, Deserialize)]
struct RegistryFile {
    trait_count: usize,
    traits: Vec<TraitLayout>,
}

impl Default for TraitConfigRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_TRAIT_COUNT)
    }
}

impl TraitConfigRegistry {
    pub fn new(trait_count: usize) -> Self {
        Self {
            traits: vec![None; trait_count],
        }
    }

    /// Reference layout: trait `i` owns genome byte `i` and option `k`
    /// writes the value `k`. One `(base, max_bonus)` pair per trait.
    pub fn reference_layout(weights: &[(Vec<u32>, Vec<u32>)]) -> Result<Self, RevealError> {
        let mut registry = Self::new(weights.len());
        for (i, (base, max_bonus)) in weights.iter().enumerate() {
            let index = i + 1;
            let option_data = (0..base.len()).map(|k| k as u8).collect();
            registry.set_trait_config(index, vec![index], option_data, base.clone(), max_bonus.clone())?;
        }
        Ok(registry)
    }

    pub fn trait_count(&self) -> usize {
        self.traits.len()
    }

    /// Install or replace the full configuration of one trait
    pub fn set_trait_config(
        &mut self,
        trait_index: usize,
        byte_slots: Vec<usize>,
        option_data: Vec<u8>,
        base_weight: Vec<u32>,
        max_bonus_weight: Vec<u32>,
    ) -> Result<(), RevealError> {
        self.check_index(trait_index)?;
        let config = TraitConfig::new(trait_index, byte_slots, option_data, base_weight, max_bonus_weight)?;
        self.check_overlap(&config)?;
        info!(
            "Trait {} configured: {} options over slots {:?}, weight sum {}",
            trait_index,
            config.num_options(),
            config.byte_slots(),
            config.weight_sum()
        );
        self.traits[trait_index - 1] = Some(config);
        Ok(())
    }

    /// Replace only the weight tables of an already laid-out trait
    pub fn set_trait_weight(
        &mut self,
        trait_index: usize,
        base_weight: Vec<u32>,
        max_bonus_weight: Vec<u32>,
    ) -> Result<(), RevealError> {
        self.check_index(trait_index)?;
        let config = self.traits[trait_index - 1]
            .as_mut()
            .ok_or_else(|| RevealError::ConfigurationMismatch {
                trait_index,
                reason: "no byte layout configured".to_string(),
            })?;
        config.set_weights(base_weight, max_bonus_weight)?;
        info!("Trait {} weights updated, weight sum {}", trait_index, config.weight_sum());
        Ok(())
    }

    /// Configured trait, or `EmptyConfiguration` if the slot is still blank
    pub fn get(&self, trait_index: usize) -> Result<&TraitConfig, RevealError> {
        self.check_index(trait_index)?;
        self.traits[trait_index - 1]
            .as_ref()
            .ok_or(RevealError::EmptyConfiguration(trait_index))
    }

    pub fn trait_weight(&self, trait_index: usize) -> Result<&[u32], RevealError> {
        Ok(self.get(trait_index)?.base_weight())
    }

    pub fn trait_weight_max_bonus(&self, trait_index: usize) -> Result<&[u32], RevealError> {
        Ok(self.get(trait_index)?.max_bonus_weight())
    }

    pub fn trait_weight_sum(&self, trait_index: usize) -> Result<u64, RevealError> {
        Ok(self.get(trait_index)?.weight_sum())
    }

    /// All traits in encoding order; fails on the first blank slot
    pub fn ordered(&self) -> Result<Vec<&TraitConfig>, RevealError> {
        (1..=self.trait_count()).map(|i| self.get(i)).collect()
    }

    /// Highest genome byte owned by any configured trait
    pub fn highest_slot(&self) -> Option<usize> {
        self.traits
            .iter()
            .flatten()
            .flat_map(|c| c.byte_slots().iter().copied())
            .max()
    }

    fn check_index(&self, trait_index: usize) -> Result<(), RevealError> {
        if trait_index == 0 || trait_index > self.trait_count() {
            return Err(RevealError::UnknownTrait(trait_index));
        }
        Ok(())
    }

    fn check_overlap(&self, config: &TraitConfig) -> Result<(), RevealError> {
        for other in self.traits.iter().flatten() {
            if other.index() == config.index() {
                continue;
            }
            if let Some(&slot) = config
                .byte_slots()
                .iter()
                .find(|s| other.byte_slots().contains(*s))
            {
                return Err(RevealError::SlotConflict {
                    slot,
                    owner: other.index(),
                });
            }
        }
        Ok(())
    }

    /// Load a registry from a JSON layout file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RevealError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let file: RegistryFile = serde_json::from_str(&data)?;
        let mut registry = Self::new(file.trait_count);
        for layout in file.traits {
            registry.set_trait_config(
                layout.trait_index,
                layout.byte_slots,
                layout.option_data,
                layout.base_weight,
                layout.max_bonus_weight,
            )?;
        }
        info!(
            "Loaded trait registry from {} ({} traits)",
            path.as_ref().display(),
            registry.trait_count()
        );
        Ok(registry)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), RevealError> {
        let file = RegistryFile {
            trait_count: self.trait_count(),
            traits: self.traits.iter().flatten().map(TraitConfig::to_layout).collect(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }
}
