//! TraitConfig — layout and probability tables for a single trait slot
//!
//! Option `k` of a trait owns `option_data[k * slots .. (k + 1) * slots]`,
//! copied into the genome at the positions listed in `byte_slots`.

use crate::error::RevealError;
use crate::genome::GENOME_LEN;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;

/// Upper bound of the bonus interpolation parameter
pub const MAX_BONUS: u8 = 25;

/// Raw, unvalidated trait layout as found in configuration files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitLayout {
    pub trait_index: usize,
    pub byte_slots: Vec<usize>,
    pub option_data: Vec<u8>,
    pub base_weight: Vec<u32>,
    pub max_bonus_weight: Vec<u32>,
}

/// A validated trait configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitConfig {
    index: usize,
    byte_slots: Vec<usize>,
    option_data: Vec<u8>,
    base_weight: Vec<u32>,
    max_bonus_weight: Vec<u32>,
    /// Sum of `base_weight`, kept in step with every weight write
    weight_sum: u64,
}

impl TraitConfig {
    pub fn new(
        index: usize,
        byte_slots: Vec<usize>,
        option_data: Vec<u8>,
        base_weight: Vec<u32>,
        max_bonus_weight: Vec<u32>,
    ) -> Result<Self, RevealError> {
        for (i, &slot) in byte_slots.iter().enumerate() {
            // byte 0 is the version marker
            if slot == 0 || slot >= GENOME_LEN {
                return Err(RevealError::SlotOutOfRange(slot));
            }
            if byte_slots[..i].contains(&slot) {
                return Err(RevealError::SlotConflict { slot, owner: index });
            }
        }
        if byte_slots.len() * base_weight.len() != option_data.len() {
            return Err(RevealError::ConfigurationMismatch {
                trait_index: index,
                reason: format!(
                    "{} slots x {} options != {} option bytes",
                    byte_slots.len(),
                    base_weight.len(),
                    option_data.len()
                ),
            });
        }
        let weight_sum = Self::checked_weights(index, &base_weight, &max_bonus_weight)?;
        Ok(Self {
            index,
            byte_slots,
            option_data,
            base_weight,
            max_bonus_weight,
            weight_sum,
        })
    }

    pub fn from_layout(layout: TraitLayout) -> Result<Self, RevealError> {
        Self::new(
            layout.trait_index,
            layout.byte_slots,
            layout.option_data,
            layout.base_weight,
            layout.max_bonus_weight,
        )
    }

    pub fn to_layout(&self) -> TraitLayout {
        TraitLayout {
            trait_index: self.index,
            byte_slots: self.byte_slots.clone(),
            option_data: self.option_data.clone(),
            base_weight: self.base_weight.clone(),
            max_bonus_weight: self.max_bonus_weight.clone(),
        }
    }

    /// Replace both weight tables, keeping the byte layout
    pub fn set_weights(
        &mut self,
        base_weight: Vec<u32>,
        max_bonus_weight: Vec<u32>,
    ) -> Result<(), RevealError> {
        if self.byte_slots.len() * base_weight.len() != self.option_data.len() {
            return Err(RevealError::ConfigurationMismatch {
                trait_index: self.index,
                reason: format!(
                    "{} options do not fit the existing {} option bytes",
                    base_weight.len(),
                    self.option_data.len()
                ),
            });
        }
        let weight_sum = Self::checked_weights(self.index, &base_weight, &max_bonus_weight)?;
        self.base_weight = base_weight;
        self.max_bonus_weight = max_bonus_weight;
        self.weight_sum = weight_sum;
        Ok(())
    }

    /// Validates the weight tables and returns the base weight sum.
    ///
    /// The max-bonus table must not sum below the base table: the sampler's
    /// divisor is derived from the base sum only, so a smaller max-bonus sum
    /// could leave the linear scan without a selection.
    fn checked_weights(index: usize, base: &[u32], max_bonus: &[u32]) -> Result<u64, RevealError> {
        if base.len() != max_bonus.len() {
            return Err(RevealError::ConfigurationMismatch {
                trait_index: index,
                reason: format!(
                    "{} base weights vs {} max-bonus weights",
                    base.len(),
                    max_bonus.len()
                ),
            });
        }
        let base_sum: u64 = base.iter().map(|&w| w as u64).sum();
        let max_sum: u64 = max_bonus.iter().map(|&w| w as u64).sum();
        if max_sum < base_sum {
            return Err(RevealError::ConfigurationMismatch {
                trait_index: index,
                reason: format!("max-bonus weight sum {} below base sum {}", max_sum, base_sum),
            });
        }
        if max_sum.checked_mul(MAX_BONUS as u64).is_none() {
            return Err(RevealError::WeightOverflow(index));
        }
        Ok(base_sum)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn byte_slots(&self) -> &[usize] {
        &self.byte_slots
    }

    pub fn option_data(&self) -> &[u8] {
        &self.option_data
    }

    pub fn base_weight(&self) -> &[u32] {
        &self.base_weight
    }

    pub fn max_bonus_weight(&self) -> &[u32] {
        &self.max_bonus_weight
    }

    pub fn weight_sum(&self) -> u64 {
        self.weight_sum
    }

    pub fn num_options(&self) -> usize {
        self.base_weight.len()
    }

    /// Bytes written into the genome when `option` is selected
    pub fn option_bytes(&self, option: usize) -> Option<&[u8]> {
        let width = self.byte_slots.len();
        self.option_data.get(option * width..(option + 1) * width)
    }

    /// `base[k] * (MAX_BONUS - bonus) + max_bonus[k] * bonus`
    pub fn effective_weight(&self, option: usize, bonus_level: u8) -> u64 {
        let bonus = bonus_level.min(MAX_BONUS) as u64;
        self.base_weight[option] as u64 * (MAX_BONUS as u64 - bonus)
            + self.max_bonus_weight[option] as u64 * bonus
    }

    /// `weight_sum * MAX_BONUS`, or `None` when nothing can be selected
    pub fn divisor(&self) -> Option<NonZeroU64> {
        if self.num_options() == 0 {
            return None;
        }
        NonZeroU64::new(self.weight_sum * MAX_BONUS as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_sum_recomputed() {
        let mut cfg = TraitConfig::new(1, vec![1], vec![0, 1, 2, 3], vec![1, 3, 4, 1], vec![5, 2, 1, 1])
            .unwrap();
        assert_eq!(cfg.weight_sum(), 9);
        cfg.set_weights(vec![2, 2, 2, 2], vec![2, 2, 2, 2]).unwrap();
        assert_eq!(cfg.weight_sum(), 8);
        assert_eq!(cfg.divisor().unwrap().get(), 200);
    }

    #[test]
    fn test_length_mismatches_rejected() {
        let err = TraitConfig::new(2, vec![1], vec![0, 1], vec![1, 1], vec![1]).unwrap_err();
        assert!(matches!(err, RevealError::ConfigurationMismatch { trait_index: 2, .. }));

        let err = TraitConfig::new(2, vec![1, 2], vec![0, 1], vec![1, 1], vec![1, 1]).unwrap_err();
        assert!(matches!(err, RevealError::ConfigurationMismatch { .. }));
    }

    #[test]
    fn test_slot_bounds() {
        assert_eq!(
            TraitConfig::new(1, vec![0], vec![0], vec![1], vec![1]).unwrap_err(),
            RevealError::SlotOutOfRange(0)
        );
        assert_eq!(
            TraitConfig::new(1, vec![32], vec![0], vec![1], vec![1]).unwrap_err(),
            RevealError::SlotOutOfRange(32)
        );
        assert_eq!(
            TraitConfig::new(3, vec![4, 4], vec![0, 0], vec![1], vec![1]).unwrap_err(),
            RevealError::SlotConflict { slot: 4, owner: 3 }
        );
    }

    #[test]
    fn test_max_bonus_sum_below_base_rejected() {
        let err = TraitConfig::new(1, vec![1], vec![0, 1], vec![2, 2], vec![1, 1]).unwrap_err();
        assert!(matches!(err, RevealError::ConfigurationMismatch { .. }));
    }

    #[test]
    fn test_option_bytes_and_effective_weight() {
        let cfg = TraitConfig::new(4, vec![5, 6], vec![10, 11, 20, 21], vec![1, 0], vec![0, 1]).unwrap();
        assert_eq!(cfg.option_bytes(1), Some(&[20u8, 21][..]));
        assert_eq!(cfg.option_bytes(2), None);
        assert_eq!(cfg.effective_weight(0, 0), 25);
        assert_eq!(cfg.effective_weight(1, 0), 0);
        assert_eq!(cfg.effective_weight(0, MAX_BONUS), 0);
        assert_eq!(cfg.effective_weight(1, MAX_BONUS), 25);
    }

    #[test]
    fn test_empty_config_has_no_divisor() {
        let cfg = TraitConfig::new(1, vec![1], vec![], vec![], vec![]).unwrap();
        assert!(cfg.divisor().is_none());
        let zero = TraitConfig::new(1, vec![1], vec![0], vec![0], vec![0]).unwrap();
        assert!(zero.divisor().is_none());
    }

    #[test]
    fn test_layout_roundtrip() {
        let cfg = TraitConfig::new(2, vec![2], vec![0, 1], vec![1, 1], vec![1, 1]).unwrap();
        let back = TraitConfig::from_layout(cfg.to_layout()).unwrap();
        assert_eq!(back, cfg);
    }
}
