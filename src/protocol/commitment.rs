//! SeedCommitment — the per-token commit-reveal record
//!
//! Every field is written at most once and only moves forward:
//! secret hash → reveal request → randomness → secret + seed + genome.

use crate::error::RevealError;
use crate::genome::{compute_genome, Genome};
use crate::seed::{compute_token_seed, hash_secret, TokenId, Word};
use crate::traits::TraitConfigRegistry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of a token in the commit-reveal protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommitmentState {
    Uncommitted,
    HashPublished,
    RandomnessRequested,
    RandomnessReceived,
    GenomeComputed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedCommitment {
    pub token_id: TokenId,
    /// Published commitment to the secret
    pub secret_hash: Option<Word>,
    /// Guard against duplicate randomness requests
    pub requested: bool,
    /// Id of the randomness request issued for this token
    pub request_id: Option<String>,
    /// Fixed when the reveal is requested
    pub bonus_level: u8,
    pub random_value: Option<Word>,
    /// When the randomness arrived
    pub reveal_timestamp: Option<DateTime<Utc>>,
    pub secret: Option<Word>,
    pub token_seed: Option<Word>,
    pub genome: Option<Genome>,
}

impl SeedCommitment {
    pub fn new(token_id: TokenId) -> Self {
        Self {
            token_id,
            secret_hash: None,
            requested: false,
            request_id: None,
            bonus_level: 0,
            random_value: None,
            reveal_timestamp: None,
            secret: None,
            token_seed: None,
            genome: None,
        }
    }

    pub fn state(&self) -> CommitmentState {
        if self.genome.is_some() {
            CommitmentState::GenomeComputed
        } else if self.random_value.is_some() {
            CommitmentState::RandomnessReceived
        } else if self.requested {
            CommitmentState::RandomnessRequested
        } else if self.secret_hash.is_some() {
            CommitmentState::HashPublished
        } else {
            CommitmentState::Uncommitted
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.genome.is_some()
    }

    /// Independently re-derive the seed and genome from the published
    /// values. `Ok(false)` if the record is not finalized or any value
    /// fails to reproduce.
    pub fn verify(&self, registry: &TraitConfigRegistry) -> Result<bool, RevealError> {
        let (Some(hash), Some(secret), Some(random), Some(seed), Some(genome)) = (
            self.secret_hash,
            self.secret,
            self.random_value,
            self.token_seed,
            self.genome,
        ) else {
            return Ok(false);
        };
        if hash_secret(&secret) != hash {
            return Ok(false);
        }
        let derived = compute_token_seed(self.token_id, self.bonus_level, &secret, &random);
        if derived != seed {
            return Ok(false);
        }
        Ok(compute_genome(registry, &derived, self.bonus_level)? == genome)
    }

    pub fn summary(&self) -> String {
        format!(
            "Token {} | state={:?} | bonus={} | genome={}",
            self.token_id,
            self.state(),
            self.bonus_level,
            self.genome.map(|g| g.to_hex()).unwrap_or_else(|| "-".to_string())
        )
    }
}
