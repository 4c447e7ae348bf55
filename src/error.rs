//! Errors raised by configuration, sampling and the reveal protocol
//!
//! Every variant is a precondition violation reported synchronously to the
//! caller. Nothing is retried internally and a failed call leaves no partial
//! state behind.

use crate::seed::TokenId;

/// Errors for all genome-core operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RevealError {
    #[error("Secret hash already committed for token {0}")]
    AlreadyCommitted(TokenId),

    #[error("Reveal already requested for token {0}")]
    AlreadyRequested(TokenId),

    #[error("Randomness already delivered for token {0}")]
    DuplicateRandomness(TokenId),

    #[error("Secret already revealed for token {0}")]
    AlreadyRevealed(TokenId),

    #[error("Caller '{0}' is not an authorized operator")]
    Unauthorized(String),

    #[error("Revealed secret does not match the commitment of token {0}")]
    HashMismatch(TokenId),

    #[error("Randomness not yet delivered for token {0}")]
    RandomnessPending(TokenId),

    #[error("No outstanding randomness request matches token {0}")]
    NotRequested(TokenId),

    #[error("Bonus level {level} exceeds maximum {max}")]
    BonusOutOfRange { level: u8, max: u8 },

    #[error("Trait {0} has no options or a zero weight sum")]
    EmptyConfiguration(usize),

    #[error("Trait {trait_index} configuration mismatch: {reason}")]
    ConfigurationMismatch { trait_index: usize, reason: String },

    #[error("Trait index {0} is outside the configured trait range")]
    UnknownTrait(usize),

    #[error("Byte slot {0} is outside the genome record")]
    SlotOutOfRange(usize),

    #[error("Byte slot {slot} is already owned by trait {owner}")]
    SlotConflict { slot: usize, owner: usize },

    #[error("Trait {0} weights overflow the sampling divisor")]
    WeightOverflow(usize),

    #[error("Randomness source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for RevealError {
    fn from(e: std::io::Error) -> Self {
        RevealError::Storage(e.to_string())
    }
}

impl From<serde_json::Error> for RevealError {
    fn from(e: serde_json::Error) -> Self {
        RevealError::Storage(e.to_string())
    }
}
