//! Protocol notifications
//!
//! Emitted in order for every successful state transition. Consumers (signature
//! services, indexers) read them from the provider's event log.

use crate::genome::Genome;
use crate::seed::{TokenId, Word};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenomeEvent {
    HashPublished {
        token_id: TokenId,
        secret_hash: Word,
    },
    /// Carries the bonus level so external approval schemes can bind to it
    RevealRequested {
        token_id: TokenId,
        request_id: String,
        bonus_level: u8,
        approval: Vec<u8>,
    },
    RandomnessReceived {
        token_id: TokenId,
        random_value: Word,
    },
    GenomeFinalized {
        token_id: TokenId,
        secret: Word,
        token_seed: Word,
        genome: Genome,
    },
}

impl GenomeEvent {
    pub fn token_id(&self) -> TokenId {
        match self {
            GenomeEvent::HashPublished { token_id, .. }
            | GenomeEvent::RevealRequested { token_id, .. }
            | GenomeEvent::RandomnessReceived { token_id, .. }
            | GenomeEvent::GenomeFinalized { token_id, .. } => *token_id,
        }
    }
}

/// An event with its position in the provider's log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub event: GenomeEvent,
}

impl Notification {
    pub fn new(sequence: u64, event: GenomeEvent) -> Self {
        Self {
            sequence,
            timestamp: Utc::now(),
            event,
        }
    }

    /// Serialize to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
