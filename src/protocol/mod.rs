//! Commit-reveal protocol
//!
//! - SeedCommitment: per-token write-once record and its state
//! - GenomeProvider: operator-facing state machine over all tokens
//! - GenomeEvent / Notification: ordered notifications of each transition

mod commitment;
mod events;
mod provider;

pub use commitment::{CommitmentState, SeedCommitment};
pub use events::{GenomeEvent, Notification};
pub use provider::{GenomeProvider, ProviderConfig};
