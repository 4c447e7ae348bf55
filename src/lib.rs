//! genome-core — verifiable, bias-resistant trait genomes
//!
//! A token's genome is derived from three inputs no single party controls:
//! an operator secret committed by hash in advance, randomness delivered once
//! by an external source, and the token's identity and bonus level. The
//! resulting seed is expanded by a weighted sampler into a 32-byte record that
//! anyone can recompute from the published values.

pub mod error;
pub mod seed;
pub mod traits;
pub mod genome;
pub mod randomness;
pub mod protocol;
pub mod storage;

pub use error::RevealError;
pub use genome::{compute_genome, Genome, GenomeEncoder};
pub use protocol::{CommitmentState, GenomeEvent, GenomeProvider, ProviderConfig, SeedCommitment};
pub use randomness::{DeterministicSource, OracleSource, RandomnessSource};
pub use seed::{compute_token_seed, hash_secret, TokenId, Word};
pub use storage::CommitmentStore;
pub use traits::{TraitConfig, TraitConfigRegistry, MAX_BONUS};
