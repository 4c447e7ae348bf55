//! Seed primitives — 256-bit words and the commit/derive hashes
//!
//! Every entropy-bearing value in the protocol (secret, oracle randomness,
//! token seed) is a 256-bit big-endian [`Word`].

mod word;
mod hash;

pub use word::{Word, WORD_LEN};
pub use hash::{compute_token_seed, hash_secret};

/// Identifier of the entity a genome is generated for
pub type TokenId = u64;
