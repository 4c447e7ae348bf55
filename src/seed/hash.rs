//! Commitment and seed derivation hashes
//!
//! Both hashes are SHA-256. Seed inputs are packed as four 32-byte big-endian
//! words (token id, bonus level, secret, randomness) so the derivation can be
//! reproduced by anyone from the published values.

use super::{TokenId, Word};
use sha2::{Digest, Sha256};

/// Commitment to a secret: `sha256(secret)`
pub fn hash_secret(secret: &Word) -> Word {
    Word::from_bytes(Sha256::digest(secret.as_bytes()).into())
}

/// `sha256(tokenId ‖ bonusLevel ‖ secret ‖ randomValue)`, each a 32-byte word
pub fn compute_token_seed(
    token_id: TokenId,
    bonus_level: u8,
    secret: &Word,
    random_value: &Word,
) -> Word {
    let mut hasher = Sha256::new();
    hasher.update(Word::from(token_id).as_bytes());
    hasher.update(Word::from(bonus_level as u64).as_bytes());
    hasher.update(secret.as_bytes());
    hasher.update(random_value.as_bytes());
    Word::from_bytes(hasher.finalize().into())
}
