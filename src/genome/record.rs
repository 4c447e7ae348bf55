use super::{GENOME_LEN, GENOME_VERSION};
use crate::error::RevealError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A finalized 32-byte genome record
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Genome([u8; GENOME_LEN]);

impl Default for Genome {
    fn default() -> Self {
        let mut bytes = [0u8; GENOME_LEN];
        bytes[0] = GENOME_VERSION;
        Self(bytes)
    }
}

impl Genome {
    pub fn from_bytes(bytes: [u8; GENOME_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; GENOME_LEN] {
        &self.0
    }

    pub fn version(&self) -> u8 {
        self.0[0]
    }

    pub fn get(&self, pos: usize) -> Option<u8> {
        self.0.get(pos).copied()
    }

    /// Bounds-checked write of one byte
    pub fn set(&mut self, pos: usize, value: u8) -> Result<(), RevealError> {
        let byte = self.0.get_mut(pos).ok_or(RevealError::SlotOutOfRange(pos))?;
        *byte = value;
        Ok(())
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; GENOME_LEN];
        hex::decode_to_slice(s.strip_prefix("0x").unwrap_or(s), &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Genome({})", self.to_hex())
    }
}

impl Serialize for Genome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Genome {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Genome::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
