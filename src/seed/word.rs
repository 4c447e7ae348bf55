//! Word — a 256-bit unsigned integer stored big-endian
//!
//! Only the arithmetic the sampler and encoder need is provided: division with
//! remainder by a 64-bit divisor, and byte-wise right shifts for filler bytes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::num::NonZeroU64;

/// Width of a word in bytes
pub const WORD_LEN: usize = 32;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Word([u8; WORD_LEN]);

impl Word {
    pub const ZERO: Word = Word([0u8; WORD_LEN]);

    pub fn from_bytes(bytes: [u8; WORD_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; WORD_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }

    /// Schoolbook long division, one byte at a time.
    /// Returns `(self / divisor, self % divisor)`.
    pub fn div_rem(&self, divisor: NonZeroU64) -> (Word, u64) {
        let d = divisor.get() as u128;
        let mut quotient = [0u8; WORD_LEN];
        let mut rem: u128 = 0;
        for (q, &b) in quotient.iter_mut().zip(self.0.iter()) {
            // rem < d <= 2^64, so the shifted value stays below 2^72
            rem = (rem << 8) | b as u128;
            *q = (rem / d) as u8;
            rem %= d;
        }
        (Word(quotient), rem as u64)
    }

    /// Least significant byte
    pub fn low_byte(&self) -> u8 {
        self.0[WORD_LEN - 1]
    }

    /// `self >> 8`
    pub fn shr8(&self) -> Word {
        let mut out = [0u8; WORD_LEN];
        out[1..].copy_from_slice(&self.0[..WORD_LEN - 1]);
        Word(out)
    }

    /// `0x`-prefixed, zero-padded hex
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse hex with or without `0x`. Short inputs are left-padded, so
    /// `"0xAA"` is the integer 170.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.len() > WORD_LEN * 2 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let padded = format!("{:0>width$}", digits, width = WORD_LEN * 2);
        let mut bytes = [0u8; WORD_LEN];
        hex::decode_to_slice(padded, &mut bytes)?;
        Ok(Self(bytes))
    }
}

impl From<u64> for Word {
    fn from(v: u64) -> Self {
        let mut bytes = [0u8; WORD_LEN];
        bytes[WORD_LEN - 8..].copy_from_slice(&v.to_be_bytes());
        Self(bytes)
    }
}

impl From<u128> for Word {
    fn from(v: u128) -> Self {
        let mut bytes = [0u8; WORD_LEN];
        bytes[WORD_LEN - 16..].copy_from_slice(&v.to_be_bytes());
        Self(bytes)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({})", self.to_hex())
    }
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Word::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nz(v: u64) -> NonZeroU64 {
        NonZeroU64::new(v).unwrap()
    }

    #[test]
    fn test_div_rem_small_values() {
        let (q, r) = Word::from(1000u64).div_rem(nz(225));
        assert_eq!(q, Word::from(4u64));
        assert_eq!(r, 100);
    }

    #[test]
    fn test_div_rem_matches_u128() {
        let v: u128 = 0x0123_4567_89ab_cdef_fedc_ba98_7654_3210;
        let d = 13_183_593_750u64;
        let (q, r) = Word::from(v).div_rem(nz(d));
        assert_eq!(q, Word::from(v / d as u128));
        assert_eq!(r as u128, v % d as u128);
    }

    #[test]
    fn test_div_rem_full_width() {
        let max = Word::from_bytes([0xFF; WORD_LEN]);
        let (q, r) = max.div_rem(nz(256));
        assert_eq!(r, 0xFF);
        assert_eq!(q, max.shr8());
    }

    #[test]
    fn test_shr8_and_low_byte() {
        let w = Word::from(0x0574_AFEF_0Cu64);
        assert_eq!(w.low_byte(), 0x0C);
        assert_eq!(w.shr8().low_byte(), 0xEF);
        assert_eq!(w.shr8(), Word::from(0x05_74AF_EFu64));
    }

    #[test]
    fn test_hex_parsing() {
        assert_eq!(Word::from_hex("0xAA").unwrap(), Word::from(0xAAu64));
        assert_eq!(Word::from_hex("bb").unwrap(), Word::from(0xBBu64));
        assert_eq!(Word::from_hex("0x").unwrap(), Word::ZERO);
        assert!(Word::from_hex(&"f".repeat(65)).is_err());
        assert!(Word::from_hex("0xzz").is_err());
    }

    #[test]
    fn test_serde_as_hex_string() {
        let w = Word::from(0x19u64);
        let json = serde_json::to_string(&w).unwrap();
        assert_eq!(json, format!("\"0x{}19\"", "0".repeat(62)));
        let back: Word = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
