//! Starknet field element (`felt252`) as a 32-byte big-endian value.
//!
//! The registry contract keys wallets by a `felt252`. BitCred only ever
//! produces felts by truncating a SHA-256 digest to 31 bytes, so those values
//! are strictly below 2^248. Values read back from the ledger may use the
//! full range up to the field modulus `P = 2^251 + 17 * 2^192 + 1`.
//!
//! Hex formatting follows the registry's calldata convention: `0x` prefix,
//! lowercase, no leading zeros, and `0x0` for zero.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::FELT_TRUNCATED_BYTES;
use crate::error::FeltError;

/// The Stark field modulus, big-endian.
pub const MODULUS: [u8; 32] = [
    0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
];

/// A field element below [`MODULUS`], stored big-endian.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Felt([u8; 32]);

impl Felt {
    pub const ZERO: Self = Self([0u8; 32]);

    /// Interpret the first 31 bytes of `digest` as a big-endian integer.
    ///
    /// Panics if `digest` is shorter than 31 bytes; callers pass SHA-256 output.
    pub fn from_truncated_digest(digest: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        bytes[32 - FELT_TRUNCATED_BYTES..].copy_from_slice(&digest[..FELT_TRUNCATED_BYTES]);
        Self(bytes)
    }

    /// Build from big-endian bytes, rejecting values at or above the modulus.
    pub fn from_be_bytes(bytes: [u8; 32]) -> Result<Self, FeltError> {
        if bytes >= MODULUS {
            return Err(FeltError::OutOfRange(hex::encode(bytes)));
        }
        Ok(Self(bytes))
    }

    pub fn from_u128(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[16..].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }

    /// Parse a hex string with or without `0x`. Odd digit counts are allowed.
    pub fn from_hex(s: &str) -> Result<Self, FeltError> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() {
            return Err(FeltError::InvalidHex(s.to_string()));
        }
        if digits.len() > 64 {
            return Err(FeltError::TooLong(s.to_string()));
        }
        let padded = format!("{digits:0>64}");
        let decoded = hex::decode(&padded).map_err(|_| FeltError::InvalidHex(s.to_string()))?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&decoded);
        Self::from_be_bytes(bytes)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// The low 31 bytes. Lossless for every felt BitCred derives itself.
    pub fn to_truncated_bytes(&self) -> [u8; FELT_TRUNCATED_BYTES] {
        let mut out = [0u8; FELT_TRUNCATED_BYTES];
        out.copy_from_slice(&self.0[32 - FELT_TRUNCATED_BYTES..]);
        out
    }

    /// `Some` when the value fits in a `u128`.
    pub fn to_u128(&self) -> Option<u128> {
        if self.0[..16].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 16];
        low.copy_from_slice(&self.0[16..]);
        Some(u128::from_be_bytes(low))
    }

    /// Number of significant bits.
    pub fn bits(&self) -> u32 {
        match self.0.iter().position(|b| *b != 0) {
            Some(i) => (32 - i as u32) * 8 - self.0[i].leading_zeros(),
            None => 0,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Registry-style hex: `0x` prefixed, no leading zeros.
    pub fn to_hex(&self) -> String {
        let full = hex::encode(self.0);
        let trimmed = full.trim_start_matches('0');
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{trimmed}")
        }
    }
}

impl fmt::Display for Felt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Felt {
    type Err = FeltError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<u64> for Felt {
    fn from(value: u64) -> Self {
        Self::from_u128(value as u128)
    }
}

impl Serialize for Felt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Felt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
