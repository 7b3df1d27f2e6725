//! Cairo `u256` values, returned as two felts `(low, high)`.

use std::fmt;

use bitcred_core::Felt;
use serde::{Serialize, Serializer};

/// `low + high * 2^128`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct U256(pub primitive_types::U256);

impl U256 {
    pub const ZERO: Self = Self(primitive_types::U256([0; 4]));

    pub fn from_u128(value: u128) -> Self {
        Self(primitive_types::U256::from(value))
    }

    pub fn from_limbs(low: u128, high: u128) -> Self {
        Self((primitive_types::U256::from(high) << 128) | primitive_types::U256::from(low))
    }

    /// Decode from the two felts of a Cairo `u256`. `None` if either limb
    /// exceeds 128 bits.
    pub fn from_felts(low: &Felt, high: &Felt) -> Option<Self> {
        Some(Self::from_limbs(low.to_u128()?, high.to_u128()?))
    }

    pub fn low(&self) -> u128 {
        self.0.low_u128()
    }

    pub fn high(&self) -> u128 {
        (self.0 >> 128).low_u128()
    }

    pub fn to_u128(&self) -> Option<u128> {
        (self.high() == 0).then(|| self.low())
    }

    /// Lossy conversion for display amounts.
    pub fn to_f64(&self) -> f64 {
        self.high() as f64 * 2f64.powi(128) + self.low() as f64
    }

    /// `self / divisor` as a float, e.g. 6-decimal stablecoin units to dollars.
    pub fn scaled(&self, divisor: f64) -> f64 {
        self.to_f64() / divisor
    }
}

impl From<u128> for U256 {
    fn from(value: u128) -> Self {
        Self::from_u128(value)
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Serialized as a decimal string; JSON numbers cannot hold 256 bits.
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
