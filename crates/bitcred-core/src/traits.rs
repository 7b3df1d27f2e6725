//! Capability interfaces for the two effects in the scoring pipeline.
//!
//! - [`Clock`] — wall-clock unix seconds (score hashes and commitments are timestamped)
//! - [`RandomSource`] — secret commitment nonces
//!
//! Production code uses [`SystemClock`] and [`OsRandom`]. Tests and replays
//! inject [`FixedClock`] and [`FixedRandom`] to make every output reproducible.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::OsRng;
use rand::RngCore;

use crate::constants::NONCE_LEN;

/// Source of the current unix time in seconds.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> u64;
}

/// Source of fresh commitment nonces.
///
/// Implementations used outside tests must be cryptographically secure and
/// must never return the same nonce twice.
pub trait RandomSource: Send + Sync {
    fn nonce(&self) -> [u8; NONCE_LEN];
}

/// The operating system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

/// A clock frozen at a given unix time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_unix(&self) -> u64 {
        self.0
    }
}

/// Nonces from the operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn nonce(&self) -> [u8; NONCE_LEN] {
        let mut bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut bytes);
        bytes
    }
}

/// Always returns the same nonce. Only for deterministic replays and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRandom(pub [u8; NONCE_LEN]);

impl RandomSource for FixedRandom {
    fn nonce(&self) -> [u8; NONCE_LEN] {
        self.0
    }
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now_unix(&self) -> u64 {
        (**self).now_unix()
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &T {
    fn nonce(&self) -> [u8; NONCE_LEN] {
        (**self).nonce()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now_unix(&self) -> u64 {
        (**self).now_unix()
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Arc<T> {
    fn nonce(&self) -> [u8; NONCE_LEN] {
        (**self).nonce()
    }
}
