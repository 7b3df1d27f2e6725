//! Address ids and salted score commitments.
//!
//! `commitment = SHA-256(address_id[31] || tier[1] || nonce[32] || timestamp_be[8])`,
//! truncated to 31 bytes. The nonce stops anyone from brute-forcing the tier
//! behind a published commitment; it is returned to the caller and never
//! published.
//!
//! The address id is deterministic on purpose. It is the registry's lookup
//! key, so every re-score of the same wallet lands on the same entry and is
//! linkable over time. Only the commitment is randomized.

use std::fmt;

use bitcred_core::constants::NONCE_LEN;
use bitcred_core::traits::{Clock, OsRandom, RandomSource, SystemClock};
use bitcred_core::{Felt, Tier};
use bitcred_scoring::ScoreResult;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Registry key for `address`: SHA-256 of its UTF-8 bytes, first 31 bytes,
/// big-endian. Always below 2^248.
pub fn derive_address_id(address: &str) -> Felt {
    Felt::from_truncated_digest(&Sha256::digest(address.as_bytes()))
}

/// The commitment for explicit inputs. Pure.
pub fn commit(address_id: &Felt, tier: Tier, nonce: &[u8; NONCE_LEN], timestamp: u64) -> Felt {
    let mut hasher = Sha256::new();
    hasher.update(address_id.to_truncated_bytes());
    hasher.update([tier.as_u8()]);
    hasher.update(nonce);
    hasher.update(timestamp.to_be_bytes());
    Felt::from_truncated_digest(&hasher.finalize())
}

/// Secret commitment salt, wiped from memory on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Nonce {
    bytes: [u8; NONCE_LEN],
}

impl Nonce {
    pub fn from_bytes(bytes: [u8; NONCE_LEN]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.bytes
    }

    /// Lowercase hex, 64 digits. Hand this to the wallet owner, not the chain.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }
}

impl Clone for Nonce {
    fn clone(&self) -> Self {
        Self { bytes: self.bytes }
    }
}

impl PartialEq for Nonce {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl Eq for Nonce {}

impl fmt::Debug for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Nonce").field("bytes", &"[REDACTED]").finish()
    }
}

/// A score bound to a wallet id, ready for the registry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commitment {
    pub address_hash: Felt,
    pub commitment: Felt,
    pub nonce: Nonce,
    pub tier: Tier,
    pub score: u16,
    /// Unix seconds when the commitment was made.
    pub timestamp: u64,
}

impl Commitment {
    pub fn address_hash_hex(&self) -> String {
        self.address_hash.to_hex()
    }

    pub fn commitment_hex(&self) -> String {
        self.commitment.to_hex()
    }

    pub fn nonce_hex(&self) -> String {
        self.nonce.to_hex()
    }

    /// Recompute the commitment from the retained nonce.
    pub fn verify(&self) -> bool {
        commit(&self.address_hash, self.tier, self.nonce.as_bytes(), self.timestamp) == self.commitment
    }
}

/// Produces commitments using an injected clock and nonce source.
#[derive(Debug, Clone, Default)]
pub struct CommitmentGenerator<C = SystemClock, R = OsRandom> {
    clock: C,
    rng: R,
}

impl<C: Clock, R: RandomSource> CommitmentGenerator<C, R> {
    pub fn new(clock: C, rng: R) -> Self {
        Self { clock, rng }
    }

    /// Commit to `score`'s tier for `address` with a fresh nonce.
    pub fn generate(&self, address: &str, score: &ScoreResult) -> Commitment {
        let address_hash = derive_address_id(address);
        let nonce = Nonce::from_bytes(self.rng.nonce());
        let timestamp = self.clock.now_unix();
        let commitment = commit(&address_hash, score.tier, nonce.as_bytes(), timestamp);

        debug!(address_id = %address_hash, tier = score.tier.as_u8(), timestamp, "commitment generated");

        Commitment {
            address_hash,
            commitment,
            nonce,
            tier: score.tier,
            score: score.raw_score,
            timestamp,
        }
    }
}

/// Commit with the system clock and the OS CSPRNG.
pub fn generate_commitment(address: &str, score: &ScoreResult) -> Commitment {
    CommitmentGenerator::<SystemClock, OsRandom>::default().generate(address, score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcred_core::traits::{FixedClock, FixedRandom};
    use bitcred_core::{Month, MonthlySnapshot, WalletData};
    use bitcred_scoring::{ScoringConfig, Scorer};
    use proptest::prelude::*;

    const GENESIS: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";
    const T0: u64 = 1_717_200_000;

    fn score_for(address: &str) -> ScoreResult {
        let wallet = WalletData::new(
            address,
            vec![],
            vec![MonthlySnapshot::new(Month::new(2024, 6).unwrap(), 0, 0)],
        )
        .unwrap();
        Scorer::new(ScoringConfig::default(), FixedClock(T0)).unwrap().compute(&wallet)
    }

    #[test]
    fn address_id_vector() {
        assert_eq!(
            derive_address_id(GENESIS).to_hex(),
            "0x31a9d2e8a70a091d65a58d2a08f8833abf5e8fa1d741c5400c538c38668cb8"
        );
    }

    #[test]
    fn address_id_is_deterministic_and_distinct() {
        let a = derive_address_id(GENESIS);
        assert_eq!(a, derive_address_id(GENESIS));
        let b = derive_address_id("bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh");
        let c = derive_address_id("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn commit_vector() {
        let id = derive_address_id(GENESIS);
        assert_eq!(
            commit(&id, Tier::One, &[7u8; NONCE_LEN], T0).to_hex(),
            "0xcc3e6699357ecd9eb8d725128f70f448dce8ef53010dd6b69c7231521cd65d"
        );
    }

    #[test]
    fn commit_binds_every_field() {
        let id = derive_address_id(GENESIS);
        let base = commit(&id, Tier::One, &[7u8; NONCE_LEN], T0);
        assert_ne!(base, commit(&id, Tier::Two, &[7u8; NONCE_LEN], T0));
        assert_ne!(base, commit(&id, Tier::One, &[8u8; NONCE_LEN], T0));
        assert_ne!(base, commit(&id, Tier::One, &[7u8; NONCE_LEN], T0 + 1));
        assert_ne!(base, commit(&derive_address_id("other"), Tier::One, &[7u8; NONCE_LEN], T0));
    }

    #[test]
    fn fixed_capabilities_reproduce() {
        let generator = CommitmentGenerator::new(FixedClock(T0), FixedRandom([7u8; NONCE_LEN]));
        let score = score_for(GENESIS);
        let c = generator.generate(GENESIS, &score);
        assert_eq!(c.tier, Tier::Four);
        assert_eq!(c.score, 686);
        assert_eq!(c.timestamp, T0);
        assert_eq!(c.nonce_hex(), "07".repeat(32));
        assert_eq!(c.commitment, commit(&c.address_hash, Tier::Four, &[7u8; NONCE_LEN], T0));
        assert!(c.verify());
        assert_eq!(c, generator.generate(GENESIS, &score));
    }

    #[test]
    fn fresh_nonces_randomize_commitment_only() {
        let score = score_for(GENESIS);
        let a = generate_commitment(GENESIS, &score);
        let b = generate_commitment(GENESIS, &score);
        assert_eq!(a.address_hash, b.address_hash);
        assert_ne!(a.nonce, b.nonce);
        assert_ne!(a.commitment, b.commitment);
        assert!(a.verify() && b.verify());
    }

    #[test]
    fn tampered_tier_fails_verification() {
        let generator = CommitmentGenerator::new(FixedClock(T0), FixedRandom([1u8; NONCE_LEN]));
        let mut c = generator.generate(GENESIS, &score_for(GENESIS));
        c.tier = Tier::One;
        assert!(!c.verify());
    }

    #[test]
    fn nonce_debug_is_redacted() {
        let n = Nonce::from_bytes([0xab; NONCE_LEN]);
        assert!(!format!("{n:?}").contains("ab"));
    }

    proptest! {
        #[test]
        fn ids_fit_248_bits(address in "[a-zA-Z0-9]{26,62}") {
            let id = derive_address_id(&address);
            prop_assert!(id.bits() <= 248);
            prop_assert!(id.to_hex().len() <= 64);
        }

        #[test]
        fn commitments_fit_248_bits(nonce in any::<[u8; 32]>(), ts in any::<u64>()) {
            let c = commit(&derive_address_id(GENESIS), Tier::Three, &nonce, ts);
            prop_assert!(c.bits() <= 248);
        }
    }
}
