//! Registry calldata.
//!
//! JSON form, compared byte-for-byte by the submitting frontend:
//!
//! ```text
//! {"btc_address_hash":"0x31a9…","score":686,"proof":["0xcc3e…"]}
//! ```
//!
//! Integers are `0x`-prefixed lowercase hex without leading zeros. `proof`
//! holds the commitment alone until a real proof array replaces it; index 0
//! is always the commitment.

use bitcred_core::Felt;
use serde::{Deserialize, Serialize};

use crate::commitment::Commitment;

/// Arguments of `register_score` / `update_score`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct OnchainCalldata {
    pub btc_address_hash: Felt,
    pub score: u16,
    pub proof: Vec<Felt>,
}

impl OnchainCalldata {
    /// Flatten into the felt array of an invoke transaction. `Span<felt252>`
    /// is length-prefixed on the wire.
    pub fn to_felts(&self) -> Vec<Felt> {
        let mut felts = Vec::with_capacity(3 + self.proof.len());
        felts.push(self.btc_address_hash);
        felts.push(Felt::from(self.score as u64));
        felts.push(Felt::from(self.proof.len() as u64));
        felts.extend_from_slice(&self.proof);
        felts
    }
}

/// Project a commitment onto registry calldata.
pub fn to_calldata(commitment: &Commitment) -> OnchainCalldata {
    OnchainCalldata {
        btc_address_hash: commitment.address_hash,
        score: commitment.score,
        proof: vec![commitment.commitment],
    }
}

/// Registry write entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryEntryPoint {
    RegisterScore,
    UpdateScore,
}

impl RegistryEntryPoint {
    pub fn name(self) -> &'static str {
        match self {
            Self::RegisterScore => "register_score",
            Self::UpdateScore => "update_score",
        }
    }

    /// Pick the call for an id given its registry `last_updated` value.
    /// The registry reports 0 for ids it has never seen.
    pub fn for_last_updated(last_updated: u64) -> Self {
        if last_updated == 0 {
            Self::RegisterScore
        } else {
            Self::UpdateScore
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::{commit, derive_address_id, Nonce};
    use bitcred_core::Tier;

    fn commitment() -> Commitment {
        let address_hash = derive_address_id("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa");
        let nonce = [7u8; 32];
        Commitment {
            address_hash,
            commitment: commit(&address_hash, Tier::One, &nonce, 1_717_200_000),
            nonce: Nonce::from_bytes(nonce),
            tier: Tier::One,
            score: 831,
            timestamp: 1_717_200_000,
        }
    }

    #[test]
    fn projects_commitment() {
        let c = commitment();
        let calldata = to_calldata(&c);
        assert_eq!(calldata.btc_address_hash, c.address_hash);
        assert_eq!(calldata.score, 831);
        assert_eq!(calldata.proof, vec![c.commitment]);
    }

    #[test]
    fn json_shape_is_exact() {
        let json = serde_json::to_string(&to_calldata(&commitment())).unwrap();
        assert_eq!(
            json,
            concat!(
                r#"{"btc_address_hash":"0x31a9d2e8a70a091d65a58d2a08f8833abf5e8fa1d741c5400c538c38668cb8","#,
                r#""score":831,"#,
                r#""proof":["0xcc3e6699357ecd9eb8d725128f70f448dce8ef53010dd6b69c7231521cd65d"]}"#
            )
        );
        let back: OnchainCalldata = serde_json::from_str(&json).unwrap();
        assert_eq!(back, to_calldata(&commitment()));
    }

    #[test]
    fn small_values_have_no_leading_zeros() {
        let calldata = OnchainCalldata {
            btc_address_hash: Felt::ZERO,
            score: 700,
            proof: vec![Felt::from(0x0fu64)],
        };
        assert_eq!(
            serde_json::to_string(&calldata).unwrap(),
            r#"{"btc_address_hash":"0x0","score":700,"proof":["0xf"]}"#
        );
    }

    #[test]
    fn felts_are_length_prefixed() {
        let c = commitment();
        let felts = to_calldata(&c).to_felts();
        assert_eq!(felts, vec![c.address_hash, Felt::from(831u64), Felt::from(1u64), c.commitment]);
    }

    #[test]
    fn entry_point_names() {
        assert_eq!(RegistryEntryPoint::RegisterScore.name(), "register_score");
        assert_eq!(RegistryEntryPoint::UpdateScore.name(), "update_score");
        assert_eq!(RegistryEntryPoint::for_last_updated(0), RegistryEntryPoint::RegisterScore);
        assert_eq!(
            RegistryEntryPoint::for_last_updated(1_717_200_000),
            RegistryEntryPoint::UpdateScore
        );
    }
}
