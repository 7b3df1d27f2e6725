//! Starknet entry-point selectors.

use bitcred_core::Felt;
use sha3::{Digest, Keccak256};

/// `starknet_keccak(name)`: Keccak-256 of the ASCII name, low 250 bits.
pub fn selector(entry_point: &str) -> Felt {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&Keccak256::digest(entry_point.as_bytes()));
    bytes[0] &= 0x03;
    // Below 2^250, so always inside the field.
    Felt::from_be_bytes(bytes).unwrap_or(Felt::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn known_selectors() {
        assert_eq!(
            selector("transfer").to_hex(),
            "0x83afd3f4caedc6eebf44246fe54e38c95e3179a5ec9ea81740eca5b482d12e"
        );
        assert_eq!(
            selector("get_score").to_hex(),
            "0x9b2a59dab9794f9f1895ff5b5b621d7ad138084313beeb963003e9ca8ae684"
        );
        assert_eq!(
            selector("register_score").to_hex(),
            "0x3566d0e92bdb2d2b96b481893c1a23f1526a9009dbc1d59cc137b805bf1ef09"
        );
    }

    proptest! {
        #[test]
        fn selectors_fit_250_bits(name in "[a-z_]{1,40}") {
            prop_assert!(selector(&name).bits() <= 250);
        }
    }
}
