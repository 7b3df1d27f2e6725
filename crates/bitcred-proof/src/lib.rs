//! # bitcred-proof — Score commitments for the on-chain registry.
//!
//! The registry never sees a Bitcoin address. Wallets are keyed by an
//! address id (the first 31 bytes of SHA-256 of the address), and each score
//! is published alongside a salted commitment binding id, tier and time.
//!
//! The commitment is a placeholder for a STARK proof: the registry stores it
//! but cannot verify it. [`OnchainCalldata`] is the exact argument list of
//! `register_score` / `update_score`.

pub mod calldata;
pub mod commitment;

pub use calldata::{to_calldata, OnchainCalldata, RegistryEntryPoint};
pub use commitment::{
    commit, derive_address_id, generate_commitment, Commitment, CommitmentGenerator, Nonce,
};
