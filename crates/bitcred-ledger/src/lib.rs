//! # bitcred-ledger — Starknet client for the BitCred registry and lending pool.
//!
//! [`LedgerClient`] is the capability the API depends on; [`StarknetClient`]
//! implements it over `starknet_call`. Registry writes are signed by an
//! approved [`ScorerAccount`] and submitted as INVOKE v3 transactions.

pub mod account;
pub mod client;
pub mod error;
pub mod selector;
pub mod starknet;
pub mod u256;

pub use account::{ScorerAccount, ScorerKey};
pub use client::{LedgerClient, Position, RegistryEntry};
pub use error::LedgerError;
pub use selector::selector;
pub use starknet::{StarknetClient, StarknetConfig, DEFAULT_COLLATERAL_RATIO_BPS, DEFAULT_STARKNET_RPC};
pub use u256::U256;
