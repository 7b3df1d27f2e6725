//! # bitcred-core
//! Foundation types and capabilities for BitCred wallet scoring.

pub mod constants;
pub mod error;
pub mod felt;
pub mod traits;
pub mod types;

pub use felt::Felt;
pub use types::{validate_address, Month, MonthlySnapshot, Tier, Utxo, WalletData};
