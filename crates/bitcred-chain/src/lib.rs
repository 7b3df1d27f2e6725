//! # bitcred-chain — Wallet history from public Bitcoin explorers.
//!
//! Adapters turn explorer responses into [`WalletData`](bitcred_core::WalletData):
//! - [`BlockchainComProvider`]: `rawaddr`, ages estimated from confirmations.
//! - [`EsploraProvider`]: mempool.space and Blockstream, ages from block time.
//!
//! [`FallbackProvider`] chains them in that order. Response parsing is kept in
//! pure functions so it can be tested against recorded JSON.

pub mod blockchain_com;
pub mod error;
pub mod esplora;
pub mod fallback;
pub mod provider;
pub mod snapshots;

pub use blockchain_com::BlockchainComProvider;
pub use error::ProviderError;
pub use esplora::EsploraProvider;
pub use fallback::{FallbackProvider, ProviderConfig};
pub use provider::ChainDataProvider;
pub use snapshots::{build_monthly_snapshots, SnapshotPolicy, TxActivity};
