//! Error types for ledger reads and writes.
use bitcred_core::error::FeltError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("RPC client error: {0}")] Client(String),
    #[error("starknet_call {entry_point} failed: {reason}")] Call { entry_point: String, reason: String },
    #[error("unexpected result from {entry_point}: {reason}")] Decode { entry_point: String, reason: String },
    #[error("invalid felt: {0}")] Felt(#[from] FeltError),
    #[error("no scorer account configured")] NoAccount,
    #[error("signing failed: {0}")] Sign(String),
    #[error("{entry_point} submission failed: {reason}")] Submit { entry_point: String, reason: String },
}
