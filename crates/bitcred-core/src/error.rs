//! Error types for BitCred core data.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("invalid Bitcoin address format: {0}")] InvalidAddress(String),
    #[error("invalid month (expected YYYY-MM): {0}")] InvalidMonth(String),
    #[error("duplicate monthly snapshot: {0}")] DuplicateMonth(String),
    #[error("invalid tier: {0}")] InvalidTier(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeltError {
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("value does not fit in 32 bytes: {0}")] TooLong(String),
    #[error("value exceeds the felt252 modulus: {0}")] OutOfRange(String),
}

