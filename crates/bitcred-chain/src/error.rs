//! Error types for chain-data providers.
use bitcred_core::error::DataError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("invalid Bitcoin address format: {0}")] InvalidAddress(String),
    #[error("{0}")] Transport(String),
    #[error("HTTP {0}")] Status(u16),
    #[error("malformed response: {0}")] Decode(String),
    #[error("inconsistent wallet data: {0}")] Data(#[from] DataError),
    #[error("All Bitcoin APIs failed for address {address}. Errors: {}", .errors.join(" | "))]
    AllFailed { address: String, errors: Vec<String> },
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
