//! The chain-data capability and the HTTP plumbing shared by adapters.

use async_trait::async_trait;
use bitcred_core::WalletData;
use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

/// A source of wallet history for one Bitcoin address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    /// Name used in logs and aggregate errors.
    fn name(&self) -> &'static str;

    /// Fetch UTXOs and monthly snapshots for `address`.
    async fn fetch(&self, address: &str) -> Result<WalletData, ProviderError>;
}

/// GET `url` and decode a JSON body, mapping non-2xx responses to
/// [`ProviderError::Status`].
pub(crate) async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, ProviderError> {
    let resp = client.get(url).send().await?.error_for_status()?;
    Ok(resp.json::<T>().await?)
}
