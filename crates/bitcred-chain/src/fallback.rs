//! Ordered provider fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bitcred_core::{validate_address, WalletData};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::blockchain_com::BlockchainComProvider;
use crate::error::ProviderError;
use crate::esplora::EsploraProvider;
use crate::provider::ChainDataProvider;
use crate::snapshots::SnapshotPolicy;

pub const BLOCKCHAIN_API: &str = "https://blockchain.info";
pub const MEMPOOL_API: &str = "https://mempool.space/api";
pub const BLOCKSTREAM_API: &str = "https://blockstream.info/api";

/// Explorer endpoints and the per-request timeout.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub blockchain_api: String,
    pub mempool_api: String,
    pub blockstream_api: String,
    pub timeout: Duration,
    /// Applied to every explorer when set. `None` keeps each explorer's own
    /// history estimate.
    pub balance_history: Option<SnapshotPolicy>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            blockchain_api: BLOCKCHAIN_API.to_string(),
            mempool_api: MEMPOOL_API.to_string(),
            blockstream_api: BLOCKSTREAM_API.to_string(),
            timeout: Duration::from_secs(20),
            balance_history: None,
        }
    }
}

/// Tries each provider in order and returns the first success.
///
/// When every provider fails the error lists all of their reasons.
pub struct FallbackProvider {
    providers: Vec<Arc<dyn ChainDataProvider>>,
}

impl FallbackProvider {
    pub fn new(providers: Vec<Arc<dyn ChainDataProvider>>) -> Self {
        Self { providers }
    }

    /// Blockchain.com, then mempool.space, then Blockstream, sharing one
    /// HTTP client.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ProviderError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let mut blockchain = BlockchainComProvider::new(client.clone(), config.blockchain_api.as_str());
        let mut mempool = EsploraProvider::mempool_space(client.clone(), config.mempool_api.as_str());
        let mut blockstream = EsploraProvider::blockstream(client, config.blockstream_api.as_str());
        if let Some(policy) = config.balance_history {
            blockchain = blockchain.with_snapshot_policy(policy);
            mempool = mempool.with_snapshot_policy(policy);
            blockstream = blockstream.with_snapshot_policy(policy);
        }
        Ok(Self::new(vec![Arc::new(blockchain), Arc::new(mempool), Arc::new(blockstream)]))
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl ChainDataProvider for FallbackProvider {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn fetch(&self, address: &str) -> Result<WalletData, ProviderError> {
        validate_address(address).map_err(|_| ProviderError::InvalidAddress(address.to_string()))?;

        let mut errors = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match provider.fetch(address).await {
                Ok(wallet) => {
                    info!(
                        provider = provider.name(),
                        utxos = wallet.utxos().len(),
                        months = wallet.monthly_snapshots().len(),
                        "wallet data fetched"
                    );
                    return Ok(wallet);
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "provider failed, trying next");
                    errors.push(format!("{}: {e}", provider.name()));
                }
            }
        }

        error!(providers = errors.len(), "all chain-data providers failed");
        Err(ProviderError::AllFailed { address: address.to_string(), errors })
    }
}
