//! API configuration loaded from environment variables.

use std::time::Duration;

use anyhow::{Context, Result};
use bitcred_chain::{ProviderConfig, SnapshotPolicy};
use bitcred_core::Felt;
use bitcred_ledger::{StarknetConfig, DEFAULT_STARKNET_RPC};

#[derive(Clone, Debug)]
pub struct Config {
    /// Address to bind the HTTP server.
    pub bind_addr: String,
    /// Explorer endpoints for wallet history.
    pub providers: ProviderConfig,
    /// Starknet node and contract addresses.
    pub starknet: StarknetConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bind_addr = var("BITCRED_BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8000".into());

        let timeout_secs: u64 = var("BITCRED_PROVIDER_TIMEOUT_SECS")
            .unwrap_or_else(|| "20".into())
            .parse()
            .context("BITCRED_PROVIDER_TIMEOUT_SECS must be a positive integer")?;
        let timeout = Duration::from_secs(timeout_secs);

        let balance_history = var("BITCRED_BALANCE_HISTORY")
            .map(|raw| raw.parse::<SnapshotPolicy>())
            .transpose()
            .map_err(anyhow::Error::msg)
            .context("BITCRED_BALANCE_HISTORY")?;

        let defaults = ProviderConfig::default();
        let providers = ProviderConfig {
            blockchain_api: var("BLOCKCHAIN_API").unwrap_or(defaults.blockchain_api),
            mempool_api: var("MEMPOOL_API").unwrap_or(defaults.mempool_api),
            blockstream_api: var("BLOCKSTREAM_API").unwrap_or(defaults.blockstream_api),
            timeout,
            balance_history,
        };

        let contract = |key: &str| -> Result<Felt> {
            let raw = var(key).unwrap_or_else(|| "0x0".into());
            Felt::from_hex(&raw).with_context(|| format!("{key} must be a hex felt, got {raw}"))
        };
        let starknet = StarknetConfig {
            rpc_url: var("STARKNET_RPC_URL").unwrap_or_else(|| DEFAULT_STARKNET_RPC.into()),
            registry: contract("REGISTRY_ADDRESS")?,
            lending: contract("LENDING_ADDRESS")?,
            timeout,
        };

        Ok(Self { bind_addr, providers, starknet })
    }
}
