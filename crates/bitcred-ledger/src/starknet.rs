//! JSON-RPC client for the registry and lending contracts.
//!
//! Reads go straight to `starknet_call` with selectors computed locally, so no
//! contract ABI is loaded. Empty results are read as the contract's defaults
//! for unknown keys. Registry writes are signed by a [`ScorerAccount`] and
//! sent with `starknet_addInvokeTransaction`.

use std::time::Duration;

use async_trait::async_trait;
use bitcred_core::Felt;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::core::params::{ArrayParams, ObjectParams};
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::account::{execute_calldata, InvokeResult, InvokeV3, ResourceBound, ScorerAccount};
use crate::client::{LedgerClient, Position};
use crate::error::LedgerError;
use crate::selector::selector;
use crate::u256::U256;

/// Public Sepolia node used when no endpoint is configured.
pub const DEFAULT_STARKNET_RPC: &str = "https://rpc.starknet-testnet.lava.build";

/// Ratio the registry reports for wallets it has never scored (150%).
pub const DEFAULT_COLLATERAL_RATIO_BPS: u32 = 15_000;

/// The `request` object of `starknet_call`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FunctionCall {
    pub contract_address: Felt,
    pub entry_point_selector: Felt,
    pub calldata: Vec<Felt>,
}

/// Starknet node endpoint and contract addresses.
#[derive(Debug, Clone)]
pub struct StarknetConfig {
    pub rpc_url: String,
    pub registry: Felt,
    pub lending: Felt,
    pub timeout: Duration,
}

pub struct StarknetClient {
    client: HttpClient,
    registry: Felt,
    lending: Felt,
    account: Option<ScorerAccount>,
}

impl StarknetClient {
    pub fn new(config: &StarknetConfig) -> Result<Self, LedgerError> {
        let client = HttpClientBuilder::default()
            .request_timeout(config.timeout)
            .build(&config.rpc_url)
            .map_err(|e| LedgerError::Client(e.to_string()))?;
        Ok(Self {
            client,
            registry: config.registry,
            lending: config.lending,
            account: None,
        })
    }

    /// Enable registry writes signed by `account`.
    pub fn with_account(mut self, account: ScorerAccount) -> Self {
        self.account = Some(account);
        self
    }

    pub async fn get_nonce(&self, contract: Felt) -> Result<Felt, LedgerError> {
        let rpc_err = |e: String| LedgerError::Client(format!("starknet_getNonce: {e}"));
        let mut params = ObjectParams::new();
        params.insert("block_id", "latest").map_err(|e| rpc_err(e.to_string()))?;
        params.insert("contract_address", contract).map_err(|e| rpc_err(e.to_string()))?;
        self.client
            .request("starknet_getNonce", params)
            .await
            .map_err(|e| rpc_err(e.to_string()))
    }

    pub async fn chain_id(&self) -> Result<Felt, LedgerError> {
        self.client
            .request("starknet_chainId", ArrayParams::new())
            .await
            .map_err(|e| LedgerError::Client(format!("starknet_chainId: {e}")))
    }

    /// Call a view function at the latest block.
    pub async fn call(
        &self,
        contract: Felt,
        entry_point: &str,
        calldata: Vec<Felt>,
    ) -> Result<Vec<Felt>, LedgerError> {
        let call_err = |reason: String| LedgerError::Call {
            entry_point: entry_point.to_string(),
            reason,
        };
        let request = FunctionCall {
            contract_address: contract,
            entry_point_selector: selector(entry_point),
            calldata,
        };
        let mut params = ObjectParams::new();
        params.insert("request", request).map_err(|e| call_err(e.to_string()))?;
        params.insert("block_id", "latest").map_err(|e| call_err(e.to_string()))?;

        let result: Vec<Felt> = self
            .client
            .request("starknet_call", params)
            .await
            .map_err(|e| call_err(e.to_string()))?;
        debug!(entry_point, words = result.len(), "starknet_call");
        Ok(result)
    }
}

fn word(result: &[Felt], index: usize) -> Felt {
    result.get(index).copied().unwrap_or(Felt::ZERO)
}

/// Narrow one felt into a small integer type.
fn narrow<T: TryFrom<u128>>(entry_point: &str, felt: Felt) -> Result<T, LedgerError> {
    felt.to_u128()
        .and_then(|v| T::try_from(v).ok())
        .ok_or_else(|| LedgerError::Decode {
            entry_point: entry_point.to_string(),
            reason: format!("{felt} out of range"),
        })
}

fn u256_at(entry_point: &str, result: &[Felt], index: usize) -> Result<U256, LedgerError> {
    let (low, high) = (word(result, index), word(result, index + 1));
    U256::from_felts(&low, &high).ok_or_else(|| LedgerError::Decode {
        entry_point: entry_point.to_string(),
        reason: format!("u256 limbs ({low}, {high}) exceed 128 bits"),
    })
}

/// Decode `get_position` (`u256, u256, u32, bool`) plus the separately read
/// health factor and max borrow.
pub fn decode_position(
    position: &[Felt],
    health_factor: &[Felt],
    max_borrow: &[Felt],
) -> Result<Position, LedgerError> {
    Ok(Position {
        collateral: u256_at("get_position", position, 0)?,
        debt: u256_at("get_position", position, 2)?,
        collateral_ratio_bps: narrow("get_position", word(position, 4))?,
        is_liquidatable: !word(position, 5).is_zero(),
        health_factor: u256_at("get_health_factor", health_factor, 0)?,
        max_borrow: u256_at("get_max_borrow", max_borrow, 0)?,
    })
}

#[async_trait]
impl LedgerClient for StarknetClient {
    async fn get_score(&self, address_id: Felt) -> Result<u16, LedgerError> {
        let result = self.call(self.registry, "get_score", vec![address_id]).await?;
        narrow("get_score", word(&result, 0))
    }

    async fn get_collateral_ratio(&self, address_id: Felt) -> Result<u32, LedgerError> {
        let result = self.call(self.registry, "get_collateral_ratio", vec![address_id]).await?;
        match result.first() {
            Some(felt) => narrow("get_collateral_ratio", *felt),
            None => Ok(DEFAULT_COLLATERAL_RATIO_BPS),
        }
    }

    async fn get_score_tier(&self, address_id: Felt) -> Result<u8, LedgerError> {
        let result = self.call(self.registry, "get_score_tier", vec![address_id]).await?;
        narrow("get_score_tier", word(&result, 0))
    }

    async fn get_last_updated(&self, address_id: Felt) -> Result<u64, LedgerError> {
        let result = self.call(self.registry, "get_last_updated", vec![address_id]).await?;
        narrow("get_last_updated", word(&result, 0))
    }

    async fn is_approved_scorer(&self, scorer: Felt) -> Result<bool, LedgerError> {
        let result = self.call(self.registry, "is_approved_scorer", vec![scorer]).await?;
        Ok(!word(&result, 0).is_zero())
    }

    async fn get_position(&self, user: Felt) -> Result<Position, LedgerError> {
        let position = self.call(self.lending, "get_position", vec![user]).await?;
        let health = self.call(self.lending, "get_health_factor", vec![user]).await?;
        let max_borrow = self.call(self.lending, "get_max_borrow", vec![user]).await?;
        decode_position(&position, &health, &max_borrow)
    }

    async fn get_available_liquidity(&self) -> Result<U256, LedgerError> {
        let result = self.call(self.lending, "get_available_liquidity", vec![]).await?;
        u256_at("get_available_liquidity", &result, 0)
    }

    async fn submit_registry_write(&self, entry_point: &str, calldata: Vec<Felt>) -> Result<Felt, LedgerError> {
        let account = self.account.as_ref().ok_or(LedgerError::NoAccount)?;
        let submit_err = |reason: String| LedgerError::Submit {
            entry_point: entry_point.to_string(),
            reason,
        };

        let nonce = self.get_nonce(account.address).await?;
        let chain_id = self.chain_id().await?;
        let tx = InvokeV3 {
            sender_address: account.address,
            calldata: execute_calldata(self.registry, entry_point, &calldata),
            nonce,
            l1_gas: ResourceBound::REGISTRY_WRITE,
            l2_gas: ResourceBound::default(),
        };
        let signature = account.sign(&tx, chain_id)?;

        let mut params = ObjectParams::new();
        params
            .insert("invoke_transaction", tx.into_broadcast(signature))
            .map_err(|e| submit_err(e.to_string()))?;
        let result: InvokeResult = self
            .client
            .request("starknet_addInvokeTransaction", params)
            .await
            .map_err(|e| submit_err(e.to_string()))?;
        info!(entry_point, %nonce, tx_hash = %result.transaction_hash, "registry write submitted");
        Ok(result.transaction_hash)
    }
}
