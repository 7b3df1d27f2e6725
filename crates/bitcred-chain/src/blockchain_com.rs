//! Blockchain.com `rawaddr` adapter.
//!
//! One request returns balance, the latest 50 transactions and, when the
//! explorer includes them, unspent outputs. UTXO age is estimated from
//! confirmations at ten minutes per block. Monthly balances default to a
//! running sum of the page's net flows.

use async_trait::async_trait;
use bitcred_core::{Utxo, WalletData};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{get_json, ChainDataProvider};
use crate::snapshots::{build_monthly_snapshots, SnapshotPolicy, TxActivity};

/// Transactions requested per address.
pub const TX_PAGE_LIMIT: u32 = 50;

const MINUTES_PER_BLOCK: u64 = 10;
const MINUTES_PER_DAY: u64 = 1_440;

#[derive(Deserialize, Debug, Default)]
pub struct RawAddress {
    #[serde(default)]
    pub final_balance: u64,
    #[serde(default)]
    pub unspent_outputs: Vec<RawUnspent>,
    #[serde(default)]
    pub txs: Vec<RawTx>,
}

#[derive(Deserialize, Debug)]
pub struct RawUnspent {
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub confirmations: u64,
}

#[derive(Deserialize, Debug)]
pub struct RawTx {
    #[serde(default)]
    pub time: i64,
    #[serde(default)]
    pub inputs: Vec<RawInput>,
    #[serde(default)]
    pub out: Vec<RawOutput>,
}

#[derive(Deserialize, Debug)]
pub struct RawInput {
    pub prev_out: Option<RawOutput>,
}

#[derive(Deserialize, Debug)]
pub struct RawOutput {
    pub addr: Option<String>,
    #[serde(default)]
    pub value: u64,
}

impl RawTx {
    /// Received minus spent for `address`.
    fn net_for(&self, address: &str) -> i64 {
        let spent: i64 = self
            .inputs
            .iter()
            .filter_map(|i| i.prev_out.as_ref())
            .filter(|o| o.addr.as_deref() == Some(address))
            .map(|o| o.value as i64)
            .sum();
        let received: i64 = self
            .out
            .iter()
            .filter(|o| o.addr.as_deref() == Some(address))
            .map(|o| o.value as i64)
            .sum();
        received - spent
    }
}

fn age_from_confirmations(confirmations: u64) -> u64 {
    confirmations.saturating_mul(MINUTES_PER_BLOCK) / MINUTES_PER_DAY
}

/// Convert a `rawaddr` response into wallet data.
pub fn parse_raw_address(
    address: &str,
    raw: &RawAddress,
    now: DateTime<Utc>,
    policy: SnapshotPolicy,
) -> Result<WalletData, ProviderError> {
    let utxos = raw
        .unspent_outputs
        .iter()
        .map(|u| Utxo::new(u.value, age_from_confirmations(u.confirmations)))
        .collect();
    let activity: Vec<TxActivity> = raw
        .txs
        .iter()
        .map(|tx| TxActivity {
            time: (tx.time > 0).then_some(tx.time),
            net: tx.net_for(address),
        })
        .collect();
    let snapshots = build_monthly_snapshots(&activity, raw.final_balance, now, policy);
    Ok(WalletData::new(address, utxos, snapshots)?)
}

pub struct BlockchainComProvider {
    client: Client,
    base_url: String,
    policy: SnapshotPolicy,
}

impl BlockchainComProvider {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy: SnapshotPolicy::RunningSum,
        }
    }

    pub fn with_snapshot_policy(mut self, policy: SnapshotPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn snapshot_policy(&self) -> SnapshotPolicy {
        self.policy
    }
}

#[async_trait]
impl ChainDataProvider for BlockchainComProvider {
    fn name(&self) -> &'static str {
        "Blockchain.com"
    }

    async fn fetch(&self, address: &str) -> Result<WalletData, ProviderError> {
        let url = format!("{}/rawaddr/{address}?limit={TX_PAGE_LIMIT}", self.base_url);
        let raw: RawAddress = get_json(&self.client, &url).await?;
        debug!(utxos = raw.unspent_outputs.len(), txs = raw.txs.len(), "rawaddr fetched");
        parse_raw_address(address, &raw, Utc::now(), self.policy)
    }
}
