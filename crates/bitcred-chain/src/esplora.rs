//! Esplora adapter, shared by mempool.space and Blockstream.
//!
//! Three requests per address: `/address/{a}/utxo`, `/address/{a}` for the
//! confirmed balance, and `/address/{a}/txs` for the most recent page of
//! transactions. Unconfirmed outputs count with age 0; unconfirmed
//! transactions are left out of the monthly history.
//!
//! mempool.space stamps the current balance on every active month and
//! Blockstream sums net flows forward; either can be overridden.

use async_trait::async_trait;
use bitcred_core::{Utxo, WalletData};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{get_json, ChainDataProvider};
use crate::snapshots::{build_monthly_snapshots, SnapshotPolicy, TxActivity};

const SECS_PER_DAY: i64 = 86_400;

#[derive(Deserialize, Debug, Default, Clone, Copy)]
pub struct TxStatus {
    #[serde(default)]
    pub confirmed: bool,
    pub block_time: Option<i64>,
}

impl TxStatus {
    fn confirmed_at(&self) -> Option<i64> {
        match (self.confirmed, self.block_time) {
            (true, Some(t)) if t > 0 => Some(t),
            _ => None,
        }
    }
}

#[derive(Deserialize, Debug)]
pub struct EsploraUtxo {
    #[serde(default)]
    pub value: u64,
    #[serde(default)]
    pub status: TxStatus,
}

#[derive(Deserialize, Debug, Default)]
pub struct ChainStats {
    #[serde(default)]
    pub funded_txo_sum: u64,
    #[serde(default)]
    pub spent_txo_sum: u64,
}

#[derive(Deserialize, Debug, Default)]
pub struct EsploraAddress {
    #[serde(default)]
    pub chain_stats: ChainStats,
}

impl EsploraAddress {
    pub fn confirmed_balance(&self) -> u64 {
        self.chain_stats.funded_txo_sum.saturating_sub(self.chain_stats.spent_txo_sum)
    }
}

#[derive(Deserialize, Debug)]
pub struct EsploraTx {
    #[serde(default)]
    pub status: TxStatus,
    #[serde(default)]
    pub vin: Vec<EsploraVin>,
    #[serde(default)]
    pub vout: Vec<EsploraVout>,
}

#[derive(Deserialize, Debug)]
pub struct EsploraVin {
    pub prevout: Option<EsploraVout>,
}

#[derive(Deserialize, Debug)]
pub struct EsploraVout {
    pub scriptpubkey_address: Option<String>,
    #[serde(default)]
    pub value: u64,
}

impl EsploraTx {
    fn net_for(&self, address: &str) -> i64 {
        let pays = |o: &&EsploraVout| o.scriptpubkey_address.as_deref() == Some(address);
        let spent: i64 = self
            .vin
            .iter()
            .filter_map(|i| i.prevout.as_ref())
            .filter(pays)
            .map(|o| o.value as i64)
            .sum();
        let received: i64 = self.vout.iter().filter(pays).map(|o| o.value as i64).sum();
        received - spent
    }
}

/// Whole days between `block_time` and `now`, never negative.
fn age_days(block_time: i64, now: DateTime<Utc>) -> u64 {
    (now.timestamp().saturating_sub(block_time) / SECS_PER_DAY).max(0) as u64
}

/// Combine the three Esplora responses into wallet data.
pub fn parse_esplora(
    address: &str,
    utxos: &[EsploraUtxo],
    info: &EsploraAddress,
    txs: &[EsploraTx],
    now: DateTime<Utc>,
    policy: SnapshotPolicy,
) -> Result<WalletData, ProviderError> {
    let utxos = utxos
        .iter()
        .map(|u| {
            let age = u.status.confirmed_at().map_or(0, |t| age_days(t, now));
            Utxo::new(u.value, age)
        })
        .collect();
    let activity: Vec<TxActivity> = txs
        .iter()
        .map(|tx| TxActivity { time: tx.status.confirmed_at(), net: tx.net_for(address) })
        .collect();
    let snapshots = build_monthly_snapshots(&activity, info.confirmed_balance(), now, policy);
    Ok(WalletData::new(address, utxos, snapshots)?)
}

pub struct EsploraProvider {
    name: &'static str,
    client: Client,
    base_url: String,
    policy: SnapshotPolicy,
}

impl EsploraProvider {
    pub fn new(
        name: &'static str,
        client: Client,
        base_url: impl Into<String>,
        policy: SnapshotPolicy,
    ) -> Self {
        Self {
            name,
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn mempool_space(client: Client, base_url: impl Into<String>) -> Self {
        Self::new("Mempool.space", client, base_url, SnapshotPolicy::CurrentBalance)
    }

    pub fn blockstream(client: Client, base_url: impl Into<String>) -> Self {
        Self::new("Blockstream", client, base_url, SnapshotPolicy::RunningSum)
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
impl ChainDataProvider for EsploraProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(&self, address: &str) -> Result<WalletData, ProviderError> {
        let base = format!("{}/address/{address}", self.base_url);
        let utxos: Vec<EsploraUtxo> = get_json(&self.client, &format!("{base}/utxo")).await?;
        let info: EsploraAddress = get_json(&self.client, &base).await?;
        let txs: Vec<EsploraTx> = get_json(&self.client, &format!("{base}/txs")).await?;
        debug!(provider = self.name, utxos = utxos.len(), txs = txs.len(), "esplora fetched");
        parse_esplora(address, &utxos, &info, &txs, Utc::now(), self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ADDR: &str = "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh";

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 0, 0, 0).unwrap()
    }

    const UTXOS: &str = r#"[
        {"txid": "aa", "vout": 0, "value": 300000,
         "status": {"confirmed": true, "block_height": 800000, "block_time": 1704110400}},
        {"txid": "bb", "vout": 1, "value": 20000, "status": {"confirmed": false}}
    ]"#;

    const ADDRESS: &str = r#"{
        "address": "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh",
        "chain_stats": {"funded_txo_count": 2, "funded_txo_sum": 500000, "spent_txo_count": 1, "spent_txo_sum": 200000, "tx_count": 2},
        "mempool_stats": {"funded_txo_sum": 20000, "spent_txo_sum": 0}
    }"#;

    const TXS: &str = r#"[
        {"txid": "cc", "status": {"confirmed": false},
         "vin": [], "vout": [{"scriptpubkey_address": "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh", "value": 20000}]},
        {"txid": "dd", "status": {"confirmed": true, "block_time": 1709208000},
         "vin": [{"prevout": {"scriptpubkey_address": "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh", "value": 200000}}],
         "vout": [{"scriptpubkey_address": "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq", "value": 190000}]},
        {"txid": "ee", "status": {"confirmed": true, "block_time": 1704110400},
         "vin": [{"prevout": null, "is_coinbase": true}],
         "vout": [{"scriptpubkey_address": "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh", "value": 500000},
                  {"scriptpubkey": "6a", "value": 0}]}
    ]"#;

    fn parse_with(policy: SnapshotPolicy) -> WalletData {
        let utxos: Vec<EsploraUtxo> = serde_json::from_str(UTXOS).unwrap();
        let info: EsploraAddress = serde_json::from_str(ADDRESS).unwrap();
        let txs: Vec<EsploraTx> = serde_json::from_str(TXS).unwrap();
        parse_esplora(ADDR, &utxos, &info, &txs, now(), policy).unwrap()
    }

    fn parse() -> WalletData {
        parse_with(SnapshotPolicy::RunningSum)
    }

    #[test]
    fn utxo_ages_from_block_time() {
        let wallet = parse();
        // 2024-01-01T12:00Z to 2024-06-15T00:00Z is 165.5 days.
        assert_eq!(wallet.utxos(), &[Utxo::new(300_000, 165), Utxo::new(20_000, 0)]);
    }

    #[test]
    fn snapshots_skip_unconfirmed() {
        let wallet = parse();
        let snaps = wallet.monthly_snapshots();
        assert_eq!(snaps.len(), 2);
        assert_eq!(snaps[0].month.to_string(), "2024-01");
        assert_eq!(snaps[0].balance, 500_000);
        assert_eq!(snaps[1].month.to_string(), "2024-02");
        assert_eq!(snaps[1].balance, 300_000);
    }

    #[test]
    fn mempool_history_carries_current_balance() {
        let wallet = parse_with(SnapshotPolicy::CurrentBalance);
        let snaps = wallet.monthly_snapshots();
        assert_eq!(snaps.len(), 2);
        assert!(snaps.iter().all(|s| s.balance == 300_000 && s.tx_count == 1));
    }

    #[test]
    fn only_unconfirmed_transactions_leave_no_history() {
        let txs: Vec<EsploraTx> = serde_json::from_str(
            r#"[{"status": {"confirmed": false}, "vin": [], "vout": []}]"#,
        )
        .unwrap();
        let info: EsploraAddress = serde_json::from_str(ADDRESS).unwrap();
        for policy in [SnapshotPolicy::RunningSum, SnapshotPolicy::CurrentBalance] {
            let wallet = parse_esplora(ADDR, &[], &info, &txs, now(), policy).unwrap();
            assert!(wallet.monthly_snapshots().is_empty());
        }
    }

    #[test]
    fn balance_is_funded_minus_spent() {
        let info: EsploraAddress = serde_json::from_str(ADDRESS).unwrap();
        assert_eq!(info.confirmed_balance(), 300_000);
        assert_eq!(EsploraAddress::default().confirmed_balance(), 0);
    }

    #[test]
    fn unused_address() {
        let wallet =
            parse_esplora(ADDR, &[], &EsploraAddress::default(), &[], now(), SnapshotPolicy::CurrentBalance)
                .unwrap();
        assert!(wallet.utxos().is_empty());
        assert_eq!(wallet.monthly_snapshots().len(), 1);
        assert_eq!(wallet.monthly_snapshots()[0].tx_count, 0);
        assert_eq!(wallet.monthly_snapshots()[0].balance, 0);
    }

    #[test]
    fn future_block_time_is_age_zero() {
        assert_eq!(age_days(now().timestamp() + 3_600, now()), 0);
    }

    #[test]
    fn provider_names() {
        let client = Client::new();
        let mempool = EsploraProvider::mempool_space(client.clone(), "x");
        assert_eq!(mempool.name(), "Mempool.space");
        assert_eq!(mempool.snapshot_policy(), SnapshotPolicy::CurrentBalance);
        let blockstream = EsploraProvider::blockstream(client, "x/");
        assert_eq!(blockstream.base_url, "x");
        assert_eq!(blockstream.snapshot_policy(), SnapshotPolicy::RunningSum);
        let anchored = blockstream.with_snapshot_policy(SnapshotPolicy::Anchored);
        assert_eq!(anchored.snapshot_policy(), SnapshotPolicy::Anchored);
    }
}
