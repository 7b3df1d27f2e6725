//! Monthly balance history from a wallet's transaction list.
//!
//! Explorers return a bounded page of recent transactions, not the whole
//! history, so every end-of-month balance is an estimate. Three estimates
//! are available, selected by [`SnapshotPolicy`]:
//!
//! - [`SnapshotPolicy::RunningSum`]: net flows summed forward from zero,
//!   clamped at zero after each month. Used by Blockchain.com and Blockstream.
//! - [`SnapshotPolicy::CurrentBalance`]: transaction counts only, every
//!   active month stamped with the current balance. Used by mempool.space.
//! - [`SnapshotPolicy::Anchored`]: the latest active month ends at the
//!   current balance and earlier months subtract later net flows. Opt-in.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use bitcred_core::constants::MAX_SNAPSHOTS;
use bitcred_core::{Month, MonthlySnapshot};
use chrono::{DateTime, Utc};

/// One transaction as seen from the scored address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxActivity {
    /// Block time in unix seconds. `None` for unconfirmed or undated
    /// transactions, which are left out of the monthly history.
    pub time: Option<i64>,
    /// Satoshis received minus satoshis spent by the address.
    pub net: i64,
}

/// How end-of-month balances are estimated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SnapshotPolicy {
    #[default]
    RunningSum,
    CurrentBalance,
    Anchored,
}

impl SnapshotPolicy {
    pub fn name(self) -> &'static str {
        match self {
            Self::RunningSum => "running-sum",
            Self::CurrentBalance => "current-balance",
            Self::Anchored => "anchored",
        }
    }
}

impl fmt::Display for SnapshotPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SnapshotPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running-sum" => Ok(Self::RunningSum),
            "current-balance" => Ok(Self::CurrentBalance),
            "anchored" => Ok(Self::Anchored),
            other => Err(format!(
                "unknown balance history '{other}' (expected running-sum, current-balance or anchored)"
            )),
        }
    }
}

/// Group `txs` by UTC month and estimate end-of-month balances.
///
/// Returns at most [`MAX_SNAPSHOTS`] snapshots, oldest first. An address with
/// no transactions at all gets a single snapshot for the month of `now` at
/// `current_balance`. If transactions exist but none is dated, the history
/// is empty.
pub fn build_monthly_snapshots(
    txs: &[TxActivity],
    current_balance: u64,
    now: DateTime<Utc>,
    policy: SnapshotPolicy,
) -> Vec<MonthlySnapshot> {
    if txs.is_empty() {
        return vec![MonthlySnapshot::new(Month::from_datetime(now), current_balance, 0)];
    }

    let mut months: BTreeMap<Month, (i128, u64)> = BTreeMap::new();
    for tx in txs {
        let Some(month) = tx.time.and_then(Month::from_unix) else { continue };
        let entry = months.entry(month).or_default();
        entry.0 += tx.net as i128;
        entry.1 += 1;
    }

    let mut snapshots: Vec<MonthlySnapshot> = match policy {
        SnapshotPolicy::RunningSum => {
            let mut balance: i128 = 0;
            months
                .into_iter()
                .map(|(month, (net, tx_count))| {
                    balance = (balance + net).max(0);
                    MonthlySnapshot::new(month, clamp_sats(balance), tx_count)
                })
                .collect()
        }
        SnapshotPolicy::CurrentBalance => months
            .into_iter()
            .map(|(month, (_, tx_count))| MonthlySnapshot::new(month, current_balance, tx_count))
            .collect(),
        SnapshotPolicy::Anchored => {
            let mut balance = current_balance as i128;
            let mut rev: Vec<MonthlySnapshot> = months
                .into_iter()
                .rev()
                .take(MAX_SNAPSHOTS)
                .map(|(month, (net, tx_count))| {
                    let snapshot = MonthlySnapshot::new(month, clamp_sats(balance), tx_count);
                    balance -= net;
                    snapshot
                })
                .collect();
            rev.reverse();
            rev
        }
    };

    if snapshots.len() > MAX_SNAPSHOTS {
        snapshots.drain(..snapshots.len() - MAX_SNAPSHOTS);
    }
    snapshots
}

fn clamp_sats(balance: i128) -> u64 {
    balance.clamp(0, u64::MAX as i128) as u64
}
