//! Shared wallet fixtures for the end-to-end tests.

use bitcred_chain::TxActivity;
use bitcred_core::traits::{FixedClock, FixedRandom};
use bitcred_core::{Month, MonthlySnapshot, Utxo, WalletData};
use bitcred_proof::CommitmentGenerator;
use bitcred_scoring::{Scorer, ScoringConfig};
use chrono::{DateTime, TimeZone, Utc};

pub const HODLER: &str = "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh";
pub const NEWCOMER: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

/// 2024-06-01T00:00:00Z
pub const T0: u64 = 1_717_200_000;

/// The twelve months from 2023-07 to 2024-06, oldest first.
pub fn last_twelve_months() -> Vec<(i32, u32)> {
    (7..=12).map(|m| (2023, m)).chain((1..=6).map(|m| (2024, m))).collect()
}

/// Long-held coins and a balance that grows 100_000 sats every month.
pub fn hodler_wallet() -> WalletData {
    let snapshots = last_twelve_months()
        .into_iter()
        .enumerate()
        .map(|(i, (y, m))| {
            let month = Month::new(y as u16, m as u8).unwrap();
            MonthlySnapshot::new(month, 7_100_000 + i as u64 * 100_000, 3)
        })
        .collect();
    WalletData::new(
        HODLER,
        vec![Utxo::new(5_000_000, 1460), Utxo::new(3_000_000, 730)],
        snapshots,
    )
    .unwrap()
}

/// A never-used address: no coins and one empty month.
pub fn empty_wallet() -> WalletData {
    let snapshot = MonthlySnapshot::new(Month::new(2024, 6).unwrap(), 0, 0);
    WalletData::new(NEWCOMER, vec![], vec![snapshot]).unwrap()
}

/// Three transactions a month netting +100_000 sats. Anchored at a current
/// balance of 8_200_000 this rebuilds [`hodler_wallet`]'s history.
pub fn hodler_activity() -> Vec<TxActivity> {
    last_twelve_months()
        .into_iter()
        .flat_map(|(y, m)| {
            [(3, 50_000), (12, 80_000), (25, -30_000)]
                .map(|(d, net)| TxActivity { time: Some(at(y, m, d)), net })
        })
        .collect()
}

pub fn at(y: i32, m: u32, d: u32) -> i64 {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap().timestamp()
}

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 28, 0, 0, 0).unwrap()
}

pub fn fixed_scorer(ts: u64) -> Scorer<FixedClock> {
    Scorer::new(ScoringConfig::default(), FixedClock(ts)).unwrap()
}

pub fn fixed_generator(ts: u64, nonce: u8) -> CommitmentGenerator<FixedClock, FixedRandom> {
    CommitmentGenerator::new(FixedClock(ts), FixedRandom([nonce; 32]))
}
