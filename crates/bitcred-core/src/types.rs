//! Wallet history types consumed by the scorers.
//!
//! All monetary values are in satoshis. Every field is unsigned, so negative
//! values and ages are rejected at the type level by whoever decodes the
//! explorer data; the scorers never see them.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{MAX_SNAPSHOTS, MIN_ADDRESS_LEN};
use crate::error::DataError;

/// One unspent output at fetch time.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Utxo {
    /// Value in satoshis.
    pub value: u64,
    /// Whole days since the output was confirmed.
    pub age_days: u64,
}

impl Utxo {
    pub fn new(value: u64, age_days: u64) -> Self {
        Self { value, age_days }
    }
}

/// A calendar month, formatted `YYYY-MM`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Month {
    year: u16,
    month: u8,
}

impl Month {
    pub fn new(year: u16, month: u8) -> Result<Self, DataError> {
        if !(1..=12).contains(&month) {
            return Err(DataError::InvalidMonth(format!("{year:04}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// The UTC month containing `at`.
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            year: at.year().clamp(0, 9999) as u16,
            month: at.month() as u8,
        }
    }

    /// The UTC month containing unix time `secs`, or `None` if out of range.
    pub fn from_unix(secs: i64) -> Option<Self> {
        DateTime::from_timestamp(secs, 0).map(Self::from_datetime)
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DataError::InvalidMonth(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for Month {
    type Error = DataError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Month> for String {
    fn from(m: Month) -> Self {
        m.to_string()
    }
}

/// Balance and activity for one calendar month.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct MonthlySnapshot {
    pub month: Month,
    /// End-of-month balance in satoshis.
    pub balance: u64,
    pub tx_count: u64,
}

impl MonthlySnapshot {
    pub fn new(month: Month, balance: u64, tx_count: u64) -> Self {
        Self { month, balance, tx_count }
    }
}

/// Everything the scorers know about a wallet.
///
/// Snapshots are sorted ascending by month, unique per month, and limited to
/// the most recent [`MAX_SNAPSHOTS`]. The value is immutable once built.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct WalletData {
    address: String,
    utxos: Vec<Utxo>,
    monthly_snapshots: Vec<MonthlySnapshot>,
}

impl WalletData {
    /// Sort snapshots chronologically, reject duplicate months, then keep the
    /// latest twelve.
    pub fn new(
        address: impl Into<String>,
        utxos: Vec<Utxo>,
        mut snapshots: Vec<MonthlySnapshot>,
    ) -> Result<Self, DataError> {
        snapshots.sort_by_key(|s| s.month);
        if let Some(dup) = snapshots.windows(2).find(|w| w[0].month == w[1].month) {
            return Err(DataError::DuplicateMonth(dup[0].month.to_string()));
        }
        if snapshots.len() > MAX_SNAPSHOTS {
            snapshots.drain(..snapshots.len() - MAX_SNAPSHOTS);
        }
        Ok(Self {
            address: address.into(),
            utxos,
            monthly_snapshots: snapshots,
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn utxos(&self) -> &[Utxo] {
        &self.utxos
    }

    pub fn monthly_snapshots(&self) -> &[MonthlySnapshot] {
        &self.monthly_snapshots
    }

    /// Sum of UTXO values in satoshis.
    pub fn total_value(&self) -> u128 {
        self.utxos.iter().map(|u| u.value as u128).sum()
    }
}

/// Reject addresses too short to be a Bitcoin address.
pub fn validate_address(address: &str) -> Result<(), DataError> {
    if address.trim().len() < MIN_ADDRESS_LEN {
        return Err(DataError::InvalidAddress(address.to_string()));
    }
    Ok(())
}

/// Credit band. Tier 1 is the best and unlocks the lowest collateral ratio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum Tier {
    One = 1,
    Two = 2,
    Three = 3,
    Four = 4,
}

impl Tier {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Lowercase hex digit of the tier number.
    pub fn hex_digit(self) -> char {
        char::from_digit(self.as_u8() as u32, 16).unwrap_or('4')
    }

    /// Human-readable band name used in API messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::One => "Diamond Hands",
            Self::Two => "Strong Holder",
            Self::Three => "Moderate Holder",
            Self::Four => "New Holder",
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = DataError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            other => Err(DataError::InvalidTier(other)),
        }
    }
}

impl From<Tier> for u8 {
    fn from(t: Tier) -> Self {
        t.as_u8()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}
