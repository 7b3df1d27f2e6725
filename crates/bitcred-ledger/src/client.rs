//! The ledger capability: reads against the score registry and lending pool,
//! plus signed registry writes from an approved scorer.

use async_trait::async_trait;
use bitcred_core::constants::{BPS_PRECISION, HEALTH_FACTOR_PRECISION, USDC_DECIMALS_DIVISOR};
use bitcred_core::Felt;
use serde::Serialize;

use crate::error::LedgerError;
use crate::u256::U256;

/// A wallet's registry record. All fields are zero for unknown ids except
/// the collateral ratio, which the registry reports at its default.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub score: u16,
    pub tier: u8,
    pub collateral_ratio_bps: u32,
    pub last_updated: u64,
}

impl RegistryEntry {
    pub fn is_registered(&self) -> bool {
        self.last_updated != 0
    }

    pub fn collateral_ratio_pct(&self) -> f64 {
        self.collateral_ratio_bps as f64 / (BPS_PRECISION / 100) as f64
    }
}

/// A borrower's lending position. Amounts are raw 6-decimal stablecoin units.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub collateral: U256,
    pub debt: U256,
    pub collateral_ratio_bps: u32,
    pub is_liquidatable: bool,
    /// Scaled by 10_000.
    pub health_factor: U256,
    pub max_borrow: U256,
}

impl Position {
    pub fn debt_usd(&self) -> f64 {
        self.debt.scaled(USDC_DECIMALS_DIVISOR)
    }

    pub fn max_borrow_usd(&self) -> f64 {
        self.max_borrow.scaled(USDC_DECIMALS_DIVISOR)
    }

    pub fn health_factor(&self) -> f64 {
        self.health_factor.scaled(HEALTH_FACTOR_PRECISION)
    }

    pub fn collateral_ratio_pct(&self) -> f64 {
        self.collateral_ratio_bps as f64 / (BPS_PRECISION / 100) as f64
    }
}

#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn get_score(&self, address_id: Felt) -> Result<u16, LedgerError>;
    async fn get_collateral_ratio(&self, address_id: Felt) -> Result<u32, LedgerError>;
    async fn get_score_tier(&self, address_id: Felt) -> Result<u8, LedgerError>;
    async fn get_last_updated(&self, address_id: Felt) -> Result<u64, LedgerError>;
    async fn is_approved_scorer(&self, scorer: Felt) -> Result<bool, LedgerError>;
    async fn get_position(&self, user: Felt) -> Result<Position, LedgerError>;
    async fn get_available_liquidity(&self) -> Result<U256, LedgerError>;

    /// Sign and submit `register_score` / `update_score` with the given
    /// calldata. Returns the transaction hash.
    async fn submit_registry_write(&self, entry_point: &str, calldata: Vec<Felt>) -> Result<Felt, LedgerError>;

    /// All registry fields for one id.
    async fn get_registry_entry(&self, address_id: Felt) -> Result<RegistryEntry, LedgerError> {
        Ok(RegistryEntry {
            score: self.get_score(address_id).await?,
            tier: self.get_score_tier(address_id).await?,
            collateral_ratio_bps: self.get_collateral_ratio(address_id).await?,
            last_updated: self.get_last_updated(address_id).await?,
        })
    }
}
