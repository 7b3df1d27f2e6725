//! Scoring and encoding constants. All monetary values are in satoshis.

/// Lowest composite score a wallet can receive.
pub const SCORE_MIN: u16 = 650;

/// Highest composite score a wallet can receive.
pub const SCORE_MAX: u16 = 850;

/// Number of monthly snapshots considered by the scorers.
pub const MAX_SNAPSHOTS: usize = 12;

/// Shortest address string accepted by the chain-data layer.
pub const MIN_ADDRESS_LEN: usize = 26;

/// Bytes kept from a SHA-256 digest so the value fits a Starknet felt252.
///
/// 31 bytes is 248 bits, always below the field modulus (~2^251).
pub const FELT_TRUNCATED_BYTES: usize = 31;

/// Size of the secret commitment nonce.
pub const NONCE_LEN: usize = 32;

/// Basis-point denominator for collateral ratios (10_000 = 100%).
pub const BPS_PRECISION: u32 = 10_000;

/// Stablecoin amounts on the lending pool use 6 decimals.
pub const USDC_DECIMALS_DIVISOR: f64 = 1_000_000.0;

/// Health factors on the lending pool are scaled by 10_000.
pub const HEALTH_FACTOR_PRECISION: f64 = 10_000.0;

/// Tx hash placeholder returned when the user's wallet has to submit the score.
pub const FRONTEND_SUBMISSION_REQUIRED: &str = "frontend_submission_required";
