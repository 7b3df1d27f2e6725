//! Hodl-duration sub-score.
//!
//! Each UTXO scores `1 - e^(-age_days / 730)`: about 0.39 after one year,
//! 0.63 after two and 0.86 after four, approaching but never reaching 1.0.
//! The wallet score is the value-weighted mean over all UTXOs.

use bitcred_core::Utxo;

/// Days for a single UTXO to reach `1 - 1/e` (≈ 0.63).
pub const HODL_DECAY_DAYS: f64 = 730.0;

/// Score in `[0, 1]` for a UTXO set, using the production decay constant.
///
/// Empty sets and sets whose total value is zero score exactly 0.0.
pub fn score_hodl(utxos: &[Utxo]) -> f64 {
    score_hodl_with(utxos, HODL_DECAY_DAYS)
}

/// [`score_hodl`] with an explicit decay constant (must be positive).
pub fn score_hodl_with(utxos: &[Utxo], decay_days: f64) -> f64 {
    let total: u128 = utxos.iter().map(|u| u.value as u128).sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;

    let weighted: f64 = utxos
        .iter()
        .map(|u| utxo_score(u.age_days, decay_days) * (u.value as f64 / total))
        .sum();

    // Weights can sum to a hair over 1.0 in floating point.
    weighted.min(1.0)
}

/// Score of a single output aged `age_days`.
pub fn utxo_score(age_days: u64, decay_days: f64) -> f64 {
    1.0 - (-(age_days as f64) / decay_days).exp()
}
