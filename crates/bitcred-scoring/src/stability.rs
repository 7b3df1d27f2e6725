//! Balance-stability sub-score.
//!
//! Uses the coefficient of variation of monthly balances: `e^(-cv)` maps a
//! flat history to 1.0 and `cv = 1` to about 0.37. A rising least-squares
//! trend over at least four months adds up to 0.15 on top, capped at 1.0.

use bitcred_core::constants::MAX_SNAPSHOTS;
use bitcred_core::MonthlySnapshot;

use crate::config::StabilityParams;

/// Stability score in `[0, 1]` with production parameters.
///
/// Fewer than two snapshots is neutral (0.5); a zero mean balance is 0.0.
pub fn score_stability(snapshots: &[MonthlySnapshot]) -> f64 {
    score_stability_with(snapshots, &StabilityParams::DEFAULT)
}

/// [`score_stability`] with explicit parameters.
pub fn score_stability_with(snapshots: &[MonthlySnapshot], params: &StabilityParams) -> f64 {
    if snapshots.len() < 2 {
        return params.neutral;
    }

    let recent = &snapshots[snapshots.len().saturating_sub(MAX_SNAPSHOTS)..];
    let balances: Vec<u64> = recent.iter().map(|s| s.balance).collect();

    let mean = mean(&balances);
    if mean == 0.0 {
        return 0.0;
    }

    let cv = population_std_dev(&balances, mean) / mean;
    let mut stability = (-cv).exp();

    if balances.len() >= params.trend_min_points {
        let slope = ols_slope(&balances, mean);
        if slope > 0.0 {
            let bonus = (slope / mean * params.trend_multiplier).min(params.trend_cap);
            stability = (stability + bonus).min(1.0);
        }
    }

    stability
}

/// Arithmetic mean, summed exactly in integers first.
fn mean(values: &[u64]) -> f64 {
    let total: u128 = values.iter().map(|v| *v as u128).sum();
    total as f64 / values.len() as f64
}

fn population_std_dev(values: &[u64], mean: f64) -> f64 {
    let variance = values
        .iter()
        .map(|v| {
            let d = *v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Least-squares slope of `values` against `x = 0..n`.
pub fn ols_slope(values: &[u64], mean_y: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean_x = (n - 1) as f64 / 2.0;
    let (sxy, sxx) = values.iter().enumerate().fold((0.0, 0.0), |(sxy, sxx), (i, v)| {
        let dx = i as f64 - mean_x;
        (sxy + dx * (*v as f64 - mean_y), sxx + dx * dx)
    });
    sxy / sxx
}
