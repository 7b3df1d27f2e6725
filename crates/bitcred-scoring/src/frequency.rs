//! Transaction-frequency sub-score.
//!
//! Months with 2–8 transactions are ideal. Dormant months still earn a little
//! credit so pure accumulators are not punished, and very busy months are
//! treated as trading rather than holding.

use bitcred_core::constants::MAX_SNAPSHOTS;
use bitcred_core::MonthlySnapshot;

use crate::config::FrequencyCurve;

/// Mean per-month score over the latest twelve snapshots. Empty input is 0.0.
pub fn score_frequency(snapshots: &[MonthlySnapshot]) -> f64 {
    score_frequency_with(snapshots, &FrequencyCurve::DEFAULT)
}

/// [`score_frequency`] with an explicit curve.
pub fn score_frequency_with(snapshots: &[MonthlySnapshot], curve: &FrequencyCurve) -> f64 {
    let recent = latest(snapshots);
    if recent.is_empty() {
        return 0.0;
    }
    // Running mean, exact for constant sequences.
    recent
        .iter()
        .map(|s| month_score(s.tx_count, curve))
        .enumerate()
        .fold(0.0, |mean, (i, x)| mean + (x - mean) / (i + 1) as f64)
}

/// Piecewise score for one month's transaction count.
pub fn month_score(tx_count: u64, curve: &FrequencyCurve) -> f64 {
    match tx_count {
        0 => curve.dormant,
        n if n < curve.ideal_min => curve.single,
        n if n <= curve.ideal_max => 1.0,
        n if n <= curve.decay_max => 1.0 - curve.decay_step * (n - curve.ideal_max) as f64,
        n if n <= curve.busy_max => curve.busy,
        _ => curve.trader,
    }
}

fn latest(snapshots: &[MonthlySnapshot]) -> &[MonthlySnapshot] {
    &snapshots[snapshots.len().saturating_sub(MAX_SNAPSHOTS)..]
}
