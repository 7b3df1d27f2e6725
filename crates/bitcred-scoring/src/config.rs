//! Scoring parameters.
//!
//! [`ScoringConfig::default`] carries the production constants. The frequency
//! breakpoints and the stability bonus cap were picked empirically; they are
//! kept exactly so scores stay comparable with ones already on the registry.

use bitcred_core::constants::{SCORE_MAX, SCORE_MIN};
use bitcred_core::Tier;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("weights must sum to 1.0, got {0}")] WeightSum(f64),
    #[error("negative weight: {0}")] NegativeWeight(f64),
    #[error("invalid score range {min}..={max}")] ScoreRange { min: u16, max: u16 },
    #[error("tier band {min}..={max} is empty")] EmptyBand { min: u16, max: u16 },
    #[error("tier bands must be listed from best to worst without overlap")] BandOrder,
    #[error("hodl decay constant must be positive, got {0}")] HodlDecay(f64),
    #[error("{name} must be within [0, 1], got {value}")] OutOfUnitRange { name: &'static str, value: f64 },
    #[error("frequency bands must satisfy ideal_min <= ideal_max <= decay_max <= busy_max")] FrequencyBands,
    #[error("frequency decay of {0} over the decay band drops below zero")] DecayOverrun(f64),
    #[error("trend multiplier must be non-negative, got {0}")] TrendMultiplier(f64),
}

fn unit(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

/// Composite weights for the three sub-scores.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct Weights {
    pub hodl: f64,
    pub frequency: f64,
    pub stability: f64,
}

impl Weights {
    pub const DEFAULT: Self = Self {
        hodl: 0.40,
        frequency: 0.30,
        stability: 0.30,
    };

    pub fn sum(&self) -> f64 {
        self.hodl + self.frequency + self.stability
    }
}

/// Piecewise per-month score by transaction count.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct FrequencyCurve {
    /// Score for a month with no transactions.
    pub dormant: f64,
    /// Score for a month with exactly one transaction.
    pub single: f64,
    pub ideal_min: u64,
    pub ideal_max: u64,
    /// Upper bound of the linear decay band after `ideal_max`.
    pub decay_max: u64,
    /// Score lost per transaction above `ideal_max` inside the decay band.
    pub decay_step: f64,
    /// Upper bound of the busy band.
    pub busy_max: u64,
    pub busy: f64,
    /// Score above `busy_max`, i.e. trading rather than holding.
    pub trader: f64,
}

impl FrequencyCurve {
    pub const DEFAULT: Self = Self {
        dormant: 0.1,
        single: 0.4,
        ideal_min: 2,
        ideal_max: 8,
        decay_max: 15,
        decay_step: 0.07,
        busy_max: 20,
        busy: 0.4,
        trader: 0.1,
    };

    /// Every band score stays in `[0, 1]`, including the bottom of the decay band.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("frequency.dormant", self.dormant)?;
        unit("frequency.single", self.single)?;
        unit("frequency.decay_step", self.decay_step)?;
        unit("frequency.busy", self.busy)?;
        unit("frequency.trader", self.trader)?;
        if !(self.ideal_min <= self.ideal_max
            && self.ideal_max <= self.decay_max
            && self.decay_max <= self.busy_max)
        {
            return Err(ConfigError::FrequencyBands);
        }
        let drop = self.decay_step * (self.decay_max - self.ideal_max) as f64;
        if drop > 1.0 {
            return Err(ConfigError::DecayOverrun(drop));
        }
        Ok(())
    }
}

/// Balance-stability parameters.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct StabilityParams {
    /// Score when there are fewer than two snapshots.
    pub neutral: f64,
    /// Minimum snapshots before the accumulation trend is fitted.
    pub trend_min_points: usize,
    pub trend_multiplier: f64,
    pub trend_cap: f64,
}

impl StabilityParams {
    pub const DEFAULT: Self = Self {
        neutral: 0.5,
        trend_min_points: 4,
        trend_multiplier: 2.0,
        trend_cap: 0.15,
    };

    pub fn validate(&self) -> Result<(), ConfigError> {
        unit("stability.neutral", self.neutral)?;
        unit("stability.trend_cap", self.trend_cap)?;
        if !(self.trend_multiplier >= 0.0) {
            return Err(ConfigError::TrendMultiplier(self.trend_multiplier));
        }
        Ok(())
    }
}

/// An inclusive raw-score range mapped to a tier.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierBand {
    pub min: u16,
    pub max: u16,
    pub tier: Tier,
    pub collateral_ratio_bps: u32,
}

impl TierBand {
    pub fn contains(&self, score: u16) -> bool {
        self.min <= score && score <= self.max
    }
}

/// Production tier table, best tier first.
pub const TIERS: [TierBand; 4] = [
    TierBand { min: 800, max: 850, tier: Tier::One, collateral_ratio_bps: 11_000 },
    TierBand { min: 750, max: 799, tier: Tier::Two, collateral_ratio_bps: 11_500 },
    TierBand { min: 700, max: 749, tier: Tier::Three, collateral_ratio_bps: 12_000 },
    TierBand { min: 650, max: 699, tier: Tier::Four, collateral_ratio_bps: 13_000 },
];

/// Band used when no table entry matches.
pub const FALLBACK_BAND: TierBand = TierBand {
    min: SCORE_MIN,
    max: SCORE_MAX,
    tier: Tier::Four,
    collateral_ratio_bps: 13_000,
};

/// Complete scorer configuration.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoringConfig {
    pub weights: Weights,
    pub score_min: u16,
    pub score_max: u16,
    /// Days for a UTXO's hodl score to reach `1 - 1/e`.
    pub hodl_decay_days: f64,
    pub frequency: FrequencyCurve,
    pub stability: StabilityParams,
    /// Scanned in order; the first band containing the score wins.
    pub tiers: Vec<TierBand>,
    pub fallback: TierBand,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            weights: Weights::DEFAULT,
            score_min: SCORE_MIN,
            score_max: SCORE_MAX,
            hodl_decay_days: crate::hodl::HODL_DECAY_DAYS,
            frequency: FrequencyCurve::DEFAULT,
            stability: StabilityParams::DEFAULT,
            tiers: TIERS.to_vec(),
            fallback: FALLBACK_BAND,
        }
    }
}

impl ScoringConfig {
    /// Check weights, score range, sub-score parameters and tier table.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = self.weights;
        for weight in [w.hodl, w.frequency, w.stability] {
            if weight < 0.0 {
                return Err(ConfigError::NegativeWeight(weight));
            }
        }
        if (w.sum() - 1.0).abs() > 1e-9 {
            return Err(ConfigError::WeightSum(w.sum()));
        }
        if self.score_min >= self.score_max {
            return Err(ConfigError::ScoreRange { min: self.score_min, max: self.score_max });
        }
        if !(self.hodl_decay_days > 0.0) {
            return Err(ConfigError::HodlDecay(self.hodl_decay_days));
        }
        self.frequency.validate()?;
        self.stability.validate()?;
        for band in &self.tiers {
            if band.min > band.max {
                return Err(ConfigError::EmptyBand { min: band.min, max: band.max });
            }
        }
        if self.tiers.windows(2).any(|pair| pair[1].max >= pair[0].min) {
            return Err(ConfigError::BandOrder);
        }
        Ok(())
    }

    /// First band (best to worst) containing `score`, else the fallback band.
    pub fn band_for(&self, score: u16) -> TierBand {
        self.tiers
            .iter()
            .copied()
            .find(|band| band.contains(score))
            .unwrap_or(self.fallback)
    }
}
