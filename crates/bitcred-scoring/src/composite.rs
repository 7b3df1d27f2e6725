//! Composite scorer implementing the full wallet score.
//!
//! Combines the three sub-scores with fixed weights, maps the result onto
//! 650–850, picks the collateral tier and binds everything into a
//! timestamped `score_hash`. The hash input is a canonical JSON record, so
//! two calls agree exactly when address, tier, timestamp and rounded
//! sub-scores agree. Calls at different wall-clock seconds yield different
//! hashes; inject a [`FixedClock`](bitcred_core::traits::FixedClock) to
//! reproduce one.

use bitcred_core::traits::{Clock, SystemClock};
use bitcred_core::{Tier, WalletData};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use crate::canonical::{sha256_hex, to_canonical_json};
use crate::config::{ConfigError, ScoringConfig, Weights};
use crate::frequency::score_frequency_with;
use crate::hodl::score_hodl_with;
use crate::stability::score_stability_with;

/// Decimal places of sub-scores inside the hash pre-image.
pub const PROOF_DECIMALS: i32 = 6;

/// Decimal places of sub-scores in [`ScoreResult`].
pub const DISPLAY_DECIMALS: i32 = 4;

/// The three normalized sub-scores, each in `[0, 1]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct SubScores {
    pub hodl: f64,
    pub frequency: f64,
    pub stability: f64,
}

impl SubScores {
    /// Weighted sum; non-decreasing in every component for non-negative weights.
    pub fn composite(&self, weights: &Weights) -> f64 {
        self.hodl * weights.hodl + self.frequency * weights.frequency + self.stability * weights.stability
    }
}

/// Structured pre-image of `score_hash`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProofInput {
    pub wallet_address: String,
    pub score_tier: Tier,
    pub timestamp: u64,
    pub hodl_component: f64,
    pub freq_component: f64,
    pub stable_component: f64,
}

impl ProofInput {
    /// Sorted-key JSON encoding that gets hashed.
    pub fn canonical_json(&self) -> String {
        to_canonical_json(json!({
            "wallet_address": self.wallet_address,
            "score_tier": self.score_tier.as_u8(),
            "timestamp": self.timestamp,
            "hodl_component": self.hodl_component,
            "freq_component": self.freq_component,
            "stable_component": self.stable_component,
        }))
    }

    /// SHA-256 of the canonical JSON with the final hex digit replaced by the
    /// tier number, so the registry can read the tier off the hash.
    pub fn score_hash(&self) -> String {
        let mut digest = sha256_hex(self.canonical_json().as_bytes());
        digest.pop();
        digest.push(self.score_tier.hex_digit());
        digest
    }
}

/// Outcome of scoring one wallet.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScoreResult {
    /// Composite score in 650–850.
    pub raw_score: u16,
    pub tier: Tier,
    pub collateral_ratio_bps: u32,
    pub hodl_sub: f64,
    pub frequency_sub: f64,
    pub stability_sub: f64,
    pub score_hash: String,
    pub proof_input: ProofInput,
}

impl ScoreResult {
    pub fn collateral_ratio_pct(&self) -> f64 {
        self.collateral_ratio_bps as f64 / 100.0
    }
}

/// Wallet scorer with an injected configuration and clock.
#[derive(Debug, Clone)]
pub struct Scorer<C = SystemClock> {
    config: ScoringConfig,
    clock: C,
}

impl Default for Scorer<SystemClock> {
    fn default() -> Self {
        Self {
            config: ScoringConfig::default(),
            clock: SystemClock,
        }
    }
}

impl<C: Clock> Scorer<C> {
    /// Build a scorer after validating `config`.
    pub fn new(config: ScoringConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, clock })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Evaluate the three sub-scorers. They are independent of each other.
    pub fn sub_scores(&self, wallet: &WalletData) -> SubScores {
        SubScores {
            hodl: score_hodl_with(wallet.utxos(), self.config.hodl_decay_days),
            frequency: score_frequency_with(wallet.monthly_snapshots(), &self.config.frequency),
            stability: score_stability_with(wallet.monthly_snapshots(), &self.config.stability),
        }
    }

    /// Map a composite fraction onto the score range, flooring, then clamp.
    pub fn raw_score(&self, composite: f64) -> u16 {
        let (min, max) = (self.config.score_min, self.config.score_max);
        let raw = (min as f64 + composite * (max - min) as f64).floor();
        if !raw.is_finite() {
            return min;
        }
        raw.clamp(min as f64, max as f64) as u16
    }

    /// Score `wallet`, reading the clock once for the hash timestamp.
    pub fn compute(&self, wallet: &WalletData) -> ScoreResult {
        let subs = self.sub_scores(wallet);
        let composite = subs.composite(&self.config.weights);
        let raw_score = self.raw_score(composite);
        let band = self.config.band_for(raw_score);

        let proof_input = ProofInput {
            wallet_address: wallet.address().to_string(),
            score_tier: band.tier,
            timestamp: self.clock.now_unix(),
            hodl_component: round_to(subs.hodl, PROOF_DECIMALS),
            freq_component: round_to(subs.frequency, PROOF_DECIMALS),
            stable_component: round_to(subs.stability, PROOF_DECIMALS),
        };
        let score_hash = proof_input.score_hash();

        debug!(
            hodl = subs.hodl,
            frequency = subs.frequency,
            stability = subs.stability,
            composite,
            raw_score,
            tier = band.tier.as_u8(),
            "wallet scored"
        );

        ScoreResult {
            raw_score,
            tier: band.tier,
            collateral_ratio_bps: band.collateral_ratio_bps,
            hodl_sub: round_to(subs.hodl, DISPLAY_DECIMALS),
            frequency_sub: round_to(subs.frequency, DISPLAY_DECIMALS),
            stability_sub: round_to(subs.stability, DISPLAY_DECIMALS),
            score_hash,
            proof_input,
        }
    }
}

/// Score `wallet` with the production configuration and the system clock.
pub fn compute_score(wallet: &WalletData) -> ScoreResult {
    Scorer::default().compute(wallet)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcred_core::traits::FixedClock;
    use bitcred_core::{Month, MonthlySnapshot, Utxo};
    use proptest::prelude::*;

    const T0: u64 = 1_717_200_000;

    fn scorer() -> Scorer<FixedClock> {
        Scorer::new(ScoringConfig::default(), FixedClock(T0)).unwrap()
    }

    fn hodler() -> WalletData {
        let snaps = (1..=12)
            .map(|m| MonthlySnapshot::new(Month::new(2024, m).unwrap(), 7_000_000 + m as u64 * 100_000, 3))
            .collect();
        WalletData::new(
            "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh",
            vec![Utxo::new(5_000_000, 1460), Utxo::new(3_000_000, 730)],
            snaps,
        )
        .unwrap()
    }

    fn fresh() -> WalletData {
        WalletData::new(
            "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh",
            vec![],
            vec![MonthlySnapshot::new(Month::new(2024, 6).unwrap(), 0, 0)],
        )
        .unwrap()
    }

    #[test]
    fn long_term_hodler_is_tier_one() {
        let r = scorer().compute(&hodler());
        assert!(r.hodl_sub > 0.77 && r.hodl_sub < 0.80, "hodl {}", r.hodl_sub);
        assert_eq!(r.frequency_sub, 1.0);
        assert!(r.stability_sub > 0.95 && r.stability_sub < 1.0, "stability {}", r.stability_sub);
        assert!((800..=850).contains(&r.raw_score), "score {}", r.raw_score);
        assert_eq!(r.tier, Tier::One);
        assert_eq!(r.collateral_ratio_bps, 11_000);
        assert_eq!(r.collateral_ratio_pct(), 110.0);
    }

    #[test]
    fn empty_wallet_is_tier_four() {
        let r = scorer().compute(&fresh());
        assert_eq!(r.hodl_sub, 0.0);
        assert_eq!(r.frequency_sub, 0.1);
        assert_eq!(r.stability_sub, 0.5);
        assert_eq!(r.raw_score, 686);
        assert_eq!(r.tier, Tier::Four);
        assert_eq!(r.collateral_ratio_bps, 13_000);
    }

    #[test]
    fn raw_score_is_clamped() {
        let s = scorer();
        assert_eq!(s.raw_score(0.0), 650);
        assert_eq!(s.raw_score(1.0), 850);
        assert_eq!(s.raw_score(1.7), 850);
        assert_eq!(s.raw_score(-0.3), 650);
        assert_eq!(s.raw_score(f64::NAN), 650);
    }

    #[test]
    fn raw_score_floors() {
        let s = scorer();
        // 650 + 0.7475 * 200 = 799.5 floors to 799, the top of tier 2.
        assert_eq!(s.raw_score(0.7475), 799);
        assert_eq!(s.config().band_for(799).tier, Tier::Two);
        assert_eq!(s.raw_score(0.75), 800);
        assert_eq!(s.config().band_for(800).tier, Tier::One);
    }

    #[test]
    fn proof_input_fields() {
        let r = scorer().compute(&hodler());
        let p = &r.proof_input;
        assert_eq!(p.wallet_address, "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh");
        assert_eq!(p.score_tier, Tier::One);
        assert_eq!(p.timestamp, T0);
        assert_eq!(p.freq_component, 1.0);
        assert_eq!(p.hodl_component, round_to(p.hodl_component, 6));
    }

    #[test]
    fn canonical_json_has_sorted_keys() {
        let p = ProofInput {
            wallet_address: "addr".into(),
            score_tier: Tier::Two,
            timestamp: 10,
            hodl_component: 0.5,
            freq_component: 1.0,
            stable_component: 0.25,
        };
        assert_eq!(
            p.canonical_json(),
            r#"{"freq_component": 1.0, "hodl_component": 0.5, "score_tier": 2, "stable_component": 0.25, "timestamp": 10, "wallet_address": "addr"}"#
        );
    }

    #[test]
    fn hash_is_reproducible_at_fixed_time() {
        let a = scorer().compute(&hodler());
        let b = scorer().compute(&hodler());
        assert_eq!(a.score_hash, b.score_hash);
        assert_eq!(a.score_hash.len(), 64);
        assert_eq!(a.score_hash, a.proof_input.score_hash());
    }

    #[test]
    fn hash_changes_with_timestamp() {
        let later = Scorer::new(ScoringConfig::default(), FixedClock(T0 + 1)).unwrap();
        assert_ne!(scorer().compute(&hodler()).score_hash, later.compute(&hodler()).score_hash);
    }

    #[test]
    fn hash_ends_with_tier_digit() {
        let r1 = scorer().compute(&hodler());
        assert!(r1.score_hash.ends_with('1'));
        let r4 = scorer().compute(&fresh());
        assert!(r4.score_hash.ends_with('4'));

        for tier in [Tier::One, Tier::Two, Tier::Three, Tier::Four] {
            let p = ProofInput {
                wallet_address: "addr".into(),
                score_tier: tier,
                timestamp: 0,
                hodl_component: 0.0,
                freq_component: 0.0,
                stable_component: 0.0,
            };
            let hash = p.score_hash();
            assert_eq!(hash.chars().last(), Some(tier.hex_digit()));
            // Every other digit is the untouched SHA-256 output.
            let digest = sha256_hex(p.canonical_json().as_bytes());
            assert_eq!(hash[..63], digest[..63]);
        }
    }

    #[test]
    fn alternate_weights_are_honoured() {
        let mut cfg = ScoringConfig::default();
        cfg.weights = Weights { hodl: 0.0, frequency: 0.0, stability: 1.0 };
        let s = Scorer::new(cfg, FixedClock(T0)).unwrap();
        // Stability 0.5 alone: 650 + 0.5 * 200.
        assert_eq!(s.compute(&fresh()).raw_score, 750);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut cfg = ScoringConfig::default();
        cfg.weights.frequency = 0.9;
        assert!(Scorer::new(cfg, FixedClock(T0)).is_err());
    }

    proptest! {
        #[test]
        fn composite_is_monotonic(
            h in 0.0f64..=1.0, f in 0.0f64..=1.0, s in 0.0f64..=1.0, bump in 0.0f64..=1.0,
        ) {
            let w = Weights::DEFAULT;
            let base = SubScores { hodl: h, frequency: f, stability: s }.composite(&w);
            let h2 = (h + bump).min(1.0);
            let f2 = (f + bump).min(1.0);
            let s2 = (s + bump).min(1.0);
            let more_hodl = SubScores { hodl: h2, frequency: f, stability: s }.composite(&w);
            let more_freq = SubScores { hodl: h, frequency: f2, stability: s }.composite(&w);
            let more_stable = SubScores { hodl: h, frequency: f, stability: s2 }.composite(&w);
            prop_assert!(more_hodl >= base);
            prop_assert!(more_freq >= base);
            prop_assert!(more_stable >= base);
        }

        #[test]
        fn raw_score_in_range(h in 0.0f64..=1.0, f in 0.0f64..=1.0, s in 0.0f64..=1.0) {
            let scorer = scorer();
            let c = SubScores { hodl: h, frequency: f, stability: s }.composite(&Weights::DEFAULT);
            let raw = scorer.raw_score(c);
            prop_assert!((650..=850).contains(&raw));
            let band = scorer.config().band_for(raw);
            prop_assert!(band.contains(raw));
        }
    }
}
