//! # bitcred-scoring — On-chain behaviour scoring engine.
//!
//! Maps a wallet's UTXO set and monthly history to a credit score:
//! - **Hodl duration** (40%): value-weighted UTXO age on a `1 - e^(-days/730)` curve.
//! - **Transaction frequency** (30%): per-month activity against an ideal band of 2–8 txs.
//! - **Balance stability** (30%): `e^(-cv)` of monthly balances plus a capped
//!   bonus for a rising least-squares trend.
//!
//! The weighted composite is mapped onto 650–850 and bucketed into a
//! collateral tier. Every function here is pure apart from the injected
//! [`Clock`](bitcred_core::traits::Clock) that timestamps the score hash.

pub mod canonical;
pub mod composite;
pub mod config;
pub mod frequency;
pub mod hodl;
pub mod stability;

pub use composite::{compute_score, ProofInput, ScoreResult, Scorer, SubScores};
pub use config::{ConfigError, FrequencyCurve, ScoringConfig, StabilityParams, TierBand, Weights};
pub use frequency::score_frequency;
pub use hodl::score_hodl;
pub use stability::score_stability;
