//! Axum router and HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bitcred_chain::ProviderError;
use bitcred_core::constants::{FRONTEND_SUBMISSION_REQUIRED, USDC_DECIMALS_DIVISOR};
use bitcred_core::Felt;
use bitcred_ledger::{LedgerError, U256};
use bitcred_proof::{derive_address_id, to_calldata, OnchainCalldata};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::AppState;

// ── Error helper ─────────────────────────────────────────────────────────────

struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    fn bad_request(error: impl Into<anyhow::Error>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, error: error.into() }
    }

    fn bad_gateway(error: impl Into<anyhow::Error>) -> Self {
        Self { status: StatusCode::BAD_GATEWAY, error: error.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.error.to_string() });
        (self.status, Json(body)).into_response()
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::InvalidAddress(_) => Self::bad_request(e),
            other => Self::bad_gateway(anyhow::anyhow!("Bitcoin API error: {other}")),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(e: LedgerError) -> Self {
        Self::bad_gateway(e)
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

// ── Router ───────────────────────────────────────────────────────────────────

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/score", post(score))
        .route("/score/:btc_address", get(registry_score))
        .route("/position/:starknet_address", get(position))
        .route("/liquidity", get(liquidity))
        .layer(cors)
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "status": "BitCred API running", "version": env!("CARGO_PKG_VERSION") }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ── POST /score ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ScoreRequest {
    /// Raw Bitcoin address. Hashed locally, never stored or forwarded on-chain.
    btc_address: String,
    #[serde(default)]
    submit_onchain: bool,
}

#[derive(Serialize, Deserialize, Debug)]
struct ScoreResponse {
    btc_address_hash: Felt,
    score: u16,
    tier: u8,
    collateral_ratio_pct: f64,
    hodl_sub: f64,
    frequency_sub: f64,
    stability_sub: f64,
    score_hash: String,
    calldata: OnchainCalldata,
    tx_hash: Option<String>,
    message: String,
}

async fn score(State(s): State<AppState>, Json(req): Json<ScoreRequest>) -> ApiResult<ScoreResponse> {
    let address = req.btc_address.trim();
    let wallet = s.chain.fetch(address).await.inspect_err(|e| warn!(error = %e, "wallet fetch failed"))?;

    let result = s.scorer.compute(&wallet);
    let commitment = s.commitments.generate(address, &result);
    let calldata = to_calldata(&commitment);

    // Submission is signed by the user's own Starknet wallet.
    let tx_hash = req.submit_onchain.then(|| FRONTEND_SUBMISSION_REQUIRED.to_string());

    info!(
        address_id = %commitment.address_hash,
        score = result.raw_score,
        tier = result.tier.as_u8(),
        awaiting_submission = req.submit_onchain,
        "score computed"
    );

    let pct = result.collateral_ratio_pct();
    Ok(Json(ScoreResponse {
        btc_address_hash: commitment.address_hash,
        score: result.raw_score,
        tier: result.tier.as_u8(),
        collateral_ratio_pct: pct,
        hodl_sub: result.hodl_sub,
        frequency_sub: result.frequency_sub,
        stability_sub: result.stability_sub,
        message: format!(
            "{} — Score {} unlocks {pct:.0}% collateral ratio.",
            result.tier.label(),
            result.raw_score
        ),
        score_hash: result.score_hash,
        calldata,
        tx_hash,
    }))
}

// ── GET /score/:btc_address ──────────────────────────────────────────────────

async fn registry_score(State(s): State<AppState>, Path(btc_address): Path<String>) -> ApiResult<Value> {
    let id = derive_address_id(btc_address.trim());
    let entry = s.ledger.get_registry_entry(id).await?;
    Ok(Json(json!({
        "btc_address_hash":     id,
        "collateral_ratio_bps": entry.collateral_ratio_bps,
        "collateral_ratio_pct": entry.collateral_ratio_pct(),
        "tier":                 entry.tier,
        "score":                entry.score,
        "last_updated":         entry.last_updated,
    })))
}

// ── GET /position/:starknet_address ──────────────────────────────────────────

async fn position(State(s): State<AppState>, Path(starknet_address): Path<String>) -> ApiResult<Value> {
    let user = Felt::from_hex(&starknet_address).map_err(ApiError::bad_request)?;
    let p = s.ledger.get_position(user).await?;
    Ok(Json(json!({
        "collateral_raw":       p.collateral,
        "debt_usd":             p.debt_usd(),
        "collateral_ratio_bps": p.collateral_ratio_bps,
        "collateral_ratio_pct": p.collateral_ratio_pct(),
        "is_liquidatable":      p.is_liquidatable,
        "health_factor":        p.health_factor(),
        "max_borrow_usd":       p.max_borrow_usd(),
    })))
}

// ── GET /liquidity ───────────────────────────────────────────────────────────

async fn liquidity(State(s): State<AppState>) -> ApiResult<Value> {
    let raw: U256 = s.ledger.get_available_liquidity().await?;
    Ok(Json(json!({
        "available_liquidity_raw":  raw,
        "available_liquidity_usdc": raw.scaled(USDC_DECIMALS_DIVISOR),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use bitcred_chain::ChainDataProvider;
    use bitcred_core::traits::{FixedClock, FixedRandom};
    use bitcred_core::{Month, MonthlySnapshot, Utxo, WalletData};
    use bitcred_ledger::{LedgerClient, Position};
    use bitcred_proof::{commit, CommitmentGenerator};
    use bitcred_scoring::{Scorer, ScoringConfig};
    use tower::ServiceExt;

    const ADDR: &str = "bc1qxy2kgdygjrsqtzq2n0yrf2493p83kkfjhx0wlh";
    const T0: u64 = 1_717_200_000;

    struct StubChain {
        result: Result<WalletData, ProviderError>,
    }

    #[async_trait]
    impl ChainDataProvider for StubChain {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn fetch(&self, address: &str) -> Result<WalletData, ProviderError> {
            if address.len() < 26 {
                return Err(ProviderError::InvalidAddress(address.to_string()));
            }
            self.result.clone()
        }
    }

    /// Registry knows every id; the pool has one open position.
    struct StubLedger {
        fail: bool,
    }

    impl StubLedger {
        fn check(&self) -> Result<(), LedgerError> {
            if self.fail {
                return Err(LedgerError::Client("connection refused".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl LedgerClient for StubLedger {
        async fn get_score(&self, _: Felt) -> Result<u16, LedgerError> {
            self.check().map(|_| 812)
        }
        async fn get_collateral_ratio(&self, _: Felt) -> Result<u32, LedgerError> {
            self.check().map(|_| 11_000)
        }
        async fn get_score_tier(&self, _: Felt) -> Result<u8, LedgerError> {
            self.check().map(|_| 1)
        }
        async fn get_last_updated(&self, _: Felt) -> Result<u64, LedgerError> {
            self.check().map(|_| T0)
        }
        async fn is_approved_scorer(&self, _: Felt) -> Result<bool, LedgerError> {
            self.check().map(|_| true)
        }
        async fn get_position(&self, _: Felt) -> Result<Position, LedgerError> {
            self.check()?;
            Ok(Position {
                collateral: U256::from(3_000_000u128),
                debt: U256::from(1_250_000u128),
                collateral_ratio_bps: 11_500,
                is_liquidatable: false,
                health_factor: U256::from(18_500u128),
                max_borrow: U256::from(2_000_000u128),
            })
        }
        async fn get_available_liquidity(&self) -> Result<U256, LedgerError> {
            self.check().map(|_| U256::from(7_500_000_000u128))
        }
        async fn submit_registry_write(&self, _: &str, _: Vec<Felt>) -> Result<Felt, LedgerError> {
            Err(LedgerError::NoAccount)
        }
    }

    fn hodler() -> WalletData {
        let snaps = (1..=12)
            .map(|m| MonthlySnapshot::new(Month::new(2024, m).unwrap(), 7_000_000 + m as u64 * 100_000, 3))
            .collect();
        WalletData::new(ADDR, vec![Utxo::new(5_000_000, 1460), Utxo::new(3_000_000, 730)], snaps).unwrap()
    }

    fn app(chain: Result<WalletData, ProviderError>, ledger_fails: bool) -> Router {
        let clock: crate::SharedClock = Arc::new(FixedClock(T0));
        let rng: crate::SharedRandom = Arc::new(FixedRandom([9u8; 32]));
        router(AppState {
            chain: Arc::new(StubChain { result: chain }),
            ledger: Arc::new(StubLedger { fail: ledger_fails }),
            scorer: Arc::new(Scorer::new(ScoringConfig::default(), clock.clone()).unwrap()),
            commitments: Arc::new(CommitmentGenerator::new(clock, rng)),
        })
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_score(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/score")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn root_and_health() {
        let (status, body) = send(app(Ok(hodler()), false), get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "BitCred API running", "version": env!("CARGO_PKG_VERSION")}));

        let (_, body) = send(app(Ok(hodler()), false), get("/health")).await;
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn scores_wallet() {
        let (status, body) = send(app(Ok(hodler()), false), post_score(json!({"btc_address": ADDR}))).await;
        assert_eq!(status, StatusCode::OK);

        let resp: ScoreResponse = serde_json::from_value(body).unwrap();
        let id = derive_address_id(ADDR);
        assert_eq!(resp.btc_address_hash, id);
        assert_eq!(resp.score, 831);
        assert_eq!(resp.tier, 1);
        assert_eq!(resp.collateral_ratio_pct, 110.0);
        assert_eq!(resp.hodl_sub, 0.7775);
        assert_eq!(resp.frequency_sub, 1.0);
        assert_eq!(resp.stability_sub, 0.982);
        assert!(resp.score_hash.ends_with('1'));
        assert_eq!(resp.tx_hash, None);
        assert_eq!(resp.message, "Diamond Hands — Score 831 unlocks 110% collateral ratio.");

        assert_eq!(resp.calldata.btc_address_hash, id);
        assert_eq!(resp.calldata.score, 831);
        assert_eq!(resp.calldata.proof, vec![commit(&id, bitcred_core::Tier::One, &[9u8; 32], T0)]);
    }

    #[tokio::test]
    async fn onchain_submission_is_left_to_the_wallet() {
        let req = post_score(json!({"btc_address": format!("  {ADDR} "), "submit_onchain": true}));
        let (status, body) = send(app(Ok(hodler()), false), req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["tx_hash"], "frontend_submission_required");
        assert_eq!(body["btc_address_hash"], derive_address_id(ADDR).to_hex());
    }

    #[tokio::test]
    async fn short_address_is_bad_request() {
        let (status, body) =
            send(app(Ok(hodler()), false), post_score(json!({"btc_address": "bc1qshort"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("invalid Bitcoin address"));
    }

    #[tokio::test]
    async fn provider_exhaustion_is_bad_gateway() {
        let err = ProviderError::AllFailed {
            address: ADDR.into(),
            errors: vec!["Blockchain.com: HTTP 429".into()],
        };
        let (status, body) = send(app(Err(err), false), post_score(json!({"btc_address": ADDR}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        let msg = body["error"].as_str().unwrap();
        assert!(msg.starts_with("Bitcoin API error: All Bitcoin APIs failed"), "{msg}");
        assert!(msg.contains("Blockchain.com: HTTP 429"));
    }

    #[tokio::test]
    async fn registry_lookup() {
        let (status, body) = send(app(Ok(hodler()), false), get(&format!("/score/{ADDR}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "btc_address_hash": derive_address_id(ADDR).to_hex(),
                "collateral_ratio_bps": 11_000,
                "collateral_ratio_pct": 110.0,
                "tier": 1,
                "score": 812,
                "last_updated": T0,
            })
        );
    }

    #[tokio::test]
    async fn ledger_failure_is_bad_gateway() {
        let (status, body) = send(app(Ok(hodler()), true), get("/liquidity")).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn lending_position() {
        let (status, body) = send(app(Ok(hodler()), false), get("/position/0x77")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collateral_raw"], "3000000");
        assert_eq!(body["debt_usd"], 1.25);
        assert_eq!(body["collateral_ratio_pct"], 115.0);
        assert_eq!(body["is_liquidatable"], false);
        assert_eq!(body["health_factor"], 1.85);
        assert_eq!(body["max_borrow_usd"], 2.0);
    }

    #[tokio::test]
    async fn malformed_starknet_address_is_bad_request() {
        let (status, _) = send(app(Ok(hodler()), false), get("/position/not-hex")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn pool_liquidity() {
        let (status, body) = send(app(Ok(hodler()), false), get("/liquidity")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"available_liquidity_raw": "7500000000", "available_liquidity_usdc": 7500.0})
        );
    }
}
