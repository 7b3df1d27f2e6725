//! bitcred-cli — Score a Bitcoin wallet from the command line.
//!
//! Fetches the wallet's history from public explorers, prints the score,
//! tier and the registry calldata, and reads back what the Starknet
//! registry currently holds for the wallet. With `--submit`, an approved
//! scorer account signs and sends the registry write itself.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use bitcred_chain::{ChainDataProvider, FallbackProvider, ProviderConfig, SnapshotPolicy};
use bitcred_core::{Felt, WalletData};
use bitcred_ledger::{
    selector, LedgerClient, ScorerAccount, ScorerKey, StarknetClient, StarknetConfig, DEFAULT_STARKNET_RPC,
};
use bitcred_proof::{derive_address_id, generate_commitment, to_calldata, RegistryEntryPoint};
use bitcred_scoring::Scorer;
use serde_json::json;
use tracing::{info, warn};

/// Environment variable holding the scorer account's private key.
const SCORER_KEY_VAR: &str = "SCORER_PRIVATE_KEY";

/// BitCred command-line scorer.
#[derive(Parser)]
#[command(name = "bitcred-cli")]
#[command(version, about = "Bitcoin on-chain credit scores for Starknet lending.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a wallet and print the registry calldata.
    Score(ScoreArgs),
    /// Print the felt id a Bitcoin address is registered under.
    AddressHash(AddressHashArgs),
    /// Read a wallet's registry entry.
    Lookup(LookupArgs),
}

#[derive(Args)]
struct ScoreArgs {
    /// Bitcoin address to score.
    address: String,

    /// Print machine-readable JSON instead of a summary.
    #[arg(long)]
    json: bool,

    /// Explorer request timeout in seconds.
    #[arg(short, long, default_value = "20")]
    timeout: u64,

    /// How monthly balances are estimated: running-sum, current-balance or
    /// anchored. Defaults to each explorer's own estimate.
    #[arg(long)]
    balance_history: Option<SnapshotPolicy>,

    /// Registry contract. When set, picks register_score or update_score
    /// from the wallet's current entry.
    #[arg(long)]
    registry: Option<Felt>,

    /// Sign and submit the registry write from the scorer account. The key
    /// is read from SCORER_PRIVATE_KEY.
    #[arg(long, requires_all = ["registry", "account"])]
    submit: bool,

    /// Approved scorer account contract address.
    #[arg(long)]
    account: Option<Felt>,

    /// Starknet JSON-RPC endpoint.
    #[arg(long, default_value = DEFAULT_STARKNET_RPC)]
    rpc_url: String,
}

#[derive(Args)]
struct AddressHashArgs {
    /// Bitcoin address.
    address: String,
}

#[derive(Args)]
struct LookupArgs {
    /// Bitcoin address.
    address: String,

    /// Registry contract address.
    #[arg(long)]
    registry: Felt,

    /// Starknet JSON-RPC endpoint.
    #[arg(long, default_value = DEFAULT_STARKNET_RPC)]
    rpc_url: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score(args) => score(args).await,
        Commands::AddressHash(args) => address_hash(args),
        Commands::Lookup(args) => lookup(args).await,
    }
}

/// Fetch, score and commit.
async fn score(args: ScoreArgs) -> Result<()> {
    let address = args.address.trim();
    let providers = ProviderConfig {
        timeout: Duration::from_secs(args.timeout),
        balance_history: args.balance_history,
        ..ProviderConfig::default()
    };
    let chain = FallbackProvider::from_config(&providers).context("Failed to build explorer HTTP client")?;
    let wallet = fetch_wallet(&chain, address).await?;

    let result = Scorer::default().compute(&wallet);
    let commitment = generate_commitment(address, &result);
    let calldata = to_calldata(&commitment);

    let mut ledger = None;
    let mut entry_point = None;
    if let Some(registry) = args.registry {
        let client = starknet_client(&args.rpc_url, registry)?;
        info!(registry = %registry, id = %commitment.address_hash, "reading registry entry");
        let last_updated = client
            .get_last_updated(commitment.address_hash)
            .await
            .inspect_err(|e| warn!(error = %e, "registry read failed"))
            .context("Failed to read registry entry")?;
        entry_point = Some(RegistryEntryPoint::for_last_updated(last_updated));
        ledger = Some(client);
    }

    let mut tx_hash = None;
    if args.submit {
        let (Some(ledger), Some(entry_point), Some(account)) = (ledger, entry_point, args.account) else {
            anyhow::bail!("--submit needs --registry and --account");
        };
        let key = std::env::var(SCORER_KEY_VAR).with_context(|| format!("{SCORER_KEY_VAR} is not set"))?;
        let key = ScorerKey::from_hex(key.trim()).context("Invalid scorer private key")?;
        let ledger = ledger.with_account(ScorerAccount::new(account, key));
        info!(entry_point = entry_point.name(), account = %account, "submitting registry write");
        let hash = ledger
            .submit_registry_write(entry_point.name(), calldata.to_felts())
            .await
            .inspect_err(|e| warn!(error = %e, "registry write failed"))
            .context("Failed to submit registry write")?;
        tx_hash = Some(hash);
    }

    if args.json {
        let out = json!({
            "score": result,
            "calldata": calldata,
            "calldata_felts": calldata.to_felts(),
            "nonce": commitment.nonce_hex(),
            "entry_point": entry_point.map(|e| e.name()),
            "transaction_hash": tx_hash,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("\n=== WALLET SCORE ===");
    println!("Score:            {} ({})", result.raw_score, result.tier.label());
    println!("Tier:             {}", result.tier);
    println!("Collateral ratio: {:.0}%", result.collateral_ratio_pct());
    println!("  Hodl:           {:.4}", result.hodl_sub);
    println!("  Frequency:      {:.4}", result.frequency_sub);
    println!("  Stability:      {:.4}", result.stability_sub);
    println!("Score hash:       {}", result.score_hash);

    println!("\n=== REGISTRY CALLDATA ===");
    println!("Address hash: {}", commitment.address_hash_hex());
    println!("Commitment:   {}", commitment.commitment_hex());
    println!("Calldata:     {}", serde_json::to_string(&calldata)?);
    if let Some(entry_point) = entry_point {
        println!("Entry point:  {} ({})", entry_point.name(), selector(entry_point.name()));
    }
    if let Some(hash) = tx_hash {
        println!("Submitted:    {hash}");
    }

    println!("\nNonce: {}", commitment.nonce_hex());
    println!("WARNING: The nonce is the only way to open this commitment. It will NOT be shown again.");
    Ok(())
}

async fn fetch_wallet(chain: &FallbackProvider, address: &str) -> Result<WalletData> {
    info!(address, providers = ?chain.provider_names(), "fetching wallet history");
    let wallet = chain
        .fetch(address)
        .await
        .inspect_err(|e| warn!(address, error = %e, "wallet fetch failed"))
        .context("Failed to fetch wallet history")?;
    info!(
        utxos = wallet.utxos().len(),
        months = wallet.monthly_snapshots().len(),
        "wallet history fetched"
    );
    Ok(wallet)
}

fn address_hash(args: AddressHashArgs) -> Result<()> {
    println!("{}", derive_address_id(args.address.trim()));
    Ok(())
}

/// Read the registry's current entry for a wallet.
async fn lookup(args: LookupArgs) -> Result<()> {
    let id = derive_address_id(args.address.trim());
    let ledger = starknet_client(&args.rpc_url, args.registry)?;
    info!(registry = %args.registry, id = %id, "reading registry entry");
    let entry = ledger
        .get_registry_entry(id)
        .await
        .inspect_err(|e| warn!(error = %e, "registry read failed"))
        .context("Failed to read registry entry")?;

    println!("Address hash:     {id}");
    if !entry.is_registered() {
        println!("Not registered (default ratio {:.0}%)", entry.collateral_ratio_pct());
        return Ok(());
    }
    println!("Score:            {}", entry.score);
    println!("Tier:             {}", entry.tier);
    println!("Collateral ratio: {:.0}%", entry.collateral_ratio_pct());
    println!("Last updated:     {}", entry.last_updated);
    Ok(())
}

fn starknet_client(rpc_url: &str, registry: Felt) -> Result<StarknetClient> {
    let config = StarknetConfig {
        rpc_url: rpc_url.to_string(),
        registry,
        lending: Felt::ZERO,
        timeout: Duration::from_secs(20),
    };
    StarknetClient::new(&config).context("Failed to connect to Starknet RPC")
}
