use anyhow::{bail, Result};
use atlas_client::{ClientError, Ledger, Marketplace, MemoryLedger, Network, NetworkConfig, Session};
use atlas_execution::TradeError;
use atlas_storage::Storage;
use atlas_types::{
    Address, AssetCategory, AssetId, AssetMetadata, NewAssetRequest, ShareStructure, ShareType, TokenAmount,
};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(author, version, about = "Atlas marketplace simulation runner")]
struct Args {
    /// Number of buyer wallets.
    #[arg(long, default_value_t = 50)]
    buyers: usize,
    /// Number of listed assets.
    #[arg(long, default_value_t = 5)]
    assets: usize,
    /// Number of purchase attempts.
    #[arg(long, default_value_t = 2_000)]
    purchases: usize,
    /// Tokens airdropped to each buyer.
    #[arg(long, default_value_t = 10_000)]
    simulation_money: u64,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
struct SimReport {
    attempted: u64,
    purchased: u64,
    refused: u64,
    ledger_failures: u64,
    transfers: u64,
    shares_sold: u64,
    sold_out_assets: u64,
}

const CREATOR: Address = Address([0xc0; 20]);

fn wallet_address(index: usize) -> Address {
    let mut bytes = [0u8; 20];
    bytes[12..].copy_from_slice(&(index as u64 + 1).to_be_bytes());
    Address(bytes)
}

fn random_listing(rng: &mut StdRng, index: usize) -> NewAssetRequest {
    let total_shares = rng.gen_range(100..=10_000);
    // Between 0.01 and 5 tokens per share.
    let price_cents: u64 = rng.gen_range(1..=500);
    let max_purchase_amount = if rng.gen_bool(0.5) { 0 } else { rng.gen_range(10..=total_shares / 2) };

    NewAssetRequest {
        metadata: AssetMetadata {
            name: format!("Simulated asset #{index}"),
            description: "Generated listing".to_string(),
            image_url: format!("https://img.example/sim/{index}.png"),
            category: AssetCategory::ALL[index % AssetCategory::ALL.len()],
        },
        shares: ShareStructure {
            total_shares,
            price_per_share: TokenAmount::from_wei(price_cents as u128 * 10_000_000_000_000_000),
            min_purchase_amount: rng.gen_range(1..=5),
            max_purchase_amount,
            share_type: ShareType::Weighted,
        },
        requires_purchaser_kyc: rng.gen_bool(0.3),
    }
}

/// Every share is either still available or sitting in exactly one position.
async fn check_supply_invariant(ledger: &MemoryLedger) -> Result<()> {
    for asset in ledger.assets().await {
        if asset.available_shares > asset.total_shares {
            bail!(
                "asset {}: available {} exceeds total {}",
                asset.id,
                asset.available_shares,
                asset.total_shares
            );
        }
        let held = ledger.shares_outstanding(asset.id).await;
        if held + asset.available_shares != asset.total_shares {
            bail!(
                "asset {}: {} held + {} available != {} total",
                asset.id,
                held,
                asset.available_shares,
                asset.total_shares
            );
        }
    }
    Ok(())
}

async fn run_simulation(args: &Args) -> Result<SimReport> {
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let ledger = Arc::new(MemoryLedger::new());
    let store = Storage::in_memory()?;

    let mut asset_ids: Vec<AssetId> = Vec::with_capacity(args.assets);
    for i in 0..args.assets {
        asset_ids.push(ledger.list_asset(CREATOR, random_listing(&mut rng, i)).await?);
    }
    if asset_ids.is_empty() || args.buyers == 0 {
        bail!("simulation needs at least one asset and one buyer");
    }

    let mut markets = Vec::with_capacity(args.buyers);
    for i in 0..args.buyers {
        let address = wallet_address(i);
        ledger.fund(address, TokenAmount::from_tokens(args.simulation_money)).await?;
        if i % 2 == 0 {
            ledger.verify_kyc(address).await;
        }
        let session = Session::connect(ledger.as_ref(), address, NetworkConfig::builtin(Network::Opn), &store).await;
        markets.push(Marketplace::new(Arc::clone(&ledger), session));
    }

    let mut report = SimReport::default();
    for _ in 0..args.purchases {
        let market = &markets[rng.gen_range(0..markets.len())];
        let asset_id = asset_ids[rng.gen_range(0..asset_ids.len())];
        report.attempted += 1;

        let available = ledger.asset(asset_id).await?.available_shares;
        let amount = rng.gen_range(1..=(available / 4).max(1) + 5);

        match market.purchase(asset_id, amount).await {
            Ok(receipt) => {
                report.purchased += 1;
                report.shares_sold += receipt.quote.shares;
            }
            Err(ClientError::Trade(TradeError::TransactionFailed(failure))) => {
                debug!(kind = ?failure.kind, "ledger refused purchase: {}", failure.detail);
                report.ledger_failures += 1;
            }
            Err(ClientError::Trade(e)) => {
                debug!("purchase refused: {}", e);
                report.refused += 1;
            }
            Err(e) => return Err(e.into()),
        }

        if rng.gen_bool(0.1) {
            let to = wallet_address(rng.gen_range(0..args.buyers));
            let holding = ledger.share_balance(market.session().address(), asset_id).await?;
            if holding.unlocked() > 0 && market.transfer_shares(asset_id, to, 1).await.is_ok() {
                report.transfers += 1;
            }
        }

        check_supply_invariant(&ledger).await?;
    }

    report.sold_out_assets = ledger.assets().await.iter().filter(|a| a.is_sold_out()).count() as u64;
    Ok(report)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let start = Instant::now();
    let report = run_simulation(&args).await?;
    let elapsed = start.elapsed();

    println!("=== Atlas Marketplace Simulation ===");
    println!("Buyers: {}", args.buyers);
    println!("Assets listed: {}", args.assets);
    println!("Purchases attempted: {}", report.attempted);
    println!("Purchases settled: {}", report.purchased);
    println!("Refused before submission: {}", report.refused);
    println!("Refused by ledger: {}", report.ledger_failures);
    println!("Share transfers: {}", report.transfers);
    println!("Shares sold: {}", report.shares_sold);
    println!("Assets sold out: {}", report.sold_out_assets);
    println!("Elapsed: {:.2?}", elapsed);
    println!("Supply invariant held after every step");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_args(seed: u64) -> Args {
        Args {
            buyers: 8,
            assets: 3,
            purchases: 200,
            simulation_money: 5_000,
            seed: Some(seed),
            verbose: false,
        }
    }

    #[tokio::test]
    async fn simulation_keeps_supply_consistent() {
        let report = run_simulation(&small_args(7)).await.unwrap();
        assert_eq!(report.attempted, 200);
        assert_eq!(report.purchased + report.refused + report.ledger_failures, 200);
        assert!(report.purchased > 0);
        assert!(report.sold_out_assets <= 3);
    }

    #[tokio::test]
    async fn simulation_is_deterministic_for_a_seed() {
        let a = run_simulation(&small_args(42)).await.unwrap();
        let b = run_simulation(&small_args(42)).await.unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn wallet_addresses_are_distinct() {
        assert_ne!(wallet_address(0), wallet_address(1));
        assert_ne!(wallet_address(0), CREATOR);
    }
}
