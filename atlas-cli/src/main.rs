use anyhow::{anyhow, bail, Context, Result};
use atlas_client::NetworkConfig;
use atlas_execution::{
    estimate_creation, quote_purchase, to_percentage, to_shares, validate_purchase, with_gas_buffer, AssetRequestForm,
    FeeSchedule, FormStep, PurchaseContext, PLATFORM_FEE_BPS,
};
use atlas_storage::Storage;
use atlas_types::{
    Address, AssetId, AssetMetadata, AssetStatus, FractionalizedAsset, Percentage, RequestId, ShareType, TokenAmount,
};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Atlas CLI: share math, fee quotes and request checks for the fractional marketplace"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Local flag store
    #[arg(short, long, default_value = "atlas-flags", global = true)]
    store_path: PathBuf,
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert between ownership percentage and share count
    Convert {
        #[arg(long)]
        total_shares: u64,
        #[arg(long, conflicts_with = "shares", required_unless_present = "shares")]
        percent: Option<Percentage>,
        #[arg(long)]
        shares: Option<u64>,
    },
    /// Quote what a buyer pays, platform fee included
    Quote {
        #[arg(long)]
        shares: u64,
        #[arg(long)]
        price: TokenAmount,
        #[arg(long, default_value_t = PLATFORM_FEE_BPS)]
        fee_bps: u16,
    },
    /// Estimate a creator's net proceeds for a full sell-out
    Estimate {
        #[arg(long)]
        total_shares: u64,
        #[arg(long)]
        price: TokenAmount,
        #[arg(long, default_value_t = PLATFORM_FEE_BPS)]
        fee_bps: u16,
    },
    /// Run the purchase checks against a described listing
    CheckPurchase {
        #[arg(long)]
        shares: u64,
        #[arg(long)]
        total_shares: u64,
        #[arg(long)]
        available: u64,
        #[arg(long, default_value_t = 1)]
        min: u64,
        /// 0 means unlimited
        #[arg(long, default_value_t = 0)]
        max: u64,
        #[arg(long, default_value_t = 0)]
        held: u64,
        #[arg(long)]
        kyc_required: bool,
        #[arg(long)]
        kyc_verified: bool,
    },
    /// Validate an asset creation request stored as JSON
    ValidateRequest { path: PathBuf },
    /// Buffer a gas estimate before submission
    Gas { estimate: u64 },
    /// Show contract addresses for a chain
    Network {
        #[arg(long, default_value_t = 984)]
        chain_id: u64,
        /// JSON file replacing the built-in table
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Local KYC submission flag
    Kyc {
        #[command(subcommand)]
        action: KycAction,
    },
}

#[derive(Subcommand)]
enum KycAction {
    /// Record that documents were handed to the KYC provider
    MarkSubmitted { address: Address },
    Status { address: Address },
}

fn convert(total_shares: u64, percent: Option<Percentage>, shares: Option<u64>) -> Result<String> {
    match (percent, shares) {
        (Some(p), _) => {
            let shares = to_shares(p, total_shares)?;
            Ok(format!("{p}% of {total_shares} = {shares} shares"))
        }
        (None, Some(shares)) => {
            let p = to_percentage(shares, total_shares)?;
            Ok(format!("{shares} of {total_shares} shares = {p}%"))
        }
        (None, None) => bail!("pass either --percent or --shares"),
    }
}

fn quote(shares: u64, price: TokenAmount, fee_bps: u16) -> Result<String> {
    let fees = FeeSchedule::new(fee_bps)?;
    let q = quote_purchase(shares, price, &fees)?;
    Ok(format!(
        "Shares:      {}\nPrice/share: {}\nBase cost:   {}\nPlatform fee ({} bps): {}\nTotal:       {}",
        q.shares, q.price_per_share, q.base_cost, fee_bps, q.fee, q.total_cost
    ))
}

fn estimate(total_shares: u64, price: TokenAmount, fee_bps: u16) -> Result<String> {
    let fees = FeeSchedule::new(fee_bps)?;
    let e = estimate_creation(total_shares, price, &fees)?;
    Ok(format!(
        "Total value:  {}\nPlatform fee: {}\nNet proceeds: {}",
        e.total_value, e.platform_fee, e.net_proceeds
    ))
}

#[allow(clippy::too_many_arguments)]
fn check_purchase(
    shares: u64,
    total_shares: u64,
    available: u64,
    min: u64,
    max: u64,
    held: u64,
    kyc_required: bool,
    kyc_verified: bool,
) -> Result<String> {
    if available > total_shares {
        bail!("available shares ({available}) cannot exceed total shares ({total_shares})");
    }
    let asset = FractionalizedAsset {
        id: AssetId(0),
        request_id: RequestId(0),
        creator: Address::ZERO,
        metadata: AssetMetadata::default(),
        total_shares,
        available_shares: available,
        price_per_share: TokenAmount::ZERO,
        min_purchase_amount: min,
        max_purchase_amount: max,
        requires_purchaser_kyc: kyc_required,
        share_type: ShareType::Weighted,
        status: AssetStatus::Active,
        total_revenue: TokenAmount::ZERO,
        created_at: 0,
    };
    let ctx = PurchaseContext {
        asset: &asset,
        current_user_shares: held,
        kyc_verified,
    };
    validate_purchase(shares, &ctx)?;
    Ok(format!("OK: {shares} shares can be purchased"))
}

fn validate_request(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let form: AssetRequestForm = serde_json::from_str(&raw).context("parsing request JSON")?;

    let errors = form.validate_all();
    if !errors.is_empty() {
        let mut report = String::new();
        for step in FormStep::ALL {
            let step_errors = atlas_execution::validate_step(&form, step);
            for (field, message) in step_errors.iter() {
                report.push_str(&format!("\n  step {} ({}): {}: {}", step.number(), step.title(), field, message));
            }
        }
        bail!("request is invalid:{report}");
    }

    let request = form.to_request()?;
    let estimate = form.estimate(&FeeSchedule::default())?;
    Ok(format!(
        "{}\nTotal value: {}  Net proceeds: {}",
        serde_json::to_string_pretty(&request)?,
        estimate.total_value,
        estimate.net_proceeds
    ))
}

fn network(chain_id: u64, config: Option<&Path>) -> Result<NetworkConfig> {
    let resolved = match config {
        Some(path) => NetworkConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => NetworkConfig::resolve(chain_id)?,
    };
    if resolved.chain_id != chain_id {
        debug!(chain_id, resolved = resolved.chain_id, network = %resolved.network, "using a different chain");
    }
    Ok(resolved)
}

fn gas(estimate: u64) -> String {
    format!("Gas limit: {} (estimate {} + 10%)", with_gas_buffer(estimate), estimate)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!("failed to install logger: {e}"))?;

    match cli.command {
        Commands::Convert {
            total_shares,
            percent,
            shares,
        } => println!("{}", convert(total_shares, percent, shares)?),
        Commands::Quote { shares, price, fee_bps } => println!("{}", quote(shares, price, fee_bps)?),
        Commands::Estimate {
            total_shares,
            price,
            fee_bps,
        } => println!("{}", estimate(total_shares, price, fee_bps)?),
        Commands::CheckPurchase {
            shares,
            total_shares,
            available,
            min,
            max,
            held,
            kyc_required,
            kyc_verified,
        } => println!(
            "{}",
            check_purchase(shares, total_shares, available, min, max, held, kyc_required, kyc_verified)?
        ),
        Commands::Gas { estimate } => println!("{}", gas(estimate)),
        Commands::ValidateRequest { path } => println!("{}", validate_request(&path)?),
        Commands::Network { chain_id, config } => {
            let config = network(chain_id, config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            if !config.is_deployed() {
                println!("Contracts are not deployed on {}", config.network);
            }
        }
        Commands::Kyc { action } => {
            let store = Storage::open(&cli.store_path)?;
            match action {
                KycAction::MarkSubmitted { address } => {
                    store.mark_kyc_submitted(address)?;
                    println!("KYC submission recorded for {address}");
                }
                KycAction::Status { address } => {
                    let submitted = store.kyc_submitted(&address)?;
                    println!(
                        "{}: {}",
                        address,
                        if submitted { "submitted, awaiting verification" } else { "not submitted" }
                    );
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_client::Network;

    #[test]
    fn test_cli_parses_decimal_arguments() {
        let cli = Cli::try_parse_from(["atlas", "quote", "--shares", "100", "--price", "2.0"]).unwrap();
        match cli.command {
            Commands::Quote { shares, price, fee_bps } => {
                assert_eq!(shares, 100);
                assert_eq!(price, TokenAmount::from_tokens(2));
                assert_eq!(fee_bps, PLATFORM_FEE_BPS);
            }
            _ => panic!("expected quote"),
        }

        assert!(Cli::try_parse_from(["atlas", "convert", "--total-shares", "10"]).is_err());
        assert!(Cli::try_parse_from(["atlas", "quote", "--shares", "1", "--price", "-1"]).is_err());
    }

    #[test]
    fn test_convert_and_quote_output() {
        assert_eq!(
            convert(1_000, Some("12.345".parse().unwrap()), None).unwrap(),
            "12.345% of 1000 = 123 shares"
        );
        assert_eq!(convert(1_000, None, Some(123)).unwrap(), "123 of 1000 shares = 12.3%");
        assert!(convert(0, None, Some(1)).is_err());

        let out = quote(100, TokenAmount::from_tokens(2), PLATFORM_FEE_BPS).unwrap();
        assert!(out.ends_with("Total:       205.0"));
        assert!(estimate(1_000, "0.1".parse().unwrap(), PLATFORM_FEE_BPS)
            .unwrap()
            .contains("Net proceeds: 97.5"));
    }

    #[test]
    fn test_check_purchase_reports_refusal() {
        assert!(check_purchase(10, 1_000, 1_000, 1, 0, 0, false, false).is_ok());
        let err = check_purchase(10, 1_000, 1_000, 1, 100, 95, false, false).unwrap_err();
        assert!(err.to_string().contains("you can buy 5 more"));
        assert!(check_purchase(1, 10, 20, 1, 0, 0, false, false).is_err());
    }

    #[test]
    fn test_validate_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.json");
        fs::write(
            &good,
            r#"{
                "category": "Vehicles",
                "name": "1967 Fastback",
                "description": "Restored, matching numbers",
                "image_url": "https://img.example/fastback.png",
                "total_shares": 1000,
                "price_per_share": "0.1",
                "ownership_confirmed": true,
                "terms_accepted": true
            }"#,
        )
        .unwrap();
        let out = validate_request(&good).unwrap();
        assert!(out.contains("\"name\": \"1967 Fastback\""));
        assert!(out.contains("Total value: 100.0"));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, format!(r#"{{"name": "{}", "price_per_share": "0"}}"#, "x".repeat(129))).unwrap();
        let err = validate_request(&bad).unwrap_err().to_string();
        assert!(err.contains("asset_name"));
        assert!(err.contains("Price must be greater than 0"));
        assert!(err.contains("You must accept the terms"));
    }

    #[test]
    fn test_network_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("net.json");
        let config = NetworkConfig::builtin(Network::Polygon);
        fs::write(&path, serde_json::to_string(&config).unwrap()).unwrap();
        assert_eq!(network(1, Some(path.as_path())).unwrap(), config);
    }

    #[test]
    fn test_unknown_chain_falls_back_to_opn() {
        let config = network(5, None).unwrap();
        assert_eq!(config.network, Network::Opn);
        assert_eq!(config.chain_id, 984);
    }

    #[test]
    fn test_gas_buffer_output() {
        assert_eq!(gas(21_001), "Gas limit: 23101 (estimate 21001 + 10%)");
        let cli = Cli::try_parse_from(["atlas", "gas", "50000"]).unwrap();
        assert!(matches!(cli.command, Commands::Gas { estimate: 50_000 }));
    }
}
