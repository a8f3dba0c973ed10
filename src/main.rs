//! # Calculate spreads for every commodity with data on disk
//! futures-spreads calc --data raw_data --out processed_data
//!
//! # Calculate a subset with a shorter horizon
//! futures-spreads calc --commodities CL,NG --max-months 6
//!
//! # Run integrity checks without calculating
//! futures-spreads validate --data raw_data

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::error;

use futures_spreads::data::{DataLoader, SpreadStore};
use futures_spreads::term::{build_term_structure, materialize};
use futures_spreads::validation::validate_commodity;
use futures_spreads::SpreadConfig;

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "futures-spreads")]
#[command(about = "Commodity futures term-structure and spread calculator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Raw data directory (one subdirectory per commodity)
    #[arg(long, default_value = "raw_data")]
    data: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate term structure and spread tables
    Calc {
        /// Output directory for processed tables
        #[arg(long, default_value = "processed_data")]
        out: PathBuf,

        /// Comma-separated commodity list (default: all with data)
        #[arg(long)]
        commodities: Option<String>,

        /// Maximum contract months to rank per day
        #[arg(long, default_value_t = 13)]
        max_months: usize,

        /// Trading days per year used for annualization
        #[arg(long, default_value_t = 251.0)]
        trading_days: f64,

        /// Minimum days to expiry for a contract to be ranked
        #[arg(long, default_value_t = 0)]
        min_days: i64,

        /// Minimum daily volume for a contract to be ranked
        #[arg(long, default_value_t = 0.0)]
        min_volume: f64,

        /// Skip dollar spreads
        #[arg(long)]
        no_dollar: bool,

        /// Skip percentage spreads
        #[arg(long)]
        no_percent: bool,

        /// Skip annualized spreads
        #[arg(long)]
        no_annual: bool,
    },

    /// Run integrity checks on raw data
    Validate {
        /// Comma-separated commodity list (default: all with data)
        #[arg(long)]
        commodities: Option<String>,
    },
}

/// Per-commodity outcome for the final summary.
struct CalcOutcome {
    commodity: String,
    result: Result<CalcSummary>,
}

struct CalcSummary {
    last_date: String,
    dollar: usize,
    percent: usize,
    annual: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("futures_spreads=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let loader = DataLoader::new(&cli.data);

    match cli.command {
        Commands::Calc {
            out,
            commodities,
            max_months,
            trading_days,
            min_days,
            min_volume,
            no_dollar,
            no_percent,
            no_annual,
        } => {
            let config = SpreadConfig {
                trading_days_per_year: trading_days,
                max_months_forward: max_months,
                min_days_to_expiry: min_days,
                min_volume,
                calculate_dollar_spreads: !no_dollar,
                calculate_percent_spreads: !no_percent,
                calculate_annual_spreads: !no_annual,
            };
            config.validate()?;
            let commodities = resolve_commodities(&loader, commodities)?;
            cmd_calc(&loader, &SpreadStore::new(out), &commodities, &config)
        }
        Commands::Validate { commodities } => {
            let commodities = resolve_commodities(&loader, commodities)?;
            cmd_validate(&loader, &commodities)
        }
    }
}

fn resolve_commodities(
    loader: &DataLoader,
    requested: Option<String>,
) -> Result<Vec<String>> {
    let commodities = match requested {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => loader
            .available_commodities()
            .context("listing raw data directory")?,
    };
    if commodities.is_empty() {
        anyhow::bail!("no commodities with price data found");
    }
    Ok(commodities)
}

fn cmd_calc(
    loader: &DataLoader,
    store: &SpreadStore,
    commodities: &[String],
    config: &SpreadConfig,
) -> Result<()> {
    println!(
        "Processing spreads for {} commodities...",
        commodities.len()
    );

    let pb = ProgressBar::new(commodities.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")?
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(commodities.len());
    for commodity in commodities {
        pb.set_message(commodity.clone());
        let result = calc_one(loader, store, commodity, config);
        if let Err(err) = &result {
            error!(commodity = %commodity, %err, "spread calculation failed");
        }
        outcomes.push(CalcOutcome {
            commodity: commodity.clone(),
            result,
        });
        pb.inc(1);
    }
    pb.finish_and_clear();

    print_summary(&outcomes);
    Ok(())
}

fn calc_one(
    loader: &DataLoader,
    store: &SpreadStore,
    commodity: &str,
    config: &SpreadConfig,
) -> Result<CalcSummary> {
    let prices = loader
        .load_prices(commodity)
        .with_context(|| format!("loading prices for {commodity}"))?;
    let metadata = loader
        .load_metadata(commodity)
        .with_context(|| format!("loading metadata for {commodity}"))?;

    // Volumes only matter when a floor is set.
    let volumes = if config.min_volume > 0.0 {
        loader
            .load_volumes(commodity)
            .with_context(|| format!("loading volumes for {commodity}"))?
    } else {
        None
    };

    let ts = build_term_structure(&prices, volumes.as_ref(), &metadata, config)?;
    let tables = materialize(&ts)?;
    store.save(commodity, &tables, config)?;

    let (_, last_date) = tables.date_range().unwrap_or_default();
    Ok(CalcSummary {
        last_date,
        dollar: tables.spreads_dollar.width().saturating_sub(1),
        percent: tables.spreads_percent.width().saturating_sub(1),
        annual: tables.spreads_annual.width().saturating_sub(1),
    })
}

fn print_summary(outcomes: &[CalcOutcome]) {
    println!("\nFinal Processing Summary");
    println!("{SEPARATOR}");
    println!(
        "{:<10} {:<8} {:<12} {:<20}",
        "Commodity", "Status", "Last Date", "Spreads Calculated"
    );
    println!("{}", "-".repeat(SEPARATOR.len()));

    let mut successful = 0;
    for outcome in outcomes {
        match &outcome.result {
            Ok(summary) => {
                successful += 1;
                let total = summary.dollar + summary.percent + summary.annual;
                println!(
                    "{:<10} {:<8} {:<12} {:<20}",
                    outcome.commodity, "ok", summary.last_date, total
                );
            }
            Err(err) => {
                println!("{:<10} {:<8} {}", outcome.commodity, "failed", err);
            }
        }
    }

    println!(
        "\nSuccessfully processed: {}/{} commodities",
        successful,
        outcomes.len()
    );
}

fn cmd_validate(loader: &DataLoader, commodities: &[String]) -> Result<()> {
    for commodity in commodities {
        println!("{SEPARATOR}");
        let prices = match loader.load_prices(commodity) {
            Ok(prices) => prices,
            Err(err) => {
                println!("{commodity}: failed to load prices: {err}");
                continue;
            }
        };
        let volumes = loader.load_volumes(commodity)?;
        let metadata = loader.load_metadata(commodity).unwrap_or_default();

        let report = validate_commodity(commodity, &prices, volumes.as_ref(), &metadata);
        println!("{}", report.summary());
        for check in report.failed_checks() {
            match &check.details {
                Some(details) => println!("  FAIL {}: {} ({})", check.name, check.message, details),
                None => println!("  FAIL {}: {}", check.name, check.message),
            }
        }
    }
    Ok(())
}
