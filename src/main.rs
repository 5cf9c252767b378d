//! Kline feature ingestion
//!
//! Downloads monthly 1m kline archives, merges them, derives features and
//! writes a single Parquet file per run.
//!
//! # Usage
//! ```sh
//! cargo run -- --symbol BTCUSDT --year 2025 --months 1,2,3
//! ```
//!
//! # Environment Variables
//! - `DATA_ROOT` - Root of the `raw/` and `processed/` directories (default: data)
//! - `VERIFY_CHECKSUMS` - Verify archives against their `.CHECKSUM` files (default: false)
//! - `RUST_LOG` - Log filter (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use kline_features::application::pipeline::{IngestionPipeline, feature_file_name};
use kline_features::config::{DataKind, PipelineConfig};
use kline_features::infrastructure::binance::BinanceVisionFetcher;
use std::path::PathBuf;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Trading pair, for example BTCUSDT
    #[arg(long, default_value = "BTCUSDT")]
    symbol: String,

    /// Four-digit year of the archives
    #[arg(long, default_value_t = 2025)]
    year: i32,

    /// Comma-separated months, for example 1,2,3
    #[arg(long, value_delimiter = ',', default_value = "1,2,3")]
    months: Vec<u32>,

    /// Replace archives that were already downloaded
    #[arg(long)]
    overwrite: bool,

    /// TOML config file. Environment variables are used when absent.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output Parquet file. Defaults to the processed data directory.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => PipelineConfig::from_toml_file(path)?,
        None => PipelineConfig::from_env()?,
    };
    info!(
        "Configuration loaded: root={:?}, floor_year={}",
        config.layout.root, config.floor_year
    );

    let raw_dir = config.layout.ensure_dir(DataKind::Raw)?;
    let fetcher = BinanceVisionFetcher::new(&config.fetch, raw_dir).overwrite(args.overwrite);
    let archives = fetcher
        .fetch_months(&args.symbol, args.year, &args.months)
        .await;

    if archives.is_empty() {
        warn!("No archives downloaded. Check symbol/year/month availability.");
        return Ok(());
    }

    let pipeline = IngestionPipeline::new(config)?;
    let output = match args.output {
        Some(path) => path,
        None => pipeline.output_path(&feature_file_name(&args.symbol, args.year, &args.months)?)?,
    };

    // The core is synchronous; keep it off the async workers
    let summary = tokio::task::spawn_blocking(move || pipeline.run(archives.as_slice(), &output))
        .await
        .context("Ingestion task panicked")??;

    info!("Download and feature generation complete.");
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary);
    }
    Ok(())
}
