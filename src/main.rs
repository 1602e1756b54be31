use anyhow::Context;
use clap::{Parser, Subcommand};
use marketlens::application::engine::MarketStructureEngine;
use marketlens::config::Config;
use marketlens::domain::context::AnalysisRequest;
use marketlens::infrastructure::{BinanceMarketDataService, KlineCache};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Market-structure analysis for spot symbols", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Symbol to analyze
    #[arg(short, long, global = true, default_value = "BTCUSDT")]
    symbol: String,

    /// Pretty-print the JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Latest Bollinger bands for every configured timeframe
    Bands,
    /// Clustered support/resistance levels and a risk/reward suggestion
    Levels,
    /// Order-book and trade-flow levels with a recommendation
    OrderFlow,
    /// Swing cycles and Fibonacci projections
    Cycles {
        /// Reference price for the cycle context (defaults to the last close)
        #[arg(long)]
        price: Option<f64>,
    },
    /// All of the above in one report
    Report {
        #[arg(long)]
        price: Option<f64>,
    },
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    info!(
        "Starting marketlens against {} (base {}, {} band timeframes)",
        config.exchange.base_url,
        config.analysis.base_timeframe,
        config.analysis.band_timeframes.len()
    );

    let service = Arc::new(BinanceMarketDataService::from_config(&config.exchange));
    let candles = Arc::new(KlineCache::new(
        service.clone(),
        config.exchange.kline_cache_ttl,
    ));
    let engine = MarketStructureEngine::new(candles, service.clone(), service, &config);

    let request = AnalysisRequest::new(&cli.symbol);
    match cli.command {
        Commands::Bands => print_json(&engine.bands(&request).await?, cli.pretty),
        Commands::Levels => print_json(&engine.level_clusters(&request).await?, cli.pretty),
        Commands::OrderFlow => print_json(&engine.order_flow(&request).await?, cli.pretty),
        Commands::Cycles { price } => {
            let request = match price {
                Some(p) => request.with_reference_price(p),
                None => request,
            };
            print_json(&engine.cycles(&request).await?, cli.pretty)
        }
        Commands::Report { price } => {
            let request = match price {
                Some(p) => request.with_reference_price(p),
                None => request,
            };
            print_json(&engine.report(&request).await, cli.pretty)
        }
    }
}
