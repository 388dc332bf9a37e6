use std::sync::Arc;

use clap::{Parser, Subcommand};

use harbinger_app::{decimal_from_f64, AppService};
use harbinger_core::ConfigLoader;
use harbinger_data::{series_csv, ArtifactCache, CsvFileSource, StooqClient};

#[derive(Parser)]
#[command(name = "harbinger")]
#[command(about = "Time-series forecasting and walk-forward backtesting", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config/Config.toml")]
    config: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch (or reuse cached) price history and print it as CSV
    History {
        /// Ticker symbol (e.g., "AAPL")
        symbol: String,
    },
    /// Train a forecasting model on the symbol's full history
    Train {
        /// Ticker symbol
        symbol: String,
    },
    /// Forecast forward from the stored model
    Predict {
        /// Ticker symbol
        symbol: String,
        /// Calendar days to forecast
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Run a walk-forward backtest over the symbol's history
    Backtest {
        /// Ticker symbol
        symbol: String,
        /// Local historical data CSV file, instead of the remote source
        #[arg(short, long)]
        data: Option<String>,
        /// Trailing observations per training window
        #[arg(long)]
        lookback: Option<usize>,
        /// Days ahead each trade is held
        #[arg(long)]
        horizon: Option<usize>,
        /// Starting portfolio value
        #[arg(long)]
        capital: Option<f64>,
        /// Emit the full report as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ConfigLoader::load_from(&cli.config)?;
    tracing::debug!(path = %cli.config, cache_dir = %config.cache.dir, "configuration loaded");

    let cache = Arc::new(ArtifactCache::new(config.cache.dir.clone())?);
    let source = StooqClient::new(&config.market_data)?;
    let service = AppService::new(source, cache.clone(), config.clone());

    match cli.command {
        Commands::History { symbol } => {
            let history = service.get_history(&symbol).await?;
            let csv = series_csv::encode(&history)?;
            print!("{}", String::from_utf8_lossy(&csv));
        }
        Commands::Train { symbol } => {
            service.train(&symbol).await?;
            println!("Model trained and stored for {}", symbol.to_uppercase());
        }
        Commands::Predict { symbol, days } => {
            let forecast = service.predict(&symbol, days).await?;
            println!("{:<12} {:>12} {:>12} {:>12}", "date", "estimate", "lower", "upper");
            for point in forecast {
                println!(
                    "{:<12} {:>12.2} {:>12.2} {:>12.2}",
                    point.date, point.point_estimate, point.lower_bound, point.upper_bound
                );
            }
        }
        Commands::Backtest {
            symbol,
            data,
            lookback,
            horizon,
            capital,
            json,
        } => {
            let defaults = &config.backtest;
            let lookback = lookback.unwrap_or(defaults.lookback);
            let horizon = horizon.unwrap_or(defaults.horizon);
            let capital = decimal_from_f64(capital.unwrap_or(defaults.initial_capital))?;

            let report = match data {
                Some(path) => {
                    // Zero data TTL so the local file wins over any cached
                    // remote artifact for the same symbol.
                    let mut offline_config = config.clone();
                    offline_config.cache.data_ttl_secs = 0;
                    let offline =
                        AppService::new(CsvFileSource::new(path), cache, offline_config);
                    offline.backtest(&symbol, lookback, horizon, capital).await?
                }
                None => service.backtest(&symbol, lookback, horizon, capital).await?,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                let m = &report.metrics;
                println!("Steps:            {}", report.records.len());
                println!("Total return:     {:>8.2}%", m.total_return * 100.0);
                println!("Benchmark return: {:>8.2}%", m.benchmark_return * 100.0);
                println!("Sharpe ratio:     {:>8.2}", m.sharpe_ratio);
                println!("Alpha:            {:>8.4}", m.alpha);
                println!("Max drawdown:     {:>8.2}%", m.max_drawdown * 100.0);
            }
        }
    }

    Ok(())
}
