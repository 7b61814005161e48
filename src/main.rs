//! riskband - risk-band scoring for crypto assets
//!
//! Maps prices to calibrated risk values, scores them against how long the
//! asset has historically spent in each risk band, and reads the market
//! phase from the asset's BTC-relative price.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use riskband::cli::commands;
use riskband::config::{Config, LoggingConfig};
use riskband::grid::RiskAxis;

/// Risk-band scoring for crypto assets
#[derive(Parser)]
#[command(name = "riskband")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "riskband.toml")]
    config: String,

    /// Reference data file (overrides data.reference_path)
    #[arg(short, long, env = "RISKBAND_DATA")]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a price into a risk value
    Risk {
        symbol: String,
        price: f64,

        /// Risk axis: fiat or btc
        #[arg(long, default_value = "fiat")]
        axis: RiskAxis,
    },

    /// Convert a risk value into a price
    Price {
        symbol: String,
        risk: f64,

        /// Risk axis: fiat or btc
        #[arg(long, default_value = "fiat")]
        axis: RiskAxis,
    },

    /// Score a fiat price (zone, coefficient, signal, target)
    Score { symbol: String, price: f64 },

    /// Full analysis: score, market phase, win rate and narrative
    Analyze {
        symbol: String,
        price: f64,
        /// Price of the asset denominated in BTC
        btc_price: f64,
    },

    /// Show the per-band ladder for an asset
    Bands {
        symbol: String,

        /// Risk axis: fiat or btc
        #[arg(long, default_value = "fiat")]
        axis: RiskAxis,
    },

    /// Rank assets by signal strength, given SYMBOL=PRICE quotes
    Rank {
        #[arg(required = true, value_name = "SYMBOL=PRICE")]
        quotes: Vec<String>,
    },

    /// Load and check the reference data
    Validate,

    /// Show current configuration
    Config,
}

fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            init_tracing(&LoggingConfig::default());
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    if let Some(data) = cli.data {
        config.data.reference_path = data;
    }

    init_tracing(&config.logging);
    debug!(config = %cli.config, data = %config.data.reference_path.display(), "Configuration loaded");

    if let Err(e) = run(cli.command, &config) {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Risk { symbol, price, axis } => commands::risk(config, &symbol, price, axis),
        Commands::Price { symbol, risk, axis } => commands::price(config, &symbol, risk, axis),
        Commands::Score { symbol, price } => commands::score(config, &symbol, price),
        Commands::Analyze {
            symbol,
            price,
            btc_price,
        } => commands::analyze(config, &symbol, price, btc_price),
        Commands::Bands { symbol, axis } => commands::bands(config, &symbol, axis),
        Commands::Rank { quotes } => commands::rank(config, &quotes),
        Commands::Validate => commands::validate(config),
        Commands::Config => commands::show_config(config),
    }
}

/// Logs go to stderr so JSON output on stdout stays parseable. RUST_LOG wins over the config level.
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("riskband=info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}
