//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// Re-export engine config
pub use crate::engine::EngineConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Where reference data comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// JSON file with grids and band tables
    #[serde(default = "default_reference_path")]
    pub reference_path: PathBuf,
    /// Symbols that must be present in the reference data (checked by `validate`)
    #[serde(default)]
    pub watchlist: Vec<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            reference_path: default_reference_path(),
            watchlist: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Text,
    Json,
}

/// Presentation settings. Rounding happens here only, never inside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_format")]
    pub format: OutputFormat,
    /// Decimal places for prices
    #[serde(default = "default_price_precision")]
    pub price_precision: usize,
    /// Decimal places for risk values
    #[serde(default = "default_risk_precision")]
    pub risk_precision: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_output_format(),
            price_precision: default_price_precision(),
            risk_precision: default_risk_precision(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level directive for this crate (overridden by RUST_LOG)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit logs as JSON lines
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default(
                "data.reference_path",
                default_reference_path().to_string_lossy().to_string(),
            )?
            .set_default("output.format", "text")?
            .set_default("logging.level", default_log_level())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (e.g. RISKBAND__OUTPUT__FORMAT=json)
            .add_source(environment())
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.data.reference_path.as_os_str().is_empty() {
            anyhow::bail!("data.reference_path must not be empty");
        }

        if self.output.price_precision > MAX_PRECISION {
            anyhow::bail!(
                "output.price_precision cannot exceed {}, got {}",
                MAX_PRECISION,
                self.output.price_precision
            );
        }

        if self.output.risk_precision > MAX_PRECISION {
            anyhow::bail!(
                "output.risk_precision cannot exceed {}, got {}",
                MAX_PRECISION,
                self.output.risk_precision
            );
        }

        let symbol_pattern = regex::Regex::new(SYMBOL_PATTERN)
            .context("Invalid built-in symbol pattern")?;
        for symbol in &self.data.watchlist {
            if !symbol_pattern.is_match(&symbol.to_ascii_uppercase()) {
                anyhow::bail!("Invalid symbol in data.watchlist: {}", symbol);
            }
        }

        tracing_subscriber::EnvFilter::try_new(&self.logging.level)
            .with_context(|| format!("Invalid logging.level: {}", self.logging.level))?;

        Ok(())
    }

    /// Human-readable view of the effective configuration
    pub fn display(&self) -> String {
        format!(
            r#"Configuration:
  Data:
    reference_path: {}
    watchlist: {:?}
  Output:
    format: {:?}
    price_precision: {}
    risk_precision: {}
  Logging:
    level: {}
    json: {}
  Engine:
    suggest_targets: {}
"#,
            self.data.reference_path.display(),
            self.data.watchlist,
            self.output.format,
            self.output.price_precision,
            self.output.risk_precision,
            self.logging.level,
            self.logging.json,
            self.engine.suggest_targets,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            output: OutputConfig::default(),
            logging: LoggingConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// Environment source. `RISKBAND__DATA__WATCHLIST=ETH,SOL` parses as a list.
fn environment() -> config::Environment {
    config::Environment::with_prefix("RISKBAND")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("data.watchlist")
}

const MAX_PRECISION: usize = 12;

const SYMBOL_PATTERN: &str = r"^[A-Z0-9]{1,15}$";

// Default value functions
fn default_reference_path() -> PathBuf {
    PathBuf::from("data/reference.json")
}

fn default_output_format() -> OutputFormat {
    OutputFormat::Text
}

fn default_price_precision() -> usize {
    4
}

fn default_risk_precision() -> usize {
    3
}

fn default_log_level() -> String {
    "riskband=info".to_string()
}
