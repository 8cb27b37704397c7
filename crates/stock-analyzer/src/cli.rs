//! Command-line arguments for the stock analyzer.
//!
//! Connection settings come from the environment (optionally via `.env`)
//! and can be overridden per run with flags.
//!
//! ```bash
//! # One-shot text report
//! stock-analyzer AAPL
//!
//! # Full analysis as JSON
//! stock-analyzer msft --format json
//!
//! # Interactive prompt, re-analyzes on each entered ticker
//! stock-analyzer
//! ```

use std::time::Duration;

use clap::{Parser, ValueEnum};
use yahoo_client::YahooConfig;

#[derive(Debug, Parser)]
#[command(
    name = "stock-analyzer",
    version,
    about = "Score a stock as a buy/sell/hold candidate from technicals and fundamentals"
)]
pub struct Cli {
    /// Ticker to analyze. Omit to start an interactive prompt.
    pub ticker: Option<String>,

    /// Output format for reports
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Price history range requested from Yahoo (overrides YAHOO_HISTORY_RANGE)
    #[arg(long)]
    pub range: Option<String>,

    /// Bar interval requested from Yahoo (overrides YAHOO_HISTORY_INTERVAL)
    #[arg(long)]
    pub interval: Option<String>,

    /// HTTP timeout in seconds (overrides YAHOO_TIMEOUT_SECS)
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Emit logs as JSON lines on stderr
    #[arg(long)]
    pub json_logs: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Fixed-layout text report
    Text,
    /// Pretty-printed JSON with the full analysis
    Json,
}

impl Cli {
    /// Environment configuration with command-line overrides applied
    pub fn yahoo_config(&self) -> YahooConfig {
        self.apply_overrides(YahooConfig::from_env())
    }

    fn apply_overrides(&self, mut config: YahooConfig) -> YahooConfig {
        if let Some(range) = &self.range {
            config.range = range.clone();
        }
        if let Some(interval) = &self.interval {
            config.interval = interval.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config
    }
}
