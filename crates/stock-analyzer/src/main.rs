//! stock-analyzer: score one ticker at a time as a buy/sell/hold candidate.
//!
//! Usage:
//!   stock-analyzer AAPL
//!   stock-analyzer AAPL --format json
//!   stock-analyzer                 # interactive prompt

mod cli;

use analysis_orchestrator::{AnalysisOrchestrator, StockReport};
use anyhow::Context;
use clap::Parser;
use std::io::Write;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use yahoo_client::{YahooConfig, YahooFinanceClient};

use crate::cli::{Cli, OutputFormat};

const PROMPT: &str = "Enter Stock Ticker: ";

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match run(cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {:#}", error);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "stock_analyzer=info,analysis_orchestrator=info,yahoo_client=warn".into()
    });
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config: YahooConfig = cli.yahoo_config();
    tracing::debug!("Yahoo config: {:?}", config);
    let client = YahooFinanceClient::new(config).context("Failed to create Yahoo Finance client")?;
    let orchestrator = AnalysisOrchestrator::new(client);

    match cli.ticker.as_deref() {
        Some(ticker) => {
            let report = orchestrator.analyze_ticker(ticker).await?;
            print_report(&report, cli.format)?;
        }
        None => interactive(&orchestrator, cli.format).await?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Prompt for tickers until `quit`, `exit` or end of input. Failures are
/// reported and the prompt continues.
async fn interactive(
    orchestrator: &AnalysisOrchestrator<YahooFinanceClient>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", PROMPT);
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.eq_ignore_ascii_case("quit") || input.eq_ignore_ascii_case("exit") {
            break;
        }

        match orchestrator.analyze_ticker(input).await {
            Ok(report) => print_report(&report, format)?,
            Err(error) => eprintln!("error: {}", error),
        }
    }

    Ok(())
}

fn print_report(report: &StockReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => println!("{}\n", report.text),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report).context("Failed to encode report")?;
            println!("{}", json);
        }
    }
    Ok(())
}
