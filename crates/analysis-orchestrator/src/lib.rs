use analysis_core::{
    Analysis, AnalysisError, FundamentalMetrics, MarketDataProvider, PriceSeries,
};
use fundamental_analysis::{normalize, FundamentalKeys};
use scoring_engine::{ScoringContext, ScoringEngine};
use serde::{Deserialize, Serialize};
use technical_analysis::{compute_indicators, pivot_levels, ten_day_change};

pub mod report;
pub use report::{format_report, DISCLAIMER};

/// Pure analysis of one ticker's data: indicators, pivot levels and score.
///
/// Holds no state, so it is safe to call concurrently for different tickers.
pub fn analyze(
    series: &PriceSeries,
    fundamentals: &FundamentalMetrics,
) -> Result<Analysis, AnalysisError> {
    let bars = series.bars();
    let indicators = compute_indicators(bars)?.latest();
    let levels = pivot_levels(bars)?;
    let current_price = series.last_close();

    let ctx = ScoringContext {
        current_price,
        indicators,
        levels,
        fundamentals: *fundamentals,
        ten_day_change: ten_day_change(bars),
    };
    let result = ScoringEngine::new().score(&ctx)?;

    Ok(Analysis {
        current_price,
        levels,
        indicators,
        fundamentals: *fundamentals,
        result,
    })
}

/// Trims and upper-cases a user-supplied ticker. Blank input is rejected.
pub fn normalize_ticker(raw: &str) -> Result<String, AnalysisError> {
    let ticker = raw.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Please enter a stock ticker".to_string(),
        ));
    }
    Ok(ticker)
}

/// A finished analysis together with its rendered text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockReport {
    pub ticker: String,
    pub analysis: Analysis,
    pub text: String,
}

/// Fetches data for a ticker and runs the pure analysis on it.
pub struct AnalysisOrchestrator<P: MarketDataProvider> {
    provider: P,
    fundamental_keys: FundamentalKeys,
}

impl<P: MarketDataProvider> AnalysisOrchestrator<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            fundamental_keys: FundamentalKeys::default(),
        }
    }

    /// Override the provider field names used for P/E, EPS and ROE
    pub fn with_fundamental_keys(mut self, keys: FundamentalKeys) -> Self {
        self.fundamental_keys = keys;
        self
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Full pipeline for one ticker. Nothing is fetched for blank input, and
    /// any failure aborts the whole analysis.
    pub async fn analyze_ticker(&self, raw_ticker: &str) -> Result<StockReport, AnalysisError> {
        let ticker = normalize_ticker(raw_ticker)?;
        tracing::info!("Starting analysis for {}", ticker);

        let (bars, raw_fundamentals) = tokio::try_join!(
            self.provider.price_history(&ticker),
            self.provider.fundamentals(&ticker),
        )?;

        if bars.is_empty() {
            return Err(AnalysisError::DataFetch(format!(
                "No price data returned for {}",
                ticker
            )));
        }
        let fetched = bars.len();
        let series = PriceSeries::new(bars).map_err(|_| {
            AnalysisError::DataFetch(format!("No complete price bars returned for {}", ticker))
        })?;
        tracing::info!(
            "Bars for {}: {} fetched, {} after cleaning",
            ticker,
            fetched,
            series.len()
        );

        let fundamentals = normalize(&raw_fundamentals, &self.fundamental_keys);
        tracing::debug!("Fundamentals for {}: {:?}", ticker, fundamentals);

        let analysis = analyze(&series, &fundamentals)?;
        tracing::info!(
            "Analysis for {} complete: {} (score {})",
            ticker,
            analysis.result.recommendation.to_label(),
            analysis.result.score
        );

        let text = format_report(&ticker, &analysis);
        Ok(StockReport {
            ticker,
            analysis,
            text,
        })
    }
}
