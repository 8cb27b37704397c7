use async_trait::async_trait;
use crate::{AnalysisError, Bar, RawFundamentals};

/// Source of daily price bars and fundamental metrics for a ticker.
///
/// Implementations own transport concerns (timeouts, retries, rate limits).
/// Any failure must surface as [`AnalysisError::DataFetch`], never as an
/// empty result.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Trailing daily bars, oldest first.
    async fn price_history(&self, symbol: &str) -> Result<Vec<Bar>, AnalysisError>;

    /// Provider-keyed fundamentals bag (P/E, EPS, ROE among others).
    async fn fundamentals(&self, symbol: &str) -> Result<RawFundamentals, AnalysisError>;
}
