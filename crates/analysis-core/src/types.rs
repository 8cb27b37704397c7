use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::AnalysisError;

/// OHLCV bar data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    fn is_complete(&self) -> bool {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Cleaned daily price history for a single analysis.
///
/// Bars are chronological ascending, one per timestamp, and every OHLCV value
/// is finite. A series always holds at least one bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Bar>", into = "Vec<Bar>")]
pub struct PriceSeries {
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Drops incomplete bars, sorts by timestamp and keeps the last bar seen
    /// for any repeated timestamp.
    pub fn new(bars: Vec<Bar>) -> Result<Self, AnalysisError> {
        let mut bars: Vec<Bar> = bars.into_iter().filter(Bar::is_complete).collect();
        // Stable sort keeps provider order among equal timestamps.
        bars.sort_by_key(|b| b.timestamp);

        let mut cleaned: Vec<Bar> = Vec::with_capacity(bars.len());
        for bar in bars {
            match cleaned.last_mut() {
                Some(prev) if prev.timestamp == bar.timestamp => *prev = bar,
                _ => cleaned.push(bar),
            }
        }

        if cleaned.is_empty() {
            return Err(AnalysisError::InsufficientData(
                "Price series has no complete bars".to_string(),
            ));
        }

        Ok(Self { bars: cleaned })
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    /// Close of the most recent bar.
    pub fn last_close(&self) -> f64 {
        self.bars.last().map(|b| b.close).unwrap_or(f64::NAN)
    }
}

impl TryFrom<Vec<Bar>> for PriceSeries {
    type Error = AnalysisError;

    fn try_from(bars: Vec<Bar>) -> Result<Self, Self::Error> {
        Self::new(bars)
    }
}

impl From<PriceSeries> for Vec<Bar> {
    fn from(series: PriceSeries) -> Self {
        series.bars
    }
}

/// Indicator values aligned bar-for-bar with the series they came from.
/// `None` marks positions where the indicator window is not yet full.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    pub rsi: Vec<Option<f64>>,
    pub sma_50: Vec<Option<f64>>,
    pub sma_200: Vec<Option<f64>>,
}

impl IndicatorSeries {
    pub fn latest(&self) -> IndicatorSet {
        IndicatorSet {
            rsi: self.rsi.last().copied().flatten(),
            sma_50: self.sma_50.last().copied().flatten(),
            sma_200: self.sma_200.last().copied().flatten(),
        }
    }
}

/// Latest indicator readings consumed by the scoring engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rsi: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
}

/// Pivot-derived levels, rounded to cents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub support: f64,
    pub resistance: f64,
}

/// Provider-keyed fundamentals exactly as fetched
pub type RawFundamentals = serde_json::Map<String, serde_json::Value>;

/// Fundamental ratios used for scoring. `None` means the provider did not
/// report a numeric value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalMetrics {
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    /// Fraction, e.g. 0.25 for 25%
    pub roe: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
}

impl Recommendation {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 4 => Recommendation::StrongBuy,
            s if s >= 2 => Recommendation::Buy,
            s if s >= 0 => Recommendation::Hold,
            _ => Recommendation::Sell,
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            Recommendation::StrongBuy => "STRONG BUY",
            Recommendation::Buy => "BUY",
            Recommendation::Hold => "HOLD",
            Recommendation::Sell => "SELL",
        }
    }
}

/// Suggested holding period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    LongTerm,
    ShortTerm,
    Both,
    Unclear,
}

impl Horizon {
    pub fn statement(&self) -> &'static str {
        match self {
            Horizon::LongTerm => {
                "This stock is suitable for long-term investment based on strong fundamentals."
            }
            Horizon::ShortTerm => {
                "This stock may be good for short-term trading due to technical momentum."
            }
            Horizon::Both => "This stock is strong for both short-term and long-term holding.",
            Horizon::Unclear => {
                "Investment horizon is unclear; further news or breakout confirmation needed."
            }
        }
    }
}

/// Output of the scoring engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score: i32,
    pub recommendation: Recommendation,
    /// In rule evaluation order
    pub reasons: Vec<String>,
    pub horizon: Horizon,
}

/// Everything a single analysis produces, ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub current_price: f64,
    pub levels: SupportResistance,
    pub indicators: IndicatorSet,
    pub fundamentals: FundamentalMetrics,
    pub result: ScoreResult,
}
