use analysis_core::{AnalysisError, Bar, IndicatorSeries};

pub const RSI_PERIOD: usize = 14;
pub const SMA_SHORT_PERIOD: usize = 50;
pub const SMA_LONG_PERIOD: usize = 200;
/// Lookback for the short-term trend check
pub const TREND_LOOKBACK: usize = 10;

/// Simple Moving Average
pub fn sma(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);
    for i in period - 1..data.len() {
        let sum: f64 = data[i + 1 - period..=i].iter().sum();
        result.push(sum / period as f64);
    }
    result
}

/// Relative Strength Index.
///
/// Gains and losses are smoothed with an exponential average
/// (`alpha = 1 / period`) seeded from the first change. The first value
/// lines up with `data[period]`; each later value lines up with the next
/// input. Any window whose average loss is zero reads 100, including a
/// window with no movement at all.
pub fn rsi(data: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || data.len() < period + 1 {
        return vec![];
    }

    let alpha = 1.0 / period as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut rsi_values = Vec::with_capacity(data.len() - period);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if i == 1 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = (1.0 - alpha) * avg_gain + alpha * gain;
            avg_loss = (1.0 - alpha) * avg_loss + alpha * loss;
        }

        if i >= period {
            rsi_values.push(rsi_from_averages(avg_gain, avg_loss));
        }
    }

    rsi_values
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Pads a compact indicator output with leading `None`s so that it lines up
/// with an input of length `len`.
pub fn align(values: Vec<f64>, len: usize) -> Vec<Option<f64>> {
    let lead = len.saturating_sub(values.len());
    std::iter::repeat(None)
        .take(lead)
        .chain(values.into_iter().map(Some))
        .collect()
}

/// RSI(14), SMA(50) and SMA(200) for every bar.
///
/// Windows longer than the series come back as all-`None` columns; only an
/// empty series is an error.
pub fn compute_indicators(bars: &[Bar]) -> Result<IndicatorSeries, AnalysisError> {
    if bars.is_empty() {
        return Err(AnalysisError::InsufficientData(
            "Need at least 1 bar to compute indicators".to_string(),
        ));
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let len = closes.len();

    Ok(IndicatorSeries {
        rsi: align(rsi(&closes, RSI_PERIOD), len),
        sma_50: align(sma(&closes, SMA_SHORT_PERIOD), len),
        sma_200: align(sma(&closes, SMA_LONG_PERIOD), len),
    })
}

/// Close change over the last `TREND_LOOKBACK` bars (`close[-1] - close[-10]`)
pub fn ten_day_change(bars: &[Bar]) -> Option<f64> {
    if bars.len() < TREND_LOOKBACK {
        return None;
    }
    let last = bars[bars.len() - 1].close;
    let earlier = bars[bars.len() - TREND_LOOKBACK].close;
    Some(last - earlier)
}
