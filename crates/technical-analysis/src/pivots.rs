use analysis_core::{AnalysisError, Bar, SupportResistance};

/// Number of trailing bars the pivot is computed over
pub const PIVOT_WINDOW: usize = 10;

/// Rounds half away from zero to two decimals.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Classical pivot-point support and resistance over the last
/// [`PIVOT_WINDOW`] bars.
///
/// `pivot = (max high + min low + last close) / 3`, support is
/// `2 * pivot - max high`, resistance is `2 * pivot - min low`.
pub fn pivot_levels(bars: &[Bar]) -> Result<SupportResistance, AnalysisError> {
    if bars.len() < PIVOT_WINDOW {
        return Err(AnalysisError::InsufficientData(format!(
            "Need at least {} bars for pivot levels, got {}",
            PIVOT_WINDOW,
            bars.len()
        )));
    }

    let recent = &bars[bars.len() - PIVOT_WINDOW..];
    let high = recent.iter().map(|b| b.high).fold(f64::NEG_INFINITY, f64::max);
    let low = recent.iter().map(|b| b.low).fold(f64::INFINITY, f64::min);
    let close = recent[recent.len() - 1].close;

    let pivot = (high + low + close) / 3.0;
    let support = round_cents(2.0 * pivot - high);
    let resistance = round_cents(2.0 * pivot - low);

    if !support.is_finite() || !resistance.is_finite() {
        return Err(AnalysisError::CalculationError(format!(
            "Pivot levels are not finite (high {}, low {}, close {})",
            high, low, close
        )));
    }

    Ok(SupportResistance { support, resistance })
}
