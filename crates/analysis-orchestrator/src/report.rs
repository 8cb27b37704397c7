use analysis_core::Analysis;

pub const DISCLAIMER: &str = "Always invest based on your own research and risk tolerance.";

const INDICATOR_MISSING: &str = "not available";
const FUNDAMENTAL_MISSING: &str = "unavailable";

fn price_or_missing(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| INDICATOR_MISSING.to_string())
}

fn verbatim_or_missing(value: Option<f64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| FUNDAMENTAL_MISSING.to_string())
}

/// Renders the fixed-layout text report. Field order and rounding are stable,
/// so identical analyses render byte-identical text.
pub fn format_report(ticker: &str, analysis: &Analysis) -> String {
    let indicators = &analysis.indicators;
    let fundamentals = &analysis.fundamentals;
    let result = &analysis.result;

    let rsi = indicators
        .rsi
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| INDICATOR_MISSING.to_string());

    let mut output = format!(
        "--- Analysis for {} ---\n\
         Current Price: ${:.2}\n\
         Support Level: ${:.2}\n\
         Resistance Level: ${:.2}\n\
         RSI: {}\n\
         50-Day SMA: {}\n\
         200-Day SMA: {}\n\
         \n\
         --- Fundamental Summary ---\n\
         P/E Ratio: {}\n\
         EPS: {}\n\
         ROE: {}\n\
         \n\
         Final Recommendation: {}\n\
         Score: {}\n\
         Reasons:",
        ticker,
        analysis.current_price,
        analysis.levels.support,
        analysis.levels.resistance,
        rsi,
        price_or_missing(indicators.sma_50),
        price_or_missing(indicators.sma_200),
        verbatim_or_missing(fundamentals.pe_ratio),
        verbatim_or_missing(fundamentals.eps),
        verbatim_or_missing(fundamentals.roe),
        result.recommendation.to_label(),
        result.score,
    );

    for reason in &result.reasons {
        output.push_str(&format!("\n - {}", reason));
    }

    output.push_str(&format!("\n\n{}", result.horizon.statement()));
    output.push_str(&format!("\n\n{}", DISCLAIMER));
    output
}
