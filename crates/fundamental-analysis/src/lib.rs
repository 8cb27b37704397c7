use analysis_core::{FundamentalMetrics, RawFundamentals};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Provider field names for the three ratios the scorer reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundamentalKeys {
    pub pe_ratio: String,
    pub eps: String,
    pub roe: String,
}

impl Default for FundamentalKeys {
    /// Yahoo Finance quoteSummary field names
    fn default() -> Self {
        Self {
            pe_ratio: "trailingPE".to_string(),
            eps: "trailingEps".to_string(),
            roe: "returnOnEquity".to_string(),
        }
    }
}

/// Pulls P/E, EPS and ROE out of a provider bag.
///
/// Only JSON numbers count; missing keys, nulls, strings and booleans all
/// come back as `None`. Values pass through untouched, so ROE stays a
/// fraction.
pub fn normalize(raw: &RawFundamentals, keys: &FundamentalKeys) -> FundamentalMetrics {
    FundamentalMetrics {
        pe_ratio: numeric(raw, &keys.pe_ratio),
        eps: numeric(raw, &keys.eps),
        roe: numeric(raw, &keys.roe),
    }
}

fn numeric(raw: &RawFundamentals, key: &str) -> Option<f64> {
    match raw.get(key) {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}
