use analysis_core::{AnalysisError, Bar, MarketDataProvider, RawFundamentals};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
/// Hands out the session cookie the crumb endpoint requires
pub const DEFAULT_COOKIE_URL: &str = "https://fc.yahoo.com";
/// quoteSummary modules holding trailingPE, trailingEps and returnOnEquity
pub const SUMMARY_MODULES: &str = "summaryDetail,defaultKeyStatistics,financialData";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Connection and history-window settings for [`YahooFinanceClient`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YahooConfig {
    pub base_url: String,
    pub cookie_url: String,
    pub timeout: Duration,
    /// Chart range, e.g. `1y` for the trailing twelve months
    pub range: String,
    /// Bar interval, e.g. `1d`
    pub interval: String,
    /// Retries after a 429 before giving up
    pub max_retries: u32,
    pub retry_wait: Duration,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cookie_url: DEFAULT_COOKIE_URL.to_string(),
            timeout: Duration::from_secs(30),
            range: "1y".to_string(),
            interval: "1d".to_string(),
            max_retries: 3,
            retry_wait: Duration::from_secs(5),
        }
    }
}

impl YahooConfig {
    /// Defaults overridden by `YAHOO_BASE_URL`, `YAHOO_COOKIE_URL`,
    /// `YAHOO_TIMEOUT_SECS`, `YAHOO_HISTORY_RANGE`, `YAHOO_HISTORY_INTERVAL`
    /// and `YAHOO_MAX_RETRIES`. Unparseable numbers fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_url: std::env::var("YAHOO_BASE_URL").unwrap_or(defaults.base_url),
            cookie_url: std::env::var("YAHOO_COOKIE_URL").unwrap_or(defaults.cookie_url),
            timeout: env_parse::<u64>("YAHOO_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            range: std::env::var("YAHOO_HISTORY_RANGE").unwrap_or(defaults.range),
            interval: std::env::var("YAHOO_HISTORY_INTERVAL").unwrap_or(defaults.interval),
            max_retries: env_parse("YAHOO_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_wait: defaults.retry_wait,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[derive(Clone)]
pub struct YahooFinanceClient {
    client: Client,
    config: YahooConfig,
    crumb: Arc<Mutex<Option<String>>>,
}

impl YahooFinanceClient {
    pub fn new(config: YahooConfig) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| AnalysisError::DataFetch(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            crumb: Arc::new(Mutex::new(None)),
        })
    }

    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    /// Send a request, retrying on 429. Returns the body of a successful
    /// response; any other status becomes `DataFetch("HTTP {status}: {detail}")`.
    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<String, AnalysisError> {
        let request = builder
            .build()
            .map_err(|e| AnalysisError::DataFetch(e.to_string()))?;
        let max_retries = self.config.max_retries;

        for attempt in 0..=max_retries {
            let req_clone = request
                .try_clone()
                .ok_or_else(|| AnalysisError::DataFetch("Cannot clone request".to_string()))?;
            tracing::debug!("GET {}", req_clone.url());
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| AnalysisError::DataFetch(e.to_string()))?;

            let status = response.status();
            if status.as_u16() == 429 {
                if attempt < max_retries {
                    tracing::warn!(
                        "Yahoo 429 rate limited, waiting {}s before retry {}/{}",
                        self.config.retry_wait.as_secs(),
                        attempt + 1,
                        max_retries
                    );
                    tokio::time::sleep(self.config.retry_wait).await;
                }
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            if !status.is_success() {
                let detail = serde_json::from_str::<Value>(&body)
                    .ok()
                    .and_then(|json| error_description(&json))
                    .unwrap_or(body);
                return Err(AnalysisError::DataFetch(format!("HTTP {}: {}", status, detail)));
            }

            return Ok(body);
        }

        Err(AnalysisError::DataFetch(format!(
            "Rate limited by Yahoo after {} attempts",
            max_retries + 1
        )))
    }

    async fn get_json(&self, builder: reqwest::RequestBuilder) -> Result<Value, AnalysisError> {
        let body = self.send(builder).await?;
        serde_json::from_str(&body)
            .map_err(|e| AnalysisError::DataFetch(format!("Malformed response: {}", e)))
    }

    /// Crumb for quoteSummary requests, fetched once per client.
    ///
    /// The cookie request only seeds the cookie jar, so its status is
    /// ignored. Returns `None` when no crumb could be obtained; the next call
    /// tries again.
    async fn crumb(&self) -> Option<String> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Some(crumb.clone());
        }

        if let Err(e) = self.client.get(&self.config.cookie_url).send().await {
            tracing::debug!("Cookie request failed: {}", e);
        }

        let url = format!("{}/v1/test/getcrumb", self.config.base_url);
        match self.send(self.client.get(&url)).await {
            Ok(body) => {
                let crumb = body.trim();
                if crumb.is_empty() || crumb.contains('<') || crumb.contains('{') {
                    tracing::warn!("Yahoo returned no usable crumb");
                    return None;
                }
                *cached = Some(crumb.to_string());
                Some(crumb.to_string())
            }
            Err(e) => {
                tracing::warn!("Cannot obtain Yahoo crumb: {}", e);
                None
            }
        }
    }

    /// Daily bars for the configured range, oldest first
    pub async fn get_price_history(&self, symbol: &str) -> Result<Vec<Bar>, AnalysisError> {
        let url = format!("{}/v8/finance/chart/{}", self.config.base_url, symbol);
        let json = self
            .get_json(self.client.get(&url).query(&[
                ("range", self.config.range.as_str()),
                ("interval", self.config.interval.as_str()),
            ]))
            .await?;

        let bars = parse_chart(&json)?;
        tracing::info!("Fetched {} bars for {} ({})", bars.len(), symbol, self.config.range);
        Ok(bars)
    }

    /// Fundamentals for a symbol from quoteSummary, flattened into one bag
    /// (trailingPE, trailingEps, returnOnEquity, ...)
    pub async fn get_quote_summary(&self, symbol: &str) -> Result<RawFundamentals, AnalysisError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.config.base_url, symbol);
        let mut query = vec![("modules", SUMMARY_MODULES.to_string())];
        if let Some(crumb) = self.crumb().await {
            query.push(("crumb", crumb));
        }

        let json = self.get_json(self.client.get(&url).query(&query)).await?;
        let raw = parse_quote_summary(&json, symbol)?;
        tracing::info!("Fetched {} fundamental fields for {}", raw.len(), symbol);
        Ok(raw)
    }
}

#[async_trait]
impl MarketDataProvider for YahooFinanceClient {
    async fn price_history(&self, symbol: &str) -> Result<Vec<Bar>, AnalysisError> {
        self.get_price_history(symbol).await
    }

    async fn fundamentals(&self, symbol: &str) -> Result<RawFundamentals, AnalysisError> {
        self.get_quote_summary(symbol).await
    }
}

/// `description` of a chart or quoteSummary error payload, if any
fn error_description(json: &Value) -> Option<String> {
    ["chart", "quoteSummary", "finance"]
        .iter()
        .filter_map(|root| json.get(root))
        .filter_map(|v| v.get("error"))
        .find(|e| !e.is_null())
        .map(|e| {
            e.get("description")
                .and_then(|d| d.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| e.to_string())
        })
}

fn column<'a>(quotes: &'a Value, name: &str) -> Result<&'a [Value], AnalysisError> {
    quotes
        .get(name)
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .ok_or_else(|| AnalysisError::DataFetch(format!("No {} prices", name)))
}

fn cell(column: &[Value], i: usize) -> Option<f64> {
    column.get(i).and_then(|v| v.as_f64())
}

/// Parse a v8 chart response into bars. Rows with any missing field are
/// skipped; a response with no usable rows is an error.
pub fn parse_chart(json: &Value) -> Result<Vec<Bar>, AnalysisError> {
    if let Some(description) = error_description(json) {
        return Err(AnalysisError::DataFetch(description));
    }

    let chart = json
        .get("chart")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::DataFetch("No chart data found".to_string()))?;

    let timestamps = chart
        .get("timestamp")
        .and_then(|v| v.as_array())
        .ok_or_else(|| AnalysisError::DataFetch("No price data found".to_string()))?;

    let quotes = chart
        .get("indicators")
        .and_then(|v| v.get("quote"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .ok_or_else(|| AnalysisError::DataFetch("No quote data found".to_string()))?;

    let opens = column(quotes, "open")?;
    let highs = column(quotes, "high")?;
    let lows = column(quotes, "low")?;
    let closes = column(quotes, "close")?;
    let volumes = column(quotes, "volume")?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        if let (Some(ts), Some(o), Some(h), Some(l), Some(c), Some(v)) = (
            ts.as_i64(),
            cell(opens, i),
            cell(highs, i),
            cell(lows, i),
            cell(closes, i),
            cell(volumes, i),
        ) {
            let timestamp = DateTime::from_timestamp(ts, 0)
                .ok_or_else(|| AnalysisError::DataFetch(format!("Invalid timestamp {}", ts)))?;
            bars.push(Bar {
                timestamp,
                open: o,
                high: h,
                low: l,
                close: c,
                volume: v,
            });
        }
    }

    if bars.is_empty() {
        return Err(AnalysisError::DataFetch("Chart contained no complete bars".to_string()));
    }

    Ok(bars)
}

/// Flatten the modules of a quoteSummary response into a single bag.
///
/// Formatted values (`{"raw": 0.35, "fmt": "35.00%"}`) collapse to their
/// `raw` part and empty objects are dropped. When modules repeat a field the
/// first module wins.
pub fn parse_quote_summary(json: &Value, symbol: &str) -> Result<RawFundamentals, AnalysisError> {
    if let Some(description) = error_description(json) {
        return Err(AnalysisError::DataFetch(description));
    }

    let modules = json
        .get("quoteSummary")
        .and_then(|v| v.get("result"))
        .and_then(|v| v.as_array())
        .and_then(|arr| arr.first())
        .and_then(|v| v.as_object())
        .ok_or_else(|| {
            AnalysisError::DataFetch(format!("No fundamental data found for {}", symbol))
        })?;

    let mut raw = RawFundamentals::new();
    for fields in modules.values().filter_map(|m| m.as_object()) {
        for (key, value) in fields {
            let value = match value {
                Value::Object(formatted) => match formatted.get("raw") {
                    Some(inner) => inner.clone(),
                    None if formatted.is_empty() => continue,
                    None => value.clone(),
                },
                other => other.clone(),
            };
            raw.entry(key.clone()).or_insert(value);
        }
    }

    Ok(raw)
}
