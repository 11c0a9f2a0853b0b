//! Daily bar acquisition
//!
//! The only network-facing piece of the market module. Sources are used to
//! fill the local cache once; simulation never calls them directly.

use super::PriceBar;
use crate::error::EngineError;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info};

/// Provider of daily OHLCV history
#[async_trait::async_trait]
pub trait MarketDataSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Daily bars in `[start, end)`, split/dividend adjusted
    async fn fetch_daily(&self, ticker: &str, start: NaiveDate, end: NaiveDate)
        -> Result<Vec<PriceBar>>;
}

/// Yahoo Finance v8 chart endpoint
pub struct YahooChartSource {
    client: Client,
    base_url: String,
}

impl YahooChartSource {
    pub fn new() -> Result<Self> {
        Self::with_base_url("https://query1.finance.yahoo.com/v8/finance/chart")
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent("Mozilla/5.0 (market-verdict-engine)")
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait::async_trait]
impl MarketDataSource for YahooChartSource {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>> {
        let url = format!("{}/{}", self.base_url, ticker);
        let period1 = midnight_utc(start).timestamp().to_string();
        let period2 = midnight_utc(end).timestamp().to_string();

        info!(ticker = ticker, %start, %end, "Fetching daily bars");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
                ("events", "div,split"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(ticker = ticker, %status, "Chart request failed");
            return Err(EngineError::DataError(format!(
                "{}: chart request failed with {}: {}",
                ticker, status, body
            )));
        }

        let chart: ChartResponse = response.json().await?;
        let bars = parse_chart_response(ticker, chart)?;

        info!(ticker = ticker, bars = bars.len(), "Fetched daily bars");
        Ok(bars)
    }
}

fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

//
// ================= Chart Payload =================
//

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
    #[serde(default)]
    adjclose: Vec<AdjClose>,
}

#[derive(Debug, Deserialize)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

/// Turn a chart payload into adjusted bars, skipping incomplete rows.
///
/// Prices are scaled by `adjclose / close` when adjusted closes are present.
pub fn parse_chart_response(ticker: &str, response: ChartResponse) -> Result<Vec<PriceBar>> {
    if let Some(err) = response.chart.error {
        return Err(EngineError::DataError(format!(
            "{}: {} ({})",
            ticker, err.description, err.code
        )));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| EngineError::DataError(format!("{}: empty chart result", ticker)))?;

    let quote = result
        .indicators
        .quote
        .first()
        .ok_or_else(|| EngineError::DataError(format!("{}: no quote series", ticker)))?;
    let adjclose = result.indicators.adjclose.first().map(|a| &a.adjclose);

    let mut bars = Vec::with_capacity(result.timestamp.len());

    for (i, ts) in result.timestamp.iter().enumerate() {
        let field = |series: &Vec<Option<f64>>| series.get(i).copied().flatten();

        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            field(&quote.open),
            field(&quote.high),
            field(&quote.low),
            field(&quote.close),
            field(&quote.volume),
        ) else {
            continue;
        };

        let Some(date) = DateTime::from_timestamp(*ts, 0).map(|dt| dt.date_naive()) else {
            continue;
        };

        let factor = match adjclose.and_then(|series| field(series)) {
            Some(adj) if close > 0.0 => adj / close,
            _ => 1.0,
        };

        bars.push(PriceBar {
            date,
            open: open * factor,
            high: high * factor,
            low: low * factor,
            close: close * factor,
            volume,
        });
    }

    Ok(bars)
}
