//! Yahoo Finance data provider.
//!
//! Implements `MarketData` and `NewsData` against Yahoo's public chart
//! and search endpoints. No API key required. Responses are cached
//! in-memory with a short TTL (5 minutes for bars, 30 minutes for
//! news) so repeated scans inside one cycle don't hammer the upstream.
//!
//! Chart API: `https://query1.finance.yahoo.com/v8/finance/chart/{symbol}`
//! Search API: `https://query1.finance.yahoo.com/v1/finance/search`

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{Interval, MarketData, NewsData};
use crate::types::{Bar, BarSeries, Headline, ScoutError};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SEARCH_URL: &str = "https://query1.finance.yahoo.com/v1/finance/search";

const BAR_CACHE_TTL: Duration = Duration::from_secs(300);
const NEWS_CACHE_TTL: Duration = Duration::from_secs(1800);

/// Fallback universe used when the primary symbol source is
/// unavailable: large-cap names with reliable data coverage.
const SAMPLE_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "AMZN", "GOOGL", "META", "TSLA", "NVDA", "JPM",
    "JNJ", "V", "PG", "UNH", "HD", "BAC", "MA", "DIS", "ADBE", "CRM",
    "NFLX", "INTC", "VZ", "CSCO", "PFE", "ABT", "KO", "PEP", "NKE",
    "MRK", "WMT", "T", "AMD", "PYPL", "CMCSA", "XOM", "CVX", "COST",
];

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<SearchNewsItem>,
}

#[derive(Debug, Deserialize)]
struct SearchNewsItem {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    publisher: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default, rename = "providerPublishTime")]
    provider_publish_time: Option<i64>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Convert a chart response into a bar series, skipping rows where any
/// OHLCV field is null (Yahoo pads gaps with nulls).
fn parse_chart(symbol: &str, response: ChartResponse) -> Result<BarSeries> {
    let result = response
        .chart
        .result
        .and_then(|mut r| if r.is_empty() { None } else { Some(r.remove(0)) })
        .ok_or_else(|| ScoutError::MalformedData {
            symbol: symbol.to_string(),
            reason: "no chart result".to_string(),
        })?;

    let timestamps = result.timestamp.ok_or_else(|| ScoutError::MalformedData {
        symbol: symbol.to_string(),
        reason: "missing timestamps".to_string(),
    })?;

    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| ScoutError::MalformedData {
            symbol: symbol.to_string(),
            reason: "missing quote block".to_string(),
        })?;

    let mut bars = Vec::with_capacity(timestamps.len());
    for (i, ts) in timestamps.iter().enumerate() {
        let row = (
            quote.open.get(i).copied().flatten(),
            quote.high.get(i).copied().flatten(),
            quote.low.get(i).copied().flatten(),
            quote.close.get(i).copied().flatten(),
            quote.volume.get(i).copied().flatten(),
        );
        if let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row {
            let timestamp = DateTime::<Utc>::from_timestamp(*ts, 0)
                .unwrap_or_else(Utc::now);
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }
    }

    Ok(BarSeries::new(bars))
}

fn parse_news(response: SearchResponse, max_items: usize) -> Vec<Headline> {
    response
        .news
        .into_iter()
        .filter_map(|item| {
            let title = item.title?;
            let published = item
                .provider_publish_time
                .and_then(|t| DateTime::<Utc>::from_timestamp(t, 0))
                .unwrap_or_else(Utc::now);
            Some(Headline {
                title,
                publisher: item.publisher.unwrap_or_default(),
                link: item.link.unwrap_or_default(),
                published,
            })
        })
        .take(max_items)
        .collect()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Yahoo Finance client with in-memory TTL caches.
pub struct YahooClient {
    http: Client,
    bar_cache: Mutex<HashMap<String, (Instant, BarSeries)>>,
    news_cache: Mutex<HashMap<String, (Instant, Vec<Headline>)>>,
}

impl YahooClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; gapscout/0.1)")
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            bar_cache: Mutex::new(HashMap::new()),
            news_cache: Mutex::new(HashMap::new()),
        })
    }

    async fn fetch_bars_inner(
        &self,
        symbol: &str,
        days: u32,
        interval: Interval,
        include_extended_hours: bool,
    ) -> Result<BarSeries> {
        let period2 = Utc::now().timestamp();
        let period1 = period2 - i64::from(days) * 86_400;
        let url = format!("{CHART_URL}/{symbol}");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", interval.as_str().to_string()),
                ("includePrePost", include_extended_hours.to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("chart request failed for {symbol}"))?
            .error_for_status()
            .with_context(|| format!("chart request rejected for {symbol}"))?;

        let body: ChartResponse = response
            .json()
            .await
            .with_context(|| format!("chart response not JSON for {symbol}"))?;

        parse_chart(symbol, body)
    }

    async fn fetch_headlines_inner(&self, symbol: &str, max_items: usize) -> Result<Vec<Headline>> {
        let response = self
            .http
            .get(SEARCH_URL)
            .query(&[
                ("q", symbol),
                ("newsCount", &max_items.to_string()),
                ("quotesCount", "0"),
            ])
            .send()
            .await
            .with_context(|| format!("news request failed for {symbol}"))?
            .error_for_status()
            .with_context(|| format!("news request rejected for {symbol}"))?;

        let body: SearchResponse = response
            .json()
            .await
            .with_context(|| format!("news response not JSON for {symbol}"))?;

        Ok(parse_news(body, max_items))
    }
}

#[async_trait]
impl MarketData for YahooClient {
    async fn fetch_bars(
        &self,
        symbol: &str,
        days: u32,
        interval: Interval,
        include_extended_hours: bool,
    ) -> BarSeries {
        let cache_key = format!("{symbol}:{days}:{}:{include_extended_hours}", interval.as_str());
        if let Some((fetched_at, series)) = self.bar_cache.lock().unwrap().get(&cache_key) {
            if fetched_at.elapsed() < BAR_CACHE_TTL {
                debug!(symbol, "Using cached bars");
                return series.clone();
            }
        }

        match self
            .fetch_bars_inner(symbol, days, interval, include_extended_hours)
            .await
        {
            Ok(series) => {
                self.bar_cache
                    .lock()
                    .unwrap()
                    .insert(cache_key, (Instant::now(), series.clone()));
                series
            }
            Err(e) => {
                warn!(symbol, error = %e, "Bar fetch failed — treating as no data");
                BarSeries::empty()
            }
        }
    }

    async fn fetch_relative_volume(&self, symbol: &str, lookback_days: u32) -> f64 {
        let series = self
            .fetch_bars(symbol, lookback_days + 1, Interval::Daily, false)
            .await;

        if series.is_empty() || series.len() < lookback_days as usize {
            return 0.0;
        }

        // Average excludes the most recent (in-progress) day.
        let prior = &series.bars[..series.len() - 1];
        let avg_volume = prior.iter().map(|b| b.volume).sum::<f64>() / prior.len() as f64;
        let today_volume = series.bars[series.len() - 1].volume;

        if avg_volume > 0.0 {
            today_volume / avg_volume
        } else {
            0.0
        }
    }

    async fn fetch_symbol_universe(
        &self,
        min_price: f64,
        max_price: f64,
        min_volume: f64,
    ) -> Result<Vec<String>> {
        // Index-component discovery has no free endpoint; the sample
        // list stands in as the candidate pool, filtered live.
        let fetches = SAMPLE_UNIVERSE
            .iter()
            .map(|symbol| async move {
                let series = self.fetch_bars(symbol, 5, Interval::Daily, false).await;
                (*symbol, series)
            });
        let results = join_all(fetches).await;

        let mut filtered = Vec::new();
        let mut any_data = false;
        for (symbol, series) in results {
            if series.is_empty() {
                continue;
            }
            any_data = true;
            let avg_price = series.bars.iter().map(|b| b.close).sum::<f64>() / series.len() as f64;
            let avg_volume = series.bars.iter().map(|b| b.volume).sum::<f64>() / series.len() as f64;
            if avg_price >= min_price && avg_price <= max_price && avg_volume >= min_volume {
                filtered.push(symbol.to_string());
            }
        }

        if !any_data {
            return Err(ScoutError::DataProvider {
                symbol: "universe".to_string(),
                message: "no candidate symbol returned data".to_string(),
            }
            .into());
        }

        Ok(filtered)
    }
}

#[async_trait]
impl NewsData for YahooClient {
    async fn fetch_headlines(&self, symbol: &str, max_items: usize) -> Vec<Headline> {
        if let Some((fetched_at, headlines)) = self.news_cache.lock().unwrap().get(symbol) {
            if fetched_at.elapsed() < NEWS_CACHE_TTL {
                return headlines.clone();
            }
        }

        match self.fetch_headlines_inner(symbol, max_items).await {
            Ok(headlines) => {
                self.news_cache
                    .lock()
                    .unwrap()
                    .insert(symbol.to_string(), (Instant::now(), headlines.clone()));
                headlines
            }
            Err(e) => {
                warn!(symbol, error = %e, "News fetch failed — treating as no headlines");
                Vec::new()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chart_response(value: serde_json::Value) -> ChartResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_chart_basic() {
        let response = chart_response(json!({
            "chart": {
                "result": [{
                    "timestamp": [1_700_000_000, 1_700_000_060, 1_700_000_120],
                    "indicators": {
                        "quote": [{
                            "open":   [100.0, 101.0, 102.0],
                            "high":   [101.0, 102.0, 103.0],
                            "low":    [99.0, 100.0, 101.0],
                            "close":  [100.5, 101.5, 102.5],
                            "volume": [10000.0, 12000.0, 9000.0]
                        }]
                    }
                }]
            }
        }));

        let series = parse_chart("TEST", response).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.first_close(), Some(100.5));
        assert_eq!(series.last_close(), Some(102.5));
        assert!(series.bars[0].timestamp < series.bars[1].timestamp);
    }

    #[test]
    fn test_parse_chart_skips_null_rows() {
        let response = chart_response(json!({
            "chart": {
                "result": [{
                    "timestamp": [1_700_000_000, 1_700_000_060, 1_700_000_120],
                    "indicators": {
                        "quote": [{
                            "open":   [100.0, null, 102.0],
                            "high":   [101.0, null, 103.0],
                            "low":    [99.0, null, 101.0],
                            "close":  [100.5, null, 102.5],
                            "volume": [10000.0, null, 9000.0]
                        }]
                    }
                }]
            }
        }));

        let series = parse_chart("TEST", response).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_parse_chart_no_result_is_error() {
        let response = chart_response(json!({ "chart": { "result": null } }));
        let err = parse_chart("TEST", response).unwrap_err();
        assert!(err.to_string().contains("no chart result"));
    }

    #[test]
    fn test_parse_chart_missing_timestamps_is_error() {
        let response = chart_response(json!({
            "chart": { "result": [{ "indicators": { "quote": [{}] } }] }
        }));
        assert!(parse_chart("TEST", response).is_err());
    }

    #[test]
    fn test_parse_news() {
        let response: SearchResponse = serde_json::from_value(json!({
            "news": [
                {
                    "title": "Acme beats earnings estimates",
                    "publisher": "Newswire",
                    "link": "https://example.com/1",
                    "providerPublishTime": 1_700_000_000
                },
                { "publisher": "Untitled item is dropped" },
                {
                    "title": "Second story",
                    "providerPublishTime": 1_699_999_000
                }
            ]
        }))
        .unwrap();

        let headlines = parse_news(response, 5);
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].title, "Acme beats earnings estimates");
        assert_eq!(headlines[0].publisher, "Newswire");
        assert_eq!(headlines[1].publisher, "");
    }

    #[test]
    fn test_parse_news_respects_max_items() {
        let response: SearchResponse = serde_json::from_value(json!({
            "news": [
                { "title": "one" }, { "title": "two" }, { "title": "three" }
            ]
        }))
        .unwrap();
        assert_eq!(parse_news(response, 2).len(), 2);
    }
}
