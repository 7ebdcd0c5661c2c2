//! Market and news data collaborators.
//!
//! Defines the `MarketData` and `NewsData` traits consumed by the
//! scanner and the trade planner, and provides the Yahoo Finance
//! implementation. Every fetch is fail-soft: a data problem for one
//! symbol degrades to an empty result (or a zero sentinel), never to an
//! error that aborts a whole scan cycle. Retry and rate-limit handling
//! belong to the implementations, not the callers.

pub mod yahoo;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{BarSeries, Headline};

/// Bar interval for historical data requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interval {
    OneMinute,
    Daily,
}

impl Interval {
    /// Wire representation used by upstream chart APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::OneMinute => "1m",
            Interval::Daily => "1d",
        }
    }
}

/// Abstraction over market data sources.
///
/// Implementors absorb transient upstream failures; callers treat empty
/// series and zero sentinels as "no data for this symbol".
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Fetch OHLCV bars covering the trailing `days` calendar days.
    /// Returns an empty series on any failure.
    async fn fetch_bars(
        &self,
        symbol: &str,
        days: u32,
        interval: Interval,
        include_extended_hours: bool,
    ) -> BarSeries;

    /// Today's volume relative to the average of the prior
    /// `lookback_days` days (excluding today). 0.0 means
    /// "undeterminable".
    async fn fetch_relative_volume(&self, symbol: &str, lookback_days: u32) -> f64;

    /// Best-effort symbol universe filtered by price band and average
    /// daily volume. May fall back to a fixed sample list when the
    /// primary source is unavailable.
    async fn fetch_symbol_universe(
        &self,
        min_price: f64,
        max_price: f64,
        min_volume: f64,
    ) -> Result<Vec<String>>;
}

/// Abstraction over news sources.
#[async_trait]
pub trait NewsData: Send + Sync {
    /// Recent headlines for a symbol, newest first, at most `max_items`.
    /// Empty on any failure.
    async fn fetch_headlines(&self, symbol: &str, max_items: usize) -> Vec<Headline>;
}
