//! Signal scanners and the comprehensive scan cycle.
//!
//! Four independent scans over a symbol universe — price deviation,
//! relative volume, relative volatility (ATR), momentum ranking — plus
//! a news catalyst check, joined by the ranker into a scored
//! opportunity list. Scans have no data dependency on each other and
//! run concurrently; each fails soft per symbol, so a bad ticker costs
//! one entry, never the cycle.

pub mod catalyst;
pub mod ranker;

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info};

use crate::data::{Interval, MarketData, NewsData};
use crate::types::{
    AtrSignal, Catalyst, DeviationSignal, Direction, ScanReport, StrengthSignal, VolumeSignal,
};
use crate::volatility;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Scanner thresholds and windows.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Minimum absolute intraday move, percent.
    pub min_deviation_pct: f64,
    /// Include pre-market bars in the deviation scan.
    pub include_premarket: bool,
    /// Minimum relative volume multiple.
    pub min_relative_volume: f64,
    /// Days of history behind the relative-volume average.
    pub volume_lookback_days: u32,
    /// Bar count required for the high-ATR scan.
    pub atr_lookback_days: u32,
    /// Rolling window for ATR.
    pub atr_period: usize,
    /// Relative-strength lookback, in weeks.
    pub strength_period_weeks: u32,
    /// Headlines examined per symbol in the catalyst scan.
    pub max_headlines: usize,
    /// Below this many deviation hits, the secondary scans widen to a
    /// slice of the full universe instead.
    pub min_deviation_symbols: usize,
    /// Cap on that widened slice.
    pub expanded_scan_limit: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            min_deviation_pct: 4.0,
            include_premarket: true,
            min_relative_volume: 1.5,
            volume_lookback_days: 20,
            atr_lookback_days: 20,
            atr_period: volatility::DEFAULT_ATR_PERIOD,
            strength_period_weeks: 13,
            max_headlines: 5,
            min_deviation_symbols: 10,
            expanded_scan_limit: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

/// Runs the signal scans against the data collaborators.
///
/// Holds no mutable state: every scan recomputes from fresh fetches,
/// so partially completed results from an abandoned cycle remain
/// independently valid.
pub struct Scanner {
    market_data: Arc<dyn MarketData>,
    news: Arc<dyn NewsData>,
    config: ScanConfig,
}

impl Scanner {
    pub fn new(market_data: Arc<dyn MarketData>, news: Arc<dyn NewsData>, config: ScanConfig) -> Self {
        Self {
            market_data,
            news,
            config,
        }
    }

    /// Access the scan configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    // -- Price deviation --------------------------------------------------

    /// Find symbols whose price has moved at least `min_deviation_pct`
    /// from the first close of the day. Sorted by absolute deviation,
    /// largest first.
    pub async fn scan_price_deviation(&self, symbols: &[String]) -> Vec<DeviationSignal> {
        let fetches = symbols.iter().map(|symbol| async move {
            let series = self
                .market_data
                .fetch_bars(symbol, 1, Interval::OneMinute, self.config.include_premarket)
                .await;
            (symbol, series)
        });

        let mut results = Vec::new();
        for (symbol, series) in join_all(fetches).await {
            let (Some(prev_close), Some(last_bar)) = (series.first_close(), series.last_bar())
            else {
                debug!(symbol = %symbol, "No intraday bars — skipping deviation check");
                continue;
            };
            if prev_close <= 0.0 {
                continue;
            }

            let current_price = last_bar.close;
            let deviation_pct = (current_price - prev_close) / prev_close * 100.0;

            if deviation_pct.abs() >= self.config.min_deviation_pct {
                results.push(DeviationSignal {
                    symbol: symbol.clone(),
                    current_price,
                    prev_close,
                    deviation_pct,
                    direction: if deviation_pct > 0.0 { Direction::Up } else { Direction::Down },
                    last_update: last_bar.timestamp,
                });
            }
        }

        results.sort_by(|a, b| {
            b.deviation_pct
                .abs()
                .partial_cmp(&a.deviation_pct.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    // -- Relative volume --------------------------------------------------

    /// Find symbols trading at a multiple of their trailing average
    /// volume. A zero relative volume means "undeterminable" and the
    /// symbol is excluded. Sorted by relative volume descending.
    pub async fn scan_relative_volume(&self, symbols: &[String]) -> Vec<VolumeSignal> {
        let fetches = symbols.iter().map(|symbol| async move {
            let rel_volume = self
                .market_data
                .fetch_relative_volume(symbol, self.config.volume_lookback_days)
                .await;
            let today = self
                .market_data
                .fetch_bars(symbol, 1, Interval::Daily, false)
                .await;
            (symbol, rel_volume, today)
        });

        let mut results = Vec::new();
        for (symbol, rel_volume, today) in join_all(fetches).await {
            if rel_volume <= 0.0 || today.is_empty() {
                continue;
            }
            if rel_volume >= self.config.min_relative_volume {
                let current_volume = today.last_bar().map(|b| b.volume).unwrap_or(0.0);
                results.push(VolumeSignal {
                    symbol: symbol.clone(),
                    relative_volume: rel_volume,
                    current_volume,
                    avg_volume: current_volume / rel_volume,
                });
            }
        }

        results.sort_by(|a, b| {
            b.relative_volume
                .partial_cmp(&a.relative_volume)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    // -- High ATR ---------------------------------------------------------

    /// Find symbols whose ATR-as-percentage-of-price is strictly above
    /// the average of the peer set passed in. The average is computed
    /// over the scan input set, so a symbol's inclusion depends on its
    /// peers. Sorted by ATR ratio descending.
    pub async fn scan_high_atr(&self, symbols: &[String]) -> Vec<AtrSignal> {
        let lookback = self.config.atr_lookback_days;
        let fetches = symbols.iter().map(|symbol| async move {
            // Buffer days cover holidays/weekend gaps in the window.
            let series = self
                .market_data
                .fetch_bars(symbol, lookback + 10, Interval::Daily, false)
                .await;
            (symbol, series)
        });

        let mut measured = Vec::new();
        for (symbol, series) in join_all(fetches).await {
            if series.len() < lookback as usize {
                debug!(symbol = %symbol, rows = series.len(), "Insufficient history for ATR scan");
                continue;
            }
            let (Some(atr), Some(price)) = (
                volatility::latest_atr(&series, self.config.atr_period),
                series.last_close(),
            ) else {
                continue;
            };
            if price <= 0.0 {
                continue;
            }
            measured.push((symbol.clone(), atr, atr / price * 100.0, price));
        }

        if measured.is_empty() {
            return Vec::new();
        }

        let avg_atr_percentage =
            measured.iter().map(|(_, _, pct, _)| pct).sum::<f64>() / measured.len() as f64;

        let mut results: Vec<AtrSignal> = measured
            .into_iter()
            .filter(|(_, _, atr_percentage, _)| *atr_percentage > avg_atr_percentage)
            .map(|(symbol, atr, atr_percentage, price)| AtrSignal {
                symbol,
                atr,
                atr_percentage,
                price,
                atr_ratio: atr_percentage / avg_atr_percentage,
            })
            .collect();

        results.sort_by(|a, b| {
            b.atr_ratio
                .partial_cmp(&a.atr_ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        results
    }

    // -- Relative strength ------------------------------------------------

    /// Rank symbols by percentage performance over the lookback window.
    /// Symbols without enough history are excluded. Rank 1 is the best
    /// performer (percentile 100); the last rank's percentile is just
    /// above zero.
    pub async fn scan_relative_strength(&self, symbols: &[String]) -> Vec<StrengthSignal> {
        let days_needed = (self.config.strength_period_weeks * 7) as usize;
        let fetches = symbols.iter().map(|symbol| async move {
            let series = self
                .market_data
                .fetch_bars(symbol, days_needed as u32 + 10, Interval::Daily, false)
                .await;
            (symbol, series)
        });

        let mut performances = Vec::new();
        for (symbol, series) in join_all(fetches).await {
            if series.len() < days_needed {
                debug!(symbol = %symbol, rows = series.len(), "Insufficient history for strength ranking");
                continue;
            }
            let start_price = series.bars[series.len() - days_needed].close;
            let Some(current_price) = series.last_close() else {
                continue;
            };
            if start_price <= 0.0 {
                continue;
            }
            let performance_pct = (current_price - start_price) / start_price * 100.0;
            performances.push((symbol.clone(), performance_pct));
        }

        performances.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

        let total = performances.len();
        performances
            .into_iter()
            .enumerate()
            .map(|(i, (symbol, performance_pct))| StrengthSignal {
                symbol,
                performance_pct,
                rank: i + 1,
                percentile: 100.0 - (i as f64 / total as f64 * 100.0),
            })
            .collect()
    }

    // -- Catalysts --------------------------------------------------------

    /// Check recent headlines for each symbol and collect catalysts.
    pub async fn scan_catalysts(&self, symbols: &[String]) -> Vec<Catalyst> {
        let fetches = symbols.iter().map(|symbol| async move {
            let headlines = self
                .news
                .fetch_headlines(symbol, self.config.max_headlines)
                .await;
            catalyst::detect_catalyst(symbol, &headlines)
        });

        join_all(fetches).await.into_iter().flatten().collect()
    }

    // -- Comprehensive scan -----------------------------------------------

    /// Run the whole pipeline: universe → scans → ranked opportunities.
    ///
    /// The deviation scan runs over the full universe; if it yields too
    /// few symbols, the secondary scans widen to a slice of the
    /// universe so the peer-relative scans still have a meaningful
    /// sample. Catalysts are only checked for deviation hits (they can
    /// only affect scoring for gated symbols anyway).
    pub async fn run_comprehensive_scan(
        &self,
        min_price: f64,
        max_price: f64,
        min_volume: f64,
    ) -> ScanReport {
        info!("Starting comprehensive scan");

        let universe = match self
            .market_data
            .fetch_symbol_universe(min_price, max_price, min_volume)
            .await
        {
            Ok(universe) => universe,
            Err(e) => {
                error!(error = %e, "Universe fetch failed — aborting cycle");
                return ScanReport::failed(e.to_string());
            }
        };
        info!(size = universe.len(), "Universe assembled");

        let deviation_results = self.scan_price_deviation(&universe).await;
        info!(count = deviation_results.len(), "Deviation scan complete");

        let deviation_symbols: Vec<String> = deviation_results
            .iter()
            .map(|d| d.symbol.clone())
            .collect();

        let scan_symbols: &[String] = if deviation_symbols.len() >= self.config.min_deviation_symbols
        {
            &deviation_symbols
        } else {
            &universe[..universe.len().min(self.config.expanded_scan_limit)]
        };

        let (volume_results, atr_results, strength_results, catalyst_results) = tokio::join!(
            self.scan_relative_volume(scan_symbols),
            self.scan_high_atr(scan_symbols),
            self.scan_relative_strength(scan_symbols),
            self.scan_catalysts(&deviation_symbols),
        );

        info!(
            volume = volume_results.len(),
            atr = atr_results.len(),
            strength = strength_results.len(),
            catalysts = catalyst_results.len(),
            "Secondary scans complete"
        );

        let opportunities = ranker::rank_opportunities(
            &deviation_results,
            &volume_results,
            &atr_results,
            &catalyst_results,
            &strength_results,
        );
        info!(count = opportunities.len(), "Opportunities ranked");

        ScanReport {
            universe_size: universe.len(),
            deviation_results,
            volume_results,
            atr_results,
            catalyst_results,
            strength_results,
            opportunities,
            error: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
