//! Shared types for the GAPSCOUT pipeline.
//!
//! These types form the data model used across all modules: bar data
//! produced by the market-data collaborators, the per-scanner signal
//! records, ranked opportunities, and the trade-plan / risk-session
//! types. They are designed to be stable so that data, scan, and
//! strategy modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Bars
// ---------------------------------------------------------------------------

/// A single OHLCV record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// An ordered sequence of bars for one symbol at one interval.
///
/// Timestamps are strictly increasing; `high >= max(open, close)` and
/// `low <= min(open, close)`. Produced by the market-data collaborator
/// and read-only to the core — an empty series is the universal
/// "no data" value, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarSeries {
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    /// An empty series — the fail-soft result for any fetch problem.
    pub fn empty() -> Self {
        Self { bars: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Close of the first bar (start-of-period reference price).
    pub fn first_close(&self) -> Option<f64> {
        self.bars.first().map(|b| b.close)
    }

    /// Close of the most recent bar.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }

    pub fn last_bar(&self) -> Option<&Bar> {
        self.bars.last()
    }
}

/// A news headline for a symbol, as returned by the news collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub publisher: String,
    pub link: String,
    pub published: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Direction of an intraday price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// Side of a planned trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    Long,
    Short,
}

impl TradeDirection {
    /// Map an intraday move direction to a trade side: we trade with
    /// the move, not against it.
    pub fn from_move(direction: Direction) -> Self {
        match direction {
            Direction::Up => TradeDirection::Long,
            Direction::Down => TradeDirection::Short,
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "long"),
            TradeDirection::Short => write!(f, "short"),
        }
    }
}

/// Outcome of a closed trade, as reported back by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeResult {
    Win,
    Loss,
    Breakeven,
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeResult::Win => write!(f, "win"),
            TradeResult::Loss => write!(f, "loss"),
            TradeResult::Breakeven => write!(f, "breakeven"),
        }
    }
}

// ---------------------------------------------------------------------------
// Scanner signal records
// ---------------------------------------------------------------------------

/// Price-deviation scan hit: the mandatory gating signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationSignal {
    pub symbol: String,
    pub current_price: f64,
    pub prev_close: f64,
    /// Signed move from the first close of the day, in percent.
    pub deviation_pct: f64,
    pub direction: Direction,
    pub last_update: DateTime<Utc>,
}

impl fmt::Display for DeviationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:+.2}% ({}) @ ${:.2}",
            self.symbol, self.deviation_pct, self.direction, self.current_price,
        )
    }
}

/// Relative-volume scan hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeSignal {
    pub symbol: String,
    /// Today's volume divided by the trailing average.
    pub relative_volume: f64,
    pub current_volume: f64,
    pub avg_volume: f64,
}

/// High-ATR scan hit: volatility above the peer-set average.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtrSignal {
    pub symbol: String,
    pub atr: f64,
    /// ATR as a percentage of the latest close.
    pub atr_percentage: f64,
    pub price: f64,
    /// Symbol's atr_percentage divided by the peer-set average.
    pub atr_ratio: f64,
}

/// Relative-strength ranking entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrengthSignal {
    pub symbol: String,
    /// Percentage performance over the lookback window.
    pub performance_pct: f64,
    /// 1-based rank, 1 = best performer in the peer set.
    pub rank: usize,
    /// 100 for rank 1, approaching 0 for the last rank.
    pub percentile: f64,
}

/// A news catalyst: a headline matching at least one trigger keyword
/// and no suppressor keywords.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalyst {
    pub symbol: String,
    /// All trigger keywords matched in the headline.
    pub catalyst_types: Vec<String>,
    pub headline: Headline,
}

// ---------------------------------------------------------------------------
// Opportunities
// ---------------------------------------------------------------------------

/// A symbol that cleared the price-deviation gate, with its composite
/// score and whichever bonus signals fired. Sub-signals are `Option`
/// so absence is distinguishable from a legitimate zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub symbol: String,
    /// Composite score; unbounded but conventionally 0–150.
    pub score: f64,
    pub price: f64,
    pub deviation_pct: f64,
    pub direction: Direction,
    pub relative_volume: Option<f64>,
    pub atr_percentage: Option<f64>,
    pub strength_percentile: Option<f64>,
    pub catalyst: Option<Catalyst>,
}

impl Opportunity {
    pub fn has_catalyst(&self) -> bool {
        self.catalyst.is_some()
    }
}

impl fmt::Display for Opportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} score={:.1} | {:+.2}% ({}) @ ${:.2}{}",
            self.symbol,
            self.score,
            self.deviation_pct,
            self.direction,
            self.price,
            if self.has_catalyst() { " [catalyst]" } else { "" },
        )
    }
}

/// Result of a comprehensive scan cycle: the per-scanner lists plus the
/// ranked opportunities. A whole-cycle failure produces empty lists and
/// a populated `error` — callers treat that as a valid, information-
/// bearing outcome, never an exception.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub universe_size: usize,
    pub deviation_results: Vec<DeviationSignal>,
    pub volume_results: Vec<VolumeSignal>,
    pub atr_results: Vec<AtrSignal>,
    pub catalyst_results: Vec<Catalyst>,
    pub strength_results: Vec<StrengthSignal>,
    pub opportunities: Vec<Opportunity>,
    pub error: Option<String>,
}

impl ScanReport {
    /// An empty report carrying a cycle-level error message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Trade plans & session records
// ---------------------------------------------------------------------------

/// A fully parameterized, risk-bounded hypothetical trade. Immutable
/// once created; never persisted beyond the caller's session.
///
/// A `position_size` of 0 means the plan is non-actionable (sizing
/// degenerated), not that plan generation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradePlan {
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    /// Whole shares, >= 0.
    pub position_size: u32,
    pub potential_loss: f64,
    pub potential_profit: f64,
    pub risk_reward_ratio: f64,
    /// Composite score of the originating opportunity.
    pub score: f64,
    pub deviation_pct: f64,
    pub catalyst: Option<Catalyst>,
    pub timestamp: DateTime<Utc>,
}

impl TradePlan {
    pub fn has_catalyst(&self) -> bool {
        self.catalyst.is_some()
    }
}

impl fmt::Display for TradePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}sh | entry=${:.2} stop=${:.2} target=${:.2} | risk=${:.2} reward=${:.2} (RR {:.1})",
            self.symbol,
            self.direction,
            self.position_size,
            self.entry_price,
            self.stop_loss,
            self.take_profit,
            self.potential_loss,
            self.potential_profit,
            self.risk_reward_ratio,
        )
    }
}

/// Append-only record of a closed trade in the current session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub symbol: String,
    pub direction: TradeDirection,
    pub entry_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub position_size: u32,
    pub result: TradeResult,
    pub pnl: f64,
    pub timestamp: DateTime<Utc>,
}

/// Summary statistics derived from the session trade history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradingSummary {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    /// Percentage, 0–100.
    pub win_rate: f64,
    pub total_pnl: f64,
    pub average_pnl: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub daily_pnl: f64,
    pub consecutive_losses: u32,
}

impl fmt::Display for TradingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "trades={} (W{}/L{}) win_rate={:.1}% | total=${:.2} avg=${:.2} | daily=${:.2} streak={}",
            self.total_trades,
            self.winning_trades,
            self.losing_trades,
            self.win_rate,
            self.total_pnl,
            self.average_pnl,
            self.daily_pnl,
            self.consecutive_losses,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for GAPSCOUT.
///
/// Most failures in the core degrade to empty results rather than
/// surfacing as errors; these variants cover the places where a cause
/// is worth carrying (collaborator plumbing, config loading).
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("Data provider error ({symbol}): {message}")]
    DataProvider { symbol: String, message: String },

    #[error("Malformed market data for {symbol}: {reason}")]
    MalformedData { symbol: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
