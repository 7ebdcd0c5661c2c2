//! Session risk governor.
//!
//! Tracks realized P&L and the loss streak within a trading session and
//! gates new trades. Both limits are session-scoped: `reset_daily_stats`
//! clears them at the start of a new day. The governor never inspects
//! the plans themselves, only their recorded outcomes.

use tracing::{info, warn};

use crate::types::{TradePlan, TradeRecord, TradeResult, TradingSummary};

/// Circuit-breaker limits.
#[derive(Debug, Clone)]
pub struct RiskConfig {
    /// Stop trading once realized daily loss reaches this (dollars).
    pub max_daily_loss: f64,
    /// Stop trading after this many losses in a row.
    pub max_consecutive_losses: u32,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss: 100.0,
            max_consecutive_losses: 3,
        }
    }
}

/// Gates trade generation on session loss limits.
#[derive(Debug)]
pub struct RiskGovernor {
    config: RiskConfig,
    daily_pnl: f64,
    consecutive_losses: u32,
    trades: Vec<TradeRecord>,
}

impl RiskGovernor {
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            daily_pnl: 0.0,
            consecutive_losses: 0,
            trades: Vec::new(),
        }
    }

    /// Whether a new trade may be taken right now. False once the daily
    /// loss cap is hit or the loss streak reaches its limit.
    pub fn can_take_trade(&self) -> bool {
        if self.daily_pnl <= -self.config.max_daily_loss {
            warn!(
                daily_pnl = self.daily_pnl,
                limit = self.config.max_daily_loss,
                "Daily loss limit reached — trading halted"
            );
            return false;
        }
        if self.consecutive_losses >= self.config.max_consecutive_losses {
            warn!(
                streak = self.consecutive_losses,
                "Consecutive-loss limit reached — trading halted"
            );
            return false;
        }
        true
    }

    /// Record the outcome of an executed plan. A loss extends the
    /// streak; a win or breakeven resets it to zero.
    pub fn record_trade_result(&mut self, plan: &TradePlan, result: TradeResult, pnl: f64) {
        self.daily_pnl += pnl;
        match result {
            TradeResult::Loss => self.consecutive_losses += 1,
            TradeResult::Win | TradeResult::Breakeven => self.consecutive_losses = 0,
        }

        self.trades.push(TradeRecord {
            symbol: plan.symbol.clone(),
            direction: plan.direction,
            entry_price: plan.entry_price,
            stop_loss: plan.stop_loss,
            take_profit: plan.take_profit,
            position_size: plan.position_size,
            result,
            pnl,
            timestamp: chrono::Utc::now(),
        });

        info!(
            symbol = %plan.symbol,
            result = %result,
            pnl = pnl,
            daily_pnl = self.daily_pnl,
            streak = self.consecutive_losses,
            "Trade result recorded"
        );
    }

    /// Start a fresh session: zeroes the P&L and the loss streak. The
    /// trade history is append-only and survives resets, so summaries
    /// keep covering everything recorded since construction.
    pub fn reset_daily_stats(&mut self) {
        info!("Resetting daily risk stats");
        self.daily_pnl = 0.0;
        self.consecutive_losses = 0;
    }

    /// Summary statistics over the session's recorded trades.
    pub fn get_trading_summary(&self) -> TradingSummary {
        if self.trades.is_empty() {
            return TradingSummary {
                daily_pnl: self.daily_pnl,
                consecutive_losses: self.consecutive_losses,
                ..TradingSummary::default()
            };
        }

        let total_trades = self.trades.len();
        let winning_trades = self
            .trades
            .iter()
            .filter(|t| t.result == TradeResult::Win)
            .count();
        let losing_trades = self
            .trades
            .iter()
            .filter(|t| t.result == TradeResult::Loss)
            .count();
        let total_pnl: f64 = self.trades.iter().map(|t| t.pnl).sum();

        let largest_win = self
            .trades
            .iter()
            .filter(|t| t.result == TradeResult::Win)
            .map(|t| t.pnl)
            .fold(0.0_f64, f64::max);
        let largest_loss = self
            .trades
            .iter()
            .filter(|t| t.result == TradeResult::Loss)
            .map(|t| t.pnl)
            .fold(0.0_f64, f64::min);

        TradingSummary {
            total_trades,
            winning_trades,
            losing_trades,
            win_rate: winning_trades as f64 / total_trades as f64 * 100.0,
            total_pnl,
            average_pnl: total_pnl / total_trades as f64,
            largest_win,
            largest_loss,
            daily_pnl: self.daily_pnl,
            consecutive_losses: self.consecutive_losses,
        }
    }

    pub fn daily_pnl(&self) -> f64 {
        self.daily_pnl
    }

    pub fn consecutive_losses(&self) -> u32 {
        self.consecutive_losses
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
