//! Trade plan generation.
//!
//! Turns ranked opportunities into concrete plans: ATR-based stop,
//! fixed reward multiple for the target, and risk-capped whole-share
//! sizing. The planner owns the risk governor and consults it before
//! generating anything, so a halted session produces empty batches
//! rather than plans the caller must remember to discard.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::data::{Interval, MarketData};
use crate::strategy::risk::{RiskConfig, RiskGovernor};
use crate::types::{
    Opportunity, TradeDirection, TradePlan, TradeResult, TradingSummary,
};
use crate::volatility;

/// Sizing and exit parameters.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Account equity used for the position-size cap (dollars).
    pub account_size: f64,
    /// Maximum dollars at risk per trade.
    pub max_risk_per_trade: f64,
    /// Reward as a multiple of risk.
    pub risk_reward_ratio: f64,
    /// Stop distance as a multiple of ATR.
    pub atr_stop_multiplier: f64,
    /// Rolling window for the stop's ATR.
    pub atr_period: usize,
    /// Daily history behind the stop calculation.
    pub stop_lookback_days: u32,
    /// Cap on position notional as a fraction of account size.
    pub max_position_pct: f64,
    /// Stop distance fallback when no ATR is available, as a fraction
    /// of entry price.
    pub fallback_stop_pct: f64,
    /// Plans generated per batch.
    pub max_plans: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            account_size: 10_000.0,
            max_risk_per_trade: 50.0,
            risk_reward_ratio: 2.0,
            atr_stop_multiplier: 1.5,
            atr_period: volatility::DEFAULT_ATR_PERIOD,
            stop_lookback_days: 20,
            max_position_pct: 0.25,
            fallback_stop_pct: 0.03,
            max_plans: 5,
        }
    }
}

/// Builds trade plans from opportunities, under the risk governor.
pub struct TradePlanner {
    config: PlannerConfig,
    market_data: Arc<dyn MarketData>,
    risk: RiskGovernor,
}

impl TradePlanner {
    pub fn new(
        config: PlannerConfig,
        risk_config: RiskConfig,
        market_data: Arc<dyn MarketData>,
    ) -> Self {
        Self {
            config,
            market_data,
            risk: RiskGovernor::new(risk_config),
        }
    }

    // -- Plan components --------------------------------------------------

    /// Whole-share position size: risk budget divided by per-share
    /// risk, capped so the notional never exceeds the configured
    /// fraction of the account.
    pub fn position_size(&self, entry_price: f64, stop_loss: f64) -> u32 {
        if entry_price <= 0.0 {
            return 0;
        }
        let risk_per_share = (entry_price - stop_loss).abs();
        if risk_per_share <= 0.0 {
            warn!(entry = entry_price, "Zero per-share risk — sizing to zero");
            return 0;
        }

        let shares = (self.config.max_risk_per_trade / risk_per_share).floor();
        let max_notional = self.config.account_size * self.config.max_position_pct;
        let max_shares = (max_notional / entry_price).floor();

        shares.min(max_shares).max(0.0) as u32
    }

    /// Stop price at `atr_stop_multiplier` ATRs from entry, against the
    /// trade direction. Falls back to a fixed percentage stop when the
    /// symbol has no usable daily history.
    pub async fn stop_loss(
        &self,
        symbol: &str,
        entry_price: f64,
        direction: TradeDirection,
    ) -> f64 {
        let series = self
            .market_data
            .fetch_bars(symbol, self.config.stop_lookback_days, Interval::Daily, false)
            .await;

        let stop_distance = match volatility::latest_atr(&series, self.config.atr_period) {
            Some(atr) if atr > 0.0 => atr * self.config.atr_stop_multiplier,
            _ => {
                warn!(
                    symbol = %symbol,
                    "No ATR available — using percentage fallback stop"
                );
                entry_price * self.config.fallback_stop_pct
            }
        };

        match direction {
            TradeDirection::Long => entry_price - stop_distance,
            TradeDirection::Short => entry_price + stop_distance,
        }
    }

    /// Target at the configured reward multiple of the stop distance.
    pub fn take_profit(&self, entry_price: f64, stop_loss: f64, direction: TradeDirection) -> f64 {
        let reward = (entry_price - stop_loss).abs() * self.config.risk_reward_ratio;
        match direction {
            TradeDirection::Long => entry_price + reward,
            TradeDirection::Short => entry_price - reward,
        }
    }

    // -- Plan generation --------------------------------------------------

    /// Build a plan for one opportunity. Returns `None` when the risk
    /// governor has halted trading.
    pub async fn generate_trade_plan(&self, opportunity: &Opportunity) -> Option<TradePlan> {
        if !self.risk.can_take_trade() {
            debug!(symbol = %opportunity.symbol, "Risk governor halted — skipping plan");
            return None;
        }

        let direction = TradeDirection::from_move(opportunity.direction);
        let entry_price = opportunity.price;
        let stop_loss = self.stop_loss(&opportunity.symbol, entry_price, direction).await;
        let take_profit = self.take_profit(entry_price, stop_loss, direction);
        let position_size = self.position_size(entry_price, stop_loss);

        let risk_per_share = (entry_price - stop_loss).abs();
        let potential_loss = risk_per_share * position_size as f64;
        let potential_profit = potential_loss * self.config.risk_reward_ratio;

        Some(TradePlan {
            symbol: opportunity.symbol.clone(),
            direction,
            entry_price,
            stop_loss,
            take_profit,
            position_size,
            potential_loss,
            potential_profit,
            risk_reward_ratio: self.config.risk_reward_ratio,
            score: opportunity.score,
            deviation_pct: opportunity.deviation_pct,
            catalyst: opportunity.catalyst.clone(),
            timestamp: chrono::Utc::now(),
        })
    }

    /// Build plans for the top opportunities, best score first. The
    /// governor is consulted per plan; a gated opportunity is skipped,
    /// not a stop for the rest of the batch.
    pub async fn generate_trade_plans(&self, opportunities: &[Opportunity]) -> Vec<TradePlan> {
        let mut plans = Vec::new();
        for opportunity in opportunities.iter().take(self.config.max_plans) {
            if let Some(plan) = self.generate_trade_plan(opportunity).await {
                info!(symbol = %plan.symbol, direction = %plan.direction, "Trade plan generated");
                plans.push(plan);
            }
        }
        plans
    }

    // -- Risk delegation --------------------------------------------------

    pub fn can_take_trade(&self) -> bool {
        self.risk.can_take_trade()
    }

    pub fn record_trade_result(&mut self, plan: &TradePlan, result: TradeResult, pnl: f64) {
        self.risk.record_trade_result(plan, result, pnl);
    }

    pub fn reset_daily_stats(&mut self) {
        self.risk.reset_daily_stats();
    }

    pub fn get_trading_summary(&self) -> TradingSummary {
        self.risk.get_trading_summary()
    }

    pub fn risk(&self) -> &RiskGovernor {
        &self.risk
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Bar, BarSeries, Direction};
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use std::collections::HashMap;

    struct MockData {
        daily: HashMap<String, BarSeries>,
    }

    impl MockData {
        fn empty() -> Self {
            Self {
                daily: HashMap::new(),
            }
        }

        fn with_constant_range(symbol: &str, close: f64, range: f64, len: usize) -> Self {
            let start = Utc::now() - Duration::days(len as i64);
            let bars = (0..len)
                .map(|i| Bar {
                    timestamp: start + Duration::days(i as i64),
                    open: close,
                    high: close + range / 2.0,
                    low: close - range / 2.0,
                    close,
                    volume: 1_000_000.0,
                })
                .collect();
            let mut daily = HashMap::new();
            daily.insert(symbol.to_string(), BarSeries::new(bars));
            Self { daily }
        }
    }

    #[async_trait]
    impl MarketData for MockData {
        async fn fetch_bars(
            &self,
            symbol: &str,
            _days: u32,
            _interval: Interval,
            _include_extended_hours: bool,
        ) -> BarSeries {
            self.daily.get(symbol).cloned().unwrap_or_else(BarSeries::empty)
        }

        async fn fetch_relative_volume(&self, _symbol: &str, _lookback_days: u32) -> f64 {
            0.0
        }

        async fn fetch_symbol_universe(
            &self,
            _min_price: f64,
            _max_price: f64,
            _min_volume: f64,
        ) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn planner(market_data: MockData) -> TradePlanner {
        TradePlanner::new(
            PlannerConfig::default(),
            RiskConfig::default(),
            Arc::new(market_data),
        )
    }

    fn opportunity(symbol: &str, price: f64, deviation_pct: f64) -> Opportunity {
        Opportunity {
            symbol: symbol.to_string(),
            score: 50.0,
            price,
            deviation_pct,
            direction: if deviation_pct > 0.0 { Direction::Up } else { Direction::Down },
            relative_volume: None,
            atr_percentage: None,
            strength_percentile: None,
            catalyst: None,
        }
    }

    #[test]
    fn test_position_size_from_risk_budget() {
        // $50 risk / $5 per share = 10 shares; notional 1000 < 2500 cap.
        let p = planner(MockData::empty());
        assert_eq!(p.position_size(100.0, 95.0), 10);
    }

    #[test]
    fn test_position_size_capped_by_account_fraction() {
        // Small account: 25% of $1000 = $250 notional → 2 shares at $100,
        // even though the risk budget alone would allow 10.
        let config = PlannerConfig {
            account_size: 1000.0,
            ..PlannerConfig::default()
        };
        let p = TradePlanner::new(config, RiskConfig::default(), Arc::new(MockData::empty()));
        assert_eq!(p.position_size(100.0, 95.0), 2);
    }

    #[test]
    fn test_position_size_zero_on_degenerate_inputs() {
        let p = planner(MockData::empty());
        assert_eq!(p.position_size(100.0, 100.0), 0); // zero per-share risk
        assert_eq!(p.position_size(0.0, 95.0), 0); // bad entry
    }

    #[tokio::test]
    async fn test_atr_stop_for_long_and_short() {
        // Constant range 2.0 → ATR 2.0 → stop distance 3.0.
        let p = planner(MockData::with_constant_range("X", 100.0, 2.0, 25));
        let long_stop = p.stop_loss("X", 100.0, TradeDirection::Long).await;
        assert!((long_stop - 97.0).abs() < 1e-10);
        let short_stop = p.stop_loss("X", 100.0, TradeDirection::Short).await;
        assert!((short_stop - 103.0).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_percentage_fallback_stop_without_history() {
        let p = planner(MockData::empty());
        let long_stop = p.stop_loss("X", 100.0, TradeDirection::Long).await;
        assert!((long_stop - 97.0).abs() < 1e-10); // 3% fallback
        let short_stop = p.stop_loss("X", 100.0, TradeDirection::Short).await;
        assert!((short_stop - 103.0).abs() < 1e-10);
    }

    #[test]
    fn test_take_profit_is_reward_multiple() {
        let p = planner(MockData::empty());
        // Risk $3, reward 2x → $6.
        assert!((p.take_profit(100.0, 97.0, TradeDirection::Long) - 106.0).abs() < 1e-10);
        assert!((p.take_profit(100.0, 103.0, TradeDirection::Short) - 94.0).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_generate_plan_end_to_end() {
        // ATR 2.0 → stop 97, target 106, 16 shares ($50 / $3 = 16.67),
        // loss $48, profit $96.
        let p = planner(MockData::with_constant_range("X", 100.0, 2.0, 25));
        let plan = p.generate_trade_plan(&opportunity("X", 100.0, 5.0)).await.unwrap();

        assert_eq!(plan.direction, TradeDirection::Long);
        assert!((plan.stop_loss - 97.0).abs() < 1e-10);
        assert!((plan.take_profit - 106.0).abs() < 1e-10);
        assert_eq!(plan.position_size, 16);
        assert!((plan.potential_loss - 48.0).abs() < 1e-10);
        assert!((plan.potential_profit - 96.0).abs() < 1e-10);
        assert!((plan.potential_profit - plan.potential_loss * 2.0).abs() < 1e-10);
    }

    #[tokio::test]
    async fn test_down_move_plans_short() {
        let p = planner(MockData::with_constant_range("X", 100.0, 2.0, 25));
        let plan = p.generate_trade_plan(&opportunity("X", 100.0, -5.0)).await.unwrap();
        assert_eq!(plan.direction, TradeDirection::Short);
        assert!(plan.stop_loss > plan.entry_price);
        assert!(plan.take_profit < plan.entry_price);
    }

    #[tokio::test]
    async fn test_halted_governor_yields_no_plans() {
        let mut p = planner(MockData::with_constant_range("X", 100.0, 2.0, 25));
        let plan = p.generate_trade_plan(&opportunity("X", 100.0, 5.0)).await.unwrap();
        for _ in 0..3 {
            p.record_trade_result(&plan, TradeResult::Loss, -10.0);
        }

        assert!(p.generate_trade_plan(&opportunity("X", 100.0, 5.0)).await.is_none());
        let plans = p.generate_trade_plans(&[opportunity("X", 100.0, 5.0)]).await;
        assert!(plans.is_empty());

        p.reset_daily_stats();
        assert!(p.generate_trade_plan(&opportunity("X", 100.0, 5.0)).await.is_some());
    }

    #[tokio::test]
    async fn test_batch_respects_max_plans() {
        let config = PlannerConfig {
            max_plans: 2,
            ..PlannerConfig::default()
        };
        let p = TradePlanner::new(
            config,
            RiskConfig::default(),
            Arc::new(MockData::with_constant_range("X", 100.0, 2.0, 25)),
        );
        let opportunities = vec![
            opportunity("X", 100.0, 8.0),
            opportunity("X", 100.0, 6.0),
            opportunity("X", 100.0, 5.0),
        ];
        let plans = p.generate_trade_plans(&opportunities).await;
        assert_eq!(plans.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_opportunities_empty_batch() {
        let p = planner(MockData::empty());
        assert!(p.generate_trade_plans(&[]).await.is_empty());
    }
}
