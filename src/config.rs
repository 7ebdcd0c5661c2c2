//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs,
//! then converts them into the per-component configs the scanner and
//! planner consume. Every field has a default, so a partial file (or
//! an empty one) still yields a runnable configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::scan::ScanConfig;
use crate::strategy::{PlannerConfig, RiskConfig};
use crate::volatility;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub universe: UniverseSection,
    #[serde(default)]
    pub scanner: ScannerSection,
    #[serde(default)]
    pub risk: RiskSection,
    #[serde(default)]
    pub planner: PlannerSection,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentSection {
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            scan_interval_secs: default_scan_interval(),
        }
    }
}

/// Symbol universe filters.
#[derive(Debug, Deserialize, Clone)]
pub struct UniverseSection {
    #[serde(default = "default_min_price")]
    pub min_price: f64,
    #[serde(default = "default_max_price")]
    pub max_price: f64,
    #[serde(default = "default_min_volume")]
    pub min_volume: f64,
}

impl Default for UniverseSection {
    fn default() -> Self {
        Self {
            min_price: default_min_price(),
            max_price: default_max_price(),
            min_volume: default_min_volume(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerSection {
    #[serde(default = "default_min_deviation_pct")]
    pub min_deviation_pct: f64,
    #[serde(default = "default_true")]
    pub include_premarket: bool,
    #[serde(default = "default_min_relative_volume")]
    pub min_relative_volume: f64,
    #[serde(default = "default_lookback_days")]
    pub volume_lookback_days: u32,
    #[serde(default = "default_lookback_days")]
    pub atr_lookback_days: u32,
    #[serde(default = "default_strength_weeks")]
    pub strength_period_weeks: u32,
    #[serde(default = "default_max_headlines")]
    pub max_headlines: usize,
}

impl Default for ScannerSection {
    fn default() -> Self {
        Self {
            min_deviation_pct: default_min_deviation_pct(),
            include_premarket: true,
            min_relative_volume: default_min_relative_volume(),
            volume_lookback_days: default_lookback_days(),
            atr_lookback_days: default_lookback_days(),
            strength_period_weeks: default_strength_weeks(),
            max_headlines: default_max_headlines(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RiskSection {
    #[serde(default = "default_max_daily_loss")]
    pub max_daily_loss: f64,
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,
}

impl Default for RiskSection {
    fn default() -> Self {
        Self {
            max_daily_loss: default_max_daily_loss(),
            max_consecutive_losses: default_max_consecutive_losses(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PlannerSection {
    #[serde(default = "default_account_size")]
    pub account_size: f64,
    #[serde(default = "default_max_risk_per_trade")]
    pub max_risk_per_trade: f64,
    #[serde(default = "default_risk_reward_ratio")]
    pub risk_reward_ratio: f64,
    #[serde(default = "default_atr_stop_multiplier")]
    pub atr_stop_multiplier: f64,
    #[serde(default = "default_max_position_pct")]
    pub max_position_pct: f64,
    #[serde(default = "default_max_plans")]
    pub max_plans: usize,
}

impl Default for PlannerSection {
    fn default() -> Self {
        Self {
            account_size: default_account_size(),
            max_risk_per_trade: default_max_risk_per_trade(),
            risk_reward_ratio: default_risk_reward_ratio(),
            atr_stop_multiplier: default_atr_stop_multiplier(),
            max_position_pct: default_max_position_pct(),
            max_plans: default_max_plans(),
        }
    }
}

fn default_scan_interval() -> u64 {
    300
}
fn default_min_price() -> f64 {
    5.0
}
fn default_max_price() -> f64 {
    500.0
}
fn default_min_volume() -> f64 {
    500_000.0
}
fn default_min_deviation_pct() -> f64 {
    4.0
}
fn default_true() -> bool {
    true
}
fn default_min_relative_volume() -> f64 {
    1.5
}
fn default_lookback_days() -> u32 {
    20
}
fn default_strength_weeks() -> u32 {
    13
}
fn default_max_headlines() -> usize {
    5
}
fn default_max_daily_loss() -> f64 {
    100.0
}
fn default_max_consecutive_losses() -> u32 {
    3
}
fn default_account_size() -> f64 {
    10_000.0
}
fn default_max_risk_per_trade() -> f64 {
    50.0
}
fn default_risk_reward_ratio() -> f64 {
    2.0
}
fn default_atr_stop_multiplier() -> f64 {
    1.5
}
fn default_max_position_pct() -> f64 {
    0.25
}
fn default_max_plans() -> usize {
    5
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig {
            min_deviation_pct: self.scanner.min_deviation_pct,
            include_premarket: self.scanner.include_premarket,
            min_relative_volume: self.scanner.min_relative_volume,
            volume_lookback_days: self.scanner.volume_lookback_days,
            atr_lookback_days: self.scanner.atr_lookback_days,
            atr_period: volatility::DEFAULT_ATR_PERIOD,
            strength_period_weeks: self.scanner.strength_period_weeks,
            max_headlines: self.scanner.max_headlines,
            ..ScanConfig::default()
        }
    }

    pub fn risk_config(&self) -> RiskConfig {
        RiskConfig {
            max_daily_loss: self.risk.max_daily_loss,
            max_consecutive_losses: self.risk.max_consecutive_losses,
        }
    }

    pub fn planner_config(&self) -> PlannerConfig {
        PlannerConfig {
            account_size: self.planner.account_size,
            max_risk_per_trade: self.planner.max_risk_per_trade,
            risk_reward_ratio: self.planner.risk_reward_ratio,
            atr_stop_multiplier: self.planner.atr_stop_multiplier,
            max_position_pct: self.planner.max_position_pct,
            max_plans: self.planner.max_plans,
            ..PlannerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_yields_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.agent.scan_interval_secs, 300);
        assert_eq!(config.scanner.min_deviation_pct, 4.0);
        assert!(config.scanner.include_premarket);
        assert_eq!(config.universe.min_price, 5.0);
        assert_eq!(config.risk.max_daily_loss, 100.0);
        assert_eq!(config.planner.account_size, 10_000.0);
    }

    #[test]
    fn test_partial_section_overrides() {
        let config: AppConfig = toml::from_str(
            r#"
            [scanner]
            min_deviation_pct = 6.0

            [risk]
            max_consecutive_losses = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.scanner.min_deviation_pct, 6.0);
        // Untouched fields keep defaults, even within touched sections.
        assert_eq!(config.scanner.min_relative_volume, 1.5);
        assert_eq!(config.risk.max_consecutive_losses, 2);
        assert_eq!(config.risk.max_daily_loss, 100.0);
    }

    #[test]
    fn test_component_config_conversion() {
        let config: AppConfig = toml::from_str(
            r#"
            [planner]
            account_size = 25000.0
            risk_reward_ratio = 3.0
            "#,
        )
        .unwrap();
        let planner = config.planner_config();
        assert_eq!(planner.account_size, 25_000.0);
        assert_eq!(planner.risk_reward_ratio, 3.0);
        assert_eq!(planner.max_risk_per_trade, 50.0);

        let scan = config.scan_config();
        assert_eq!(scan.min_deviation_pct, 4.0);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(AppConfig::load("/nonexistent/config.toml").is_err());
    }
}
