//! Trade planning and session risk control.

pub mod planner;
pub mod risk;

pub use planner::{PlannerConfig, TradePlanner};
pub use risk::{RiskConfig, RiskGovernor};
