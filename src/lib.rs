//! GAPSCOUT — Intraday Equity Scan-and-Score Pipeline
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod data;
pub mod volatility;
pub mod scan;
pub mod strategy;
