//! GAPSCOUT — Intraday Equity Scan-and-Score Pipeline
//!
//! Entry point. Loads configuration, initialises structured logging,
//! and runs the scan→rank→plan loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use gapscout::config::AppConfig;
use gapscout::data::yahoo::YahooClient;
use gapscout::scan::Scanner;
use gapscout::strategy::TradePlanner;
use gapscout::types::ScanReport;

const BANNER: &str = r#"
  ____    _    ____  ____   ____ ___  _   _ _____
 / ___|  / \  |  _ \/ ___| / ___/ _ \| | | |_   _|
| |  _  / _ \ | |_) \___ \| |  | | | | | | | | |
| |_| |/ ___ \|  __/ ___) | |__| |_| | |_| | | |
 \____/_/   \_\_|  |____/ \____\___/ \___/  |_|

  Intraday Scan-and-Score Pipeline
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    // Missing config is fine: every section has defaults.
    let cfg = match AppConfig::load("config.toml") {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(error = %e, "Config not loaded — using defaults");
            AppConfig::default()
        }
    };

    println!("{BANNER}");
    info!(
        scan_interval_secs = cfg.agent.scan_interval_secs,
        min_deviation_pct = cfg.scanner.min_deviation_pct,
        account_size = cfg.planner.account_size,
        "GAPSCOUT starting up"
    );

    // -- Initialise components -------------------------------------------

    let yahoo = Arc::new(YahooClient::new()?);
    let scanner = Scanner::new(yahoo.clone(), yahoo.clone(), cfg.scan_config());
    let planner = TradePlanner::new(cfg.planner_config(), cfg.risk_config(), yahoo);

    // -- Main loop -------------------------------------------------------

    let scan_interval = Duration::from_secs(cfg.agent.scan_interval_secs);
    let mut interval = tokio::time::interval(scan_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.agent.scan_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let report = scanner
                    .run_comprehensive_scan(
                        cfg.universe.min_price,
                        cfg.universe.max_price,
                        cfg.universe.min_volume,
                    )
                    .await;
                log_scan_report(&report);

                if report.opportunities.is_empty() {
                    continue;
                }

                let plans = planner.generate_trade_plans(&report.opportunities).await;
                for plan in &plans {
                    info!("{plan}");
                }
                info!("{}", planner.get_trading_summary());
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("{}", planner.get_trading_summary());
    info!("GAPSCOUT shut down cleanly.");

    Ok(())
}

/// Log a human-readable cycle summary.
fn log_scan_report(report: &ScanReport) {
    if let Some(error) = &report.error {
        warn!(error = %error, "Scan cycle failed");
        return;
    }
    info!(
        universe = report.universe_size,
        deviations = report.deviation_results.len(),
        volume = report.volume_results.len(),
        atr = report.atr_results.len(),
        strength = report.strength_results.len(),
        catalysts = report.catalyst_results.len(),
        opportunities = report.opportunities.len(),
        "Scan cycle complete"
    );
    for opportunity in report.opportunities.iter().take(5) {
        info!("{opportunity}");
    }
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gapscout=info"));

    let json_logging = std::env::var("GAPSCOUT_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
