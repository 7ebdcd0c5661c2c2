//! Average True Range (ATR) calculation.
//!
//! ATR is the volatility measure shared by the high-ATR scan and the
//! stop-loss engine: a simple moving average of per-bar true range.

use crate::types::BarSeries;

/// Default rolling window for ATR.
pub const DEFAULT_ATR_PERIOD: usize = 14;

/// Compute the ATR series for a bar series.
///
/// Returns a vector the same length as the input; the first `period - 1`
/// positions are `NaN` because the rolling window is not yet full.
/// Returns an empty vector for an empty series or a zero period — never
/// panics, callers check emptiness.
///
/// True range at step `i` is
/// `max(high - low, |high - prev_close|, |low - prev_close|)`;
/// the first bar has no previous close, so only `high - low`.
pub fn atr(series: &BarSeries, period: usize) -> Vec<f64> {
    if series.is_empty() || period == 0 {
        return Vec::new();
    }

    let bars = &series.bars;
    let mut true_ranges = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let high_low = bar.high - bar.low;
        let tr = if i == 0 {
            high_low
        } else {
            let prev_close = bars[i - 1].close;
            high_low
                .max((bar.high - prev_close).abs())
                .max((bar.low - prev_close).abs())
        };
        true_ranges.push(tr);
    }

    let mut values = Vec::with_capacity(true_ranges.len());
    for i in 0..true_ranges.len() {
        if i + 1 < period {
            values.push(f64::NAN);
        } else {
            let window = &true_ranges[i + 1 - period..=i];
            values.push(window.iter().sum::<f64>() / period as f64);
        }
    }
    values
}

/// The most recent ATR value, or `None` when the series is too short
/// for the window (or empty).
pub fn latest_atr(series: &BarSeries, period: usize) -> Option<f64> {
    atr(series, period).last().copied().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
