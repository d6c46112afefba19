//! Indicator trait and concrete indicator implementations.
//!
//! Indicators are pure functions: bar history in, numeric series out.
//! They are computed once per ticker before the day scan; no recomputation
//! on each bar. Warmup values are `f64::NAN` and are mapped to `None` when
//! attached to an `EnrichedBar`.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod smooth;
pub mod vwap;

pub use atr::Atr;
pub use ema::Ema;
pub use macd::MacdHistogram;
pub use rsi::Rsi;
pub use vwap::SessionVwap;

use crate::domain::IntradayBar;

/// Trait for indicators over a bar type `B`.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. The first `lookback()` values are `f64::NAN` (warmup).
///
/// # Look-ahead contamination guard
/// No indicator value at bar t may depend on price data from bar t+1 or later.
/// Every indicator must pass the truncated-vs-full series test.
pub trait Indicator<B = IntradayBar>: Send + Sync {
    /// Human-readable name (e.g., "ema_5", "atr_14").
    fn name(&self) -> &str;

    /// Number of leading bars that are undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[B]) -> Vec<f64>;
}

/// Value of a series one bar earlier (`NaN` at index 0).
pub fn shift_one(values: &[f64]) -> Vec<f64> {
    std::iter::once(f64::NAN)
        .chain(values.iter().copied())
        .take(values.len())
        .collect()
}

/// Create synthetic intraday bars from close prices for testing.
///
/// One bar every 5 minutes from 09:00 on a single date. open = prev close,
/// high/low = max/min(open, close) ± 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<IntradayBar> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            IntradayBar {
                timestamp: start + chrono::Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Single intraday bar at `hh:mm` on `date` with open == close.
#[cfg(test)]
pub fn intraday_bar(
    date: chrono::NaiveDate,
    hour: u32,
    minute: u32,
    high: f64,
    low: f64,
    close: f64,
    volume: f64,
) -> IntradayBar {
    IntradayBar {
        timestamp: date.and_hms_opt(hour, minute, 0).unwrap(),
        open: close,
        high,
        low,
        close,
        volume,
    }
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
