//! Bars: the fundamental market data units.
//!
//! Three shapes flow through the engine:
//! - `IntradayBar`: raw OHLCV for one interval, exchange-local timestamp.
//! - `DailyBar`: raw OHLCV for one trading day (prior close, official open, ATR).
//! - `EnrichedBar`: an intraday bar plus its derived indicators. Built once by
//!   the indicator engine and never mutated afterwards.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Read access to OHLCV fields shared by intraday and daily bars.
///
/// Indicators are written against this trait so the same EMA / ATR code
/// runs over either granularity.
pub trait PriceBar {
    fn open(&self) -> f64;
    fn high(&self) -> f64;
    fn low(&self) -> f64;
    fn close(&self) -> f64;
    fn volume(&self) -> f64;
    /// Calendar date of the trading session this bar belongs to.
    fn session_date(&self) -> NaiveDate;
}

/// OHLCV bar for one intraday interval.
///
/// Timestamps are already normalized to the exchange's local clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IntradayBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl IntradayBar {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.timestamp.time()
    }

    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLCV sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() || self.volume.is_nan() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.volume >= 0.0
    }

    /// Typical price `(high + low + close) / 3`, the VWAP weighting basis.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }
}

impl PriceBar for IntradayBar {
    fn open(&self) -> f64 {
        self.open
    }
    fn high(&self) -> f64 {
        self.high
    }
    fn low(&self) -> f64 {
        self.low
    }
    fn close(&self) -> f64 {
        self.close
    }
    fn volume(&self) -> f64 {
        self.volume
    }
    fn session_date(&self) -> NaiveDate {
        self.date()
    }
}

/// OHLCV bar for one trading day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl PriceBar for DailyBar {
    fn open(&self) -> f64 {
        self.open
    }
    fn high(&self) -> f64 {
        self.high
    }
    fn low(&self) -> f64 {
        self.low
    }
    fn close(&self) -> f64 {
        self.close
    }
    fn volume(&self) -> f64 {
        self.volume
    }
    fn session_date(&self) -> NaiveDate {
        self.date
    }
}

/// Intraday bar plus the indicators the entry rules read.
///
/// `None` means the indicator is undefined at this bar (warmup, or no
/// session volume yet for VWAP). Undefined never degrades to zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBar {
    pub bar: IntradayBar,
    pub ema5: Option<f64>,
    pub rsi14: Option<f64>,
    pub rsi14_prev: Option<f64>,
    pub macd_hist: Option<f64>,
    pub macd_hist_prev: Option<f64>,
    pub vwap: Option<f64>,
}

impl EnrichedBar {
    /// A bar with every indicator undefined.
    pub fn bare(bar: IntradayBar) -> Self {
        Self {
            bar,
            ema5: None,
            rsi14: None,
            rsi14_prev: None,
            macd_hist: None,
            macd_hist_prev: None,
            vwap: None,
        }
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.bar.timestamp
    }

    pub fn time(&self) -> NaiveTime {
        self.bar.time()
    }

    pub fn date(&self) -> NaiveDate {
        self.bar.date()
    }

    pub fn open(&self) -> f64 {
        self.bar.open
    }

    pub fn high(&self) -> f64 {
        self.bar.high
    }

    pub fn low(&self) -> f64 {
        self.bar.low
    }

    pub fn close(&self) -> f64 {
        self.bar.close
    }
}

/// Map the NaN warmup convention of indicator series onto `Option`.
pub fn defined(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}
