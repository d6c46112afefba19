//! TradingDay: one session's bars plus the gap context it opened with.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::bar::EnrichedBar;

/// A single trading session for one ticker.
///
/// Bars are restricted to the configured session window and ordered by time.
/// Assembled once per calendar date; the position state machine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingDay {
    pub date: NaiveDate,
    pub bars: Vec<EnrichedBar>,
    /// Most recent daily close strictly before `date`.
    pub prev_close: f64,
    /// Official opening price for `date`.
    pub day_open: f64,
    /// `(day_open - prev_close) / prev_close`.
    pub gap_pct: f64,
}

impl TradingDay {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
