//! Position state for one ticker within one session.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::pattern::PatternLabel;
use crate::stop_loss::StopSource;

/// Long-only position state. A fresh `Flat` starts every session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PositionState {
    Flat,
    Open(OpenPosition),
}

impl PositionState {
    pub fn is_flat(&self) -> bool {
        matches!(self, PositionState::Flat)
    }
}

/// Everything the exit rules need to know about an open position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenPosition {
    pub entry_time: NaiveDateTime,
    /// Slippage-adjusted fill price.
    pub entry_price: f64,
    pub entry_vwap: Option<f64>,
    pub stop_price: f64,
    pub applied_stop_pct: f64,
    pub stop_source: StopSource,
    /// Highest high seen since (and including) the entry bar.
    pub trail_high: f64,
    /// Set once `trail_high` clears the arming threshold; never cleared.
    pub trail_active: bool,
    pub pattern: PatternLabel,
    /// Bars processed after the entry bar.
    pub bars_held: usize,
}

impl OpenPosition {
    /// Trailing exit level implied by the current high watermark.
    pub fn trail_level(&self, trailing_width_pct: f64) -> f64 {
        self.trail_high * (1.0 - trailing_width_pct)
    }

    /// Unrealized return at `price`, as a fraction of entry.
    pub fn unrealized_pct(&self, price: f64) -> f64 {
        (price - self.entry_price) / self.entry_price
    }
}
