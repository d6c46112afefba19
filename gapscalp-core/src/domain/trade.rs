//! Trade: a completed intraday round trip.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pattern::PatternLabel;
use crate::stop_loss::StopSource;

/// Why a position was closed.
///
/// Variants are listed in exit priority order: when several triggers fire on
/// the same bar, the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitReason {
    Trailing,
    StopLoss,
    ForceClose,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::Trailing => "Trailing",
            ExitReason::StopLoss => "StopLoss",
            ExitReason::ForceClose => "ForceClose",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete round-trip trade record: entry → exit within one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    // ── Identification ──
    pub ticker: String,
    pub date: NaiveDate,

    // ── Entry ──
    pub entry_time: NaiveDateTime,
    pub entry_price: f64,
    /// Session VWAP at the entry bar (undefined if no volume had traded yet).
    pub entry_vwap: Option<f64>,

    // ── Exit ──
    pub exit_time: NaiveDateTime,
    pub exit_price: f64,
    pub exit_reason: ExitReason,

    // ── Result ──
    /// `(exit_price - entry_price) / entry_price`.
    pub pnl_pct: f64,
    pub bars_held: usize,

    // ── Context ──
    pub pattern: PatternLabel,
    pub gap_pct: f64,
    pub prev_close: f64,
    pub day_open: f64,
    pub applied_stop_pct: f64,
    pub stop_source: StopSource,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.pnl_pct > 0.0
    }

    /// How far above (positive) or below (negative) the session VWAP the
    /// entry filled, as a fraction of VWAP.
    pub fn vwap_deviation_pct(&self) -> Option<f64> {
        self.entry_vwap
            .filter(|v| *v > 0.0)
            .map(|v| (self.entry_price - v) / v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade() -> Trade {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        Trade {
            ticker: "8267.T".into(),
            date,
            entry_time: date.and_hms_opt(9, 5, 0).unwrap(),
            entry_price: 1000.0,
            entry_vwap: Some(995.0),
            exit_time: date.and_hms_opt(9, 40, 0).unwrap(),
            exit_price: 1004.0,
            exit_reason: ExitReason::Trailing,
            pnl_pct: 0.004,
            bars_held: 7,
            pattern: PatternLabel::Reversal,
            gap_pct: -0.005,
            prev_close: 1005.0,
            day_open: 1000.0,
            applied_stop_pct: 0.007,
            stop_source: StopSource::Fixed,
        }
    }

    #[test]
    fn is_winner() {
        assert!(sample_trade().is_winner());
        let mut losing = sample_trade();
        losing.pnl_pct = 0.0;
        assert!(!losing.is_winner());
    }

    #[test]
    fn vwap_deviation_is_relative_to_vwap() {
        let trade = sample_trade();
        let dev = trade.vwap_deviation_pct().unwrap();
        assert!((dev - 5.0 / 995.0).abs() < 1e-12);
    }

    #[test]
    fn vwap_deviation_undefined_without_vwap() {
        let mut trade = sample_trade();
        trade.entry_vwap = None;
        assert_eq!(trade.vwap_deviation_pct(), None);
    }

    #[test]
    fn exit_reason_display() {
        assert_eq!(ExitReason::StopLoss.to_string(), "StopLoss");
    }

    #[test]
    fn trade_serialization_roundtrip() {
        let trade = sample_trade();
        let json = serde_json::to_string(&trade).unwrap();
        let deser: Trade = serde_json::from_str(&json).unwrap();
        assert_eq!(trade, deser);
    }
}
