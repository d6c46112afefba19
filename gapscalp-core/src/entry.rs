//! Entry rule evaluation: a pure predicate over one enriched bar.
//!
//! An entry is allowed when the position is flat, the bar time is inside the
//! entry window, the day's gap is inside the gap range, and every enabled
//! filter holds. A filter whose indicator is undefined fails closed.
//! Whether a bar passes does not depend on the order filters are checked in;
//! only the reported rejection reason does.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::StrategyConfig;
use crate::domain::{EnrichedBar, PositionState};

/// Accepted entry: slippage-adjusted fill plus the VWAP seen at entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntrySignal {
    pub entry_price: f64,
    pub entry_vwap: Option<f64>,
}

/// First check that blocked an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RejectReason {
    #[error("position already open")]
    PositionOpen,
    #[error("bar outside entry window")]
    OutsideEntryWindow,
    #[error("gap outside configured range")]
    GapOutOfRange,
    #[error("{0} undefined at this bar")]
    Undefined(Filter),
    #[error("{0} condition not met")]
    Failed(Filter),
}

/// The four optional entry filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Filter {
    Vwap,
    Ema,
    Rsi,
    Macd,
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Filter::Vwap => "vwap",
            Filter::Ema => "ema5",
            Filter::Rsi => "rsi14",
            Filter::Macd => "macd_hist",
        })
    }
}

/// Decide whether `bar` opens a position.
pub fn evaluate_entry(
    bar: &EnrichedBar,
    gap_pct: f64,
    position: &PositionState,
    config: &StrategyConfig,
) -> Result<EntrySignal, RejectReason> {
    if !position.is_flat() {
        return Err(RejectReason::PositionOpen);
    }

    let time = bar.time();
    if time < config.entry_start || time > config.entry_end {
        return Err(RejectReason::OutsideEntryWindow);
    }

    if !(config.gap_min <= gap_pct && gap_pct <= config.gap_max) {
        return Err(RejectReason::GapOutOfRange);
    }

    let close = bar.close();
    let filters = &config.filters;

    if filters.use_vwap {
        let vwap = bar.vwap.ok_or(RejectReason::Undefined(Filter::Vwap))?;
        if close <= vwap {
            return Err(RejectReason::Failed(Filter::Vwap));
        }
    }

    if filters.use_ema {
        let ema = bar.ema5.ok_or(RejectReason::Undefined(Filter::Ema))?;
        if close <= ema {
            return Err(RejectReason::Failed(Filter::Ema));
        }
    }

    if filters.use_rsi {
        let (rsi, prev) = bar
            .rsi14
            .zip(bar.rsi14_prev)
            .ok_or(RejectReason::Undefined(Filter::Rsi))?;
        if !(rsi > config.rsi_floor && rsi > prev) {
            return Err(RejectReason::Failed(Filter::Rsi));
        }
    }

    if filters.use_macd {
        let (hist, prev) = bar
            .macd_hist
            .zip(bar.macd_hist_prev)
            .ok_or(RejectReason::Undefined(Filter::Macd))?;
        if hist <= prev {
            return Err(RejectReason::Failed(Filter::Macd));
        }
    }

    Ok(EntrySignal {
        entry_price: close * (1.0 + config.slippage_pct),
        entry_vwap: bar.vwap,
    })
}
