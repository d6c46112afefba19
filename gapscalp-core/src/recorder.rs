//! Trade ledger plus the record of what was skipped and why.
//!
//! Trades keep ticker grouping in the order tickers were recorded, and
//! chronological order within a ticker.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Trade;
use crate::engine::TickerRun;

/// Why a ticker or a single day produced no simulation.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub enum SkipReason {
    #[error("no intraday bars")]
    NoIntradayBars,
    #[error("no bars inside the session window")]
    NoSessionBars,
    #[error("no daily close before this date")]
    NoPriorClose,
    #[error("prior close {0} is not positive")]
    InvalidPriorClose(f64),
    #[error("no opening price for this date")]
    NoDayOpen,
    #[error("failed to load bars: {0}")]
    LoadFailed(String),
    #[error("batch deadline passed before the ticker started")]
    Timeout,
}

/// One skipped ticker (`date == None`) or ticker-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Skip {
    pub ticker: String,
    pub date: Option<NaiveDate>,
    pub reason: SkipReason,
}

impl Skip {
    pub fn ticker(ticker: impl Into<String>, reason: SkipReason) -> Self {
        Self {
            ticker: ticker.into(),
            date: None,
            reason,
        }
    }

    pub fn day(ticker: impl Into<String>, date: NaiveDate, reason: SkipReason) -> Self {
        Self {
            ticker: ticker.into(),
            date: Some(date),
            reason,
        }
    }
}

/// Accumulates per-ticker results into one ordered ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TradeRecorder {
    trades: Vec<Trade>,
    skips: Vec<Skip>,
}

impl TradeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one ticker's results.
    pub fn record_ticker(&mut self, run: TickerRun) {
        self.trades.extend(run.trades);
        self.skips.extend(run.skips);
    }

    pub fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    pub fn record_skip(&mut self, skip: Skip) {
        self.skips.push(skip);
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn skips(&self) -> &[Skip] {
        &self.skips
    }

    /// Contiguous per-ticker slices of the ledger, in recording order.
    pub fn by_ticker(&self) -> impl Iterator<Item = (&str, &[Trade])> {
        self.trades
            .chunk_by(|a, b| a.ticker == b.ticker)
            .map(|chunk| (chunk[0].ticker.as_str(), chunk))
    }

    pub fn into_parts(self) -> (Vec<Trade>, Vec<Skip>) {
        (self.trades, self.skips)
    }
}
