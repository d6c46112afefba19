//! GapScalp Core: intraday gap-scalp decision engine.
//!
//! This crate replays one ticker's intraday bars and decides, bar by bar,
//! whether the morning gap rule opens and closes a long position:
//! - Domain types (intraday/daily/enriched bars, trading days, positions, trades)
//! - Look-ahead-free indicators (EMA, RSI, MACD histogram, session VWAP, ATR)
//! - Gap analysis against the prior daily close
//! - Entry filters and stop-loss placement
//! - A per-day position state machine with prioritized exits
//! - Versioned entry pattern classification and the trade/skip ledger

pub mod config;
pub mod daily;
pub mod domain;
pub mod engine;
pub mod enrich;
pub mod entry;
pub mod gap;
pub mod indicators;
pub mod pattern;
pub mod recorder;
pub mod session;
pub mod stop_loss;

pub use config::{ConfigError, FilterToggles, StrategyConfig};
pub use domain::{
    DailyBar, EnrichedBar, ExitReason, IntradayBar, OpenPosition, PositionState, Trade,
    TradingDay,
};
pub use engine::{simulate_day, simulate_ticker, DayOutcome, TickerRun};
pub use pattern::{PatternLabel, PatternRuleSet};
pub use recorder::{Skip, SkipReason, TradeRecorder};
pub use stop_loss::StopSource;
