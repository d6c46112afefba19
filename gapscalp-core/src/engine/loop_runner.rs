//! Day scan and per-ticker simulation.
//!
//! `simulate_day` is a left fold over one session's bars with the position
//! state as accumulator. The fold breaks at the first exit, so a day yields at
//! most one trade. `simulate_ticker` enriches the ticker's full intraday series
//! once, assembles trading days, and scans each day with a fresh `Flat` state.

use std::borrow::Cow;
use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::StrategyConfig;
use crate::daily::DailyHistory;
use crate::domain::{DailyBar, IntradayBar, OpenPosition, PositionState, Trade, TradingDay};
use crate::enrich::IndicatorEngine;
use crate::entry::evaluate_entry;
use crate::recorder::{Skip, SkipReason};
use crate::session::assemble_days;

use super::state_machine::{advance, close_trade, open_position, Step};

/// Result of scanning one trading day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    /// No bar passed the entry rules.
    NoEntry,
    Closed(Trade),
    /// Bars ran out while open and no exit fired. No trade is emitted.
    OpenAtClose(OpenPosition),
}

impl DayOutcome {
    pub fn trade(&self) -> Option<&Trade> {
        match self {
            DayOutcome::Closed(t) => Some(t),
            _ => None,
        }
    }
}

/// Everything one ticker produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickerRun {
    pub ticker: String,
    /// At most one per date, in date order.
    pub trades: Vec<Trade>,
    pub skips: Vec<Skip>,
    /// Dates whose position was still open when the session's bars ran out.
    pub open_at_close: Vec<chrono::NaiveDate>,
    pub days_simulated: usize,
}

impl TickerRun {
    pub fn skipped(ticker: impl Into<String>, reason: SkipReason) -> Self {
        let ticker = ticker.into();
        Self {
            skips: vec![Skip::ticker(ticker.clone(), reason)],
            ticker,
            ..Default::default()
        }
    }
}

/// Scan one trading day for at most one round trip.
pub fn simulate_day(
    ticker: &str,
    day: &TradingDay,
    config: &StrategyConfig,
    prior_atr: Option<f64>,
) -> DayOutcome {
    let scan = day
        .bars
        .iter()
        .try_fold(PositionState::Flat, |state, bar| match state {
            PositionState::Flat => {
                match evaluate_entry(bar, day.gap_pct, &state, config) {
                    Ok(signal) => {
                        let position = open_position(bar, signal, day.gap_pct, prior_atr, config);
                        debug!(
                            ticker,
                            time = %bar.timestamp(),
                            entry = position.entry_price,
                            pattern = %position.pattern,
                            "entry"
                        );
                        ControlFlow::Continue(PositionState::Open(position))
                    }
                    Err(_) => ControlFlow::Continue(PositionState::Flat),
                }
            }
            PositionState::Open(position) => match advance(position, bar, config) {
                Step::Hold(next) => ControlFlow::Continue(PositionState::Open(next)),
                Step::Exit(closed, fill) => ControlFlow::Break(close_trade(ticker, day, &closed, fill)),
            },
        });

    match scan {
        ControlFlow::Break(trade) => DayOutcome::Closed(trade),
        ControlFlow::Continue(PositionState::Flat) => DayOutcome::NoEntry,
        ControlFlow::Continue(PositionState::Open(position)) => DayOutcome::OpenAtClose(position),
    }
}

/// Simulate every trading day of one ticker.
///
/// Bars may arrive in any order: `intraday` is sorted by timestamp before
/// enrichment when it is not already ascending, and `daily` is keyed by date.
/// The config is assumed to have passed `StrategyConfig::validate`.
pub fn simulate_ticker(
    ticker: &str,
    intraday: &[IntradayBar],
    daily: &[DailyBar],
    config: &StrategyConfig,
) -> TickerRun {
    if intraday.is_empty() {
        warn!(ticker, "no intraday bars, skipping ticker");
        return TickerRun::skipped(ticker, SkipReason::NoIntradayBars);
    }

    let intraday: Cow<'_, [IntradayBar]> =
        if intraday.windows(2).all(|w| w[0].timestamp <= w[1].timestamp) {
            Cow::Borrowed(intraday)
        } else {
            debug!(ticker, "intraday bars out of order, sorting");
            let mut sorted = intraday.to_vec();
            sorted.sort_by_key(|b| b.timestamp);
            Cow::Owned(sorted)
        };

    let enriched = IndicatorEngine::new(config.session).enrich(&intraday);
    let history = DailyHistory::new(daily, config.atr_period);

    let mut run = TickerRun {
        ticker: ticker.to_string(),
        ..Default::default()
    };

    for assembled in assemble_days(&enriched, &history, &config.session) {
        let day = match assembled {
            Ok(day) => day,
            Err((date, reason)) => {
                warn!(ticker, %date, %reason, "skipping day");
                run.skips.push(Skip::day(ticker, date, reason));
                continue;
            }
        };

        run.days_simulated += 1;
        match simulate_day(ticker, &day, config, history.prior_atr(day.date)) {
            DayOutcome::Closed(trade) => run.trades.push(trade),
            DayOutcome::OpenAtClose(_) => {
                debug!(ticker, date = %day.date, "position still open at end of bars");
                run.open_at_close.push(day.date);
            }
            DayOutcome::NoEntry => {}
        }
    }

    info!(
        ticker,
        days = run.days_simulated,
        trades = run.trades.len(),
        skipped = run.skips.len(),
        "ticker simulated"
    );
    run
}
