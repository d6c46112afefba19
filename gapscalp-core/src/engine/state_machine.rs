//! Position state transitions.
//!
//! Flat → Open on an accepted entry; Open → Open while no exit trigger fires;
//! Open → Flat (emitting a `Trade`) on the first trigger. Each transition takes
//! the current state by value and returns the next one.

use tracing::{debug, warn};

use crate::config::StrategyConfig;
use crate::domain::{EnrichedBar, ExitReason, OpenPosition, Trade, TradingDay};
use crate::entry::EntrySignal;
use crate::pattern::PatternInput;
use crate::stop_loss::{StopLossPolicy, StopSource};

/// Exit fill produced by `advance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitFill {
    pub reason: ExitReason,
    /// Slippage-adjusted exit price.
    pub price: f64,
    pub time: chrono::NaiveDateTime,
}

/// Outcome of feeding one bar to an open position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    Hold(OpenPosition),
    Exit(OpenPosition, ExitFill),
}

/// Open a position at the entry bar.
///
/// The high watermark starts at the entry bar's high and the trailing stop
/// starts disarmed. Exits are only evaluated from the next bar on.
pub fn open_position(
    bar: &EnrichedBar,
    signal: EntrySignal,
    gap_pct: f64,
    prior_atr: Option<f64>,
    config: &StrategyConfig,
) -> OpenPosition {
    let placement = StopLossPolicy::from_config(config).place(signal.entry_price, prior_atr);
    if placement.source == StopSource::AtrFallback {
        warn!(
            date = %bar.date(),
            entry = signal.entry_price,
            "ATR unavailable, using fixed stop distance"
        );
    }

    let pattern = config.pattern_rules.classify(&PatternInput {
        close: bar.close(),
        vwap: bar.vwap,
        ema5: bar.ema5,
        rsi14: bar.rsi14,
        gap_pct,
    });

    OpenPosition {
        entry_time: bar.timestamp(),
        entry_price: signal.entry_price,
        entry_vwap: signal.entry_vwap,
        stop_price: placement.stop_price,
        applied_stop_pct: placement.applied_stop_pct,
        stop_source: placement.source,
        trail_high: bar.bar.high,
        trail_active: false,
        pattern,
        bars_held: 0,
    }
}

/// Feed one post-entry bar to an open position.
///
/// Updates the high watermark, arms the trailing stop once the watermark
/// clears `entry * (1 + trailing_start_pct)`, then checks exits in priority
/// order: trailing, stop-loss, forced close.
pub fn advance(position: OpenPosition, bar: &EnrichedBar, config: &StrategyConfig) -> Step {
    let trail_high = position.trail_high.max(bar.bar.high);
    let arm_level = position.entry_price * (1.0 + config.trailing_start_pct);
    let next = OpenPosition {
        trail_high,
        trail_active: position.trail_active || trail_high >= arm_level,
        bars_held: position.bars_held + 1,
        ..position
    };

    let slip = 1.0 - config.slippage_pct;
    let low = bar.bar.low;
    let exit = |reason, price: f64| {
        Step::Exit(
            next,
            ExitFill {
                reason,
                price: price * slip,
                time: bar.timestamp(),
            },
        )
    };

    let trail_level = next.trail_level(config.trailing_width_pct);
    if next.trail_active && low <= trail_level {
        return exit(ExitReason::Trailing, trail_level);
    }
    if low <= next.stop_price {
        return exit(ExitReason::StopLoss, next.stop_price);
    }
    if bar.time() >= config.force_close_time {
        return exit(ExitReason::ForceClose, bar.close());
    }
    Step::Hold(next)
}

/// Build the ledger row for a closed position.
pub fn close_trade(ticker: &str, day: &TradingDay, position: &OpenPosition, fill: ExitFill) -> Trade {
    let trade = Trade {
        ticker: ticker.to_string(),
        date: day.date,
        entry_time: position.entry_time,
        entry_price: position.entry_price,
        entry_vwap: position.entry_vwap,
        exit_time: fill.time,
        exit_price: fill.price,
        exit_reason: fill.reason,
        pnl_pct: position.unrealized_pct(fill.price),
        bars_held: position.bars_held,
        pattern: position.pattern,
        gap_pct: day.gap_pct,
        prev_close: day.prev_close,
        day_open: day.day_open,
        applied_stop_pct: position.applied_stop_pct,
        stop_source: position.stop_source,
    };
    debug!(
        ticker,
        date = %day.date,
        reason = %trade.exit_reason,
        pnl_pct = trade.pnl_pct,
        "exit"
    );
    trade
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IntradayBar;
    use crate::pattern::PatternLabel;
    use chrono::NaiveDate;

    fn bar(h: u32, m: u32, high: f64, low: f64, close: f64) -> EnrichedBar {
        let mut e = EnrichedBar::bare(IntradayBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
            open: close,
            high,
            low,
            close,
            volume: 100.0,
        });
        e.vwap = Some(close);
        e
    }

    fn config() -> StrategyConfig {
        StrategyConfig {
            slippage_pct: 0.0,
            ..Default::default()
        }
    }

    fn position(entry: f64) -> OpenPosition {
        OpenPosition {
            entry_time: NaiveDate::from_ymd_opt(2024, 3, 4)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            entry_price: entry,
            entry_vwap: None,
            stop_price: entry * 0.993,
            applied_stop_pct: 0.007,
            stop_source: StopSource::Fixed,
            trail_high: entry,
            trail_active: false,
            pattern: PatternLabel::Other,
            bars_held: 0,
        }
    }

    #[test]
    fn open_position_starts_disarmed_at_entry_high() {
        let b = bar(9, 0, 1002.0, 998.0, 1000.0);
        let signal = EntrySignal {
            entry_price: 1000.0,
            entry_vwap: Some(999.0),
        };
        let pos = open_position(&b, signal, -0.005, None, &config());
        assert_eq!(pos.trail_high, 1002.0);
        assert!(!pos.trail_active);
        assert!((pos.stop_price - 993.0).abs() < 1e-9);
        assert_eq!(pos.bars_held, 0);
    }

    #[test]
    fn hold_updates_watermark_without_arming() {
        match advance(position(1000.0), &bar(9, 5, 1003.0, 999.0, 1002.0), &config()) {
            Step::Hold(p) => {
                assert_eq!(p.trail_high, 1003.0);
                assert!(!p.trail_active);
                assert_eq!(p.bars_held, 1);
            }
            other => panic!("expected hold, got {other:?}"),
        }
    }

    #[test]
    fn arms_at_threshold_and_stays_armed() {
        let cfg = config();
        let p = match advance(position(1000.0), &bar(9, 5, 1006.0, 1004.0, 1004.5), &cfg) {
            Step::Hold(p) => p,
            other => panic!("expected hold, got {other:?}"),
        };
        assert!(p.trail_active);
        // lower high afterwards does not disarm
        match advance(p, &bar(9, 10, 1004.5, 1004.0, 1004.2), &cfg) {
            Step::Hold(p) => assert!(p.trail_active && p.trail_high == 1006.0),
            other => panic!("expected hold, got {other:?}"),
        }
    }

    #[test]
    fn trailing_beats_stop_loss_on_the_same_bar() {
        let mut p = position(1000.0);
        p.trail_high = 1006.0;
        p.trail_active = true;
        match advance(p, &bar(9, 10, 1006.0, 990.0, 995.0), &config()) {
            Step::Exit(_, fill) => assert_eq!(fill.reason, ExitReason::Trailing),
            other => panic!("expected exit, got {other:?}"),
        }
    }

    #[test]
    fn stop_loss_beats_force_close() {
        match advance(position(1000.0), &bar(14, 55, 1000.0, 990.0, 995.0), &config()) {
            Step::Exit(_, fill) => {
                assert_eq!(fill.reason, ExitReason::StopLoss);
                assert!((fill.price - 993.0).abs() < 1e-9);
            }
            other => panic!("expected exit, got {other:?}"),
        }
    }

    #[test]
    fn force_close_at_configured_time() {
        match advance(position(1000.0), &bar(14, 55, 1001.0, 999.0, 1000.5), &config()) {
            Step::Exit(_, fill) => {
                assert_eq!(fill.reason, ExitReason::ForceClose);
                assert_eq!(fill.price, 1000.5);
            }
            other => panic!("expected exit, got {other:?}"),
        }
    }

    #[test]
    fn exit_fills_pay_slippage() {
        let cfg = StrategyConfig {
            slippage_pct: 0.001,
            ..Default::default()
        };
        match advance(position(1000.0), &bar(14, 55, 1001.0, 999.0, 1000.0), &cfg) {
            Step::Exit(_, fill) => assert!((fill.price - 999.0).abs() < 1e-9),
            other => panic!("expected exit, got {other:?}"),
        }
    }
}
