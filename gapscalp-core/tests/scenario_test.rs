//! Scenario tests for the day scan: exit priority, gap skips, open-at-close,
//! first-bar entries and pattern labels.

use chrono::{NaiveDate, NaiveDateTime};
use gapscalp_core::config::{FilterToggles, StrategyConfig};
use gapscalp_core::domain::{DailyBar, EnrichedBar, ExitReason, IntradayBar, TradingDay};
use gapscalp_core::engine::{simulate_day, simulate_ticker, DayOutcome};
use gapscalp_core::pattern::{PatternLabel, PatternRuleSet};
use gapscalp_core::recorder::{Skip, SkipReason};
use gapscalp_core::stop_loss::StopSource;

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    date(day).and_hms_opt(h, m, 0).unwrap()
}

fn raw(day: u32, h: u32, m: u32, high: f64, low: f64, close: f64) -> IntradayBar {
    IntradayBar {
        timestamp: at(day, h, m),
        open: close,
        high,
        low,
        close,
        volume: 1000.0,
    }
}

fn enriched(h: u32, m: u32, high: f64, low: f64, close: f64) -> EnrichedBar {
    EnrichedBar::bare(raw(4, h, m, high, low, close))
}

fn trading_day(gap_pct: f64, bars: Vec<EnrichedBar>) -> TradingDay {
    TradingDay {
        date: date(4),
        bars,
        prev_close: 1000.0 / (1.0 + gap_pct),
        day_open: 1000.0,
        gap_pct,
    }
}

/// Filters off, no slippage, fixed stop.
fn plain_config() -> StrategyConfig {
    StrategyConfig {
        filters: FilterToggles::none(),
        slippage_pct: 0.0,
        trailing_start_pct: 0.005,
        trailing_width_pct: 0.002,
        stop_loss_pct_fixed: -0.007,
        ..Default::default()
    }
}

fn daily(day: u32, open: f64, close: f64) -> DailyBar {
    DailyBar {
        date: date(day),
        open,
        high: open.max(close) + 5.0,
        low: open.min(close) - 5.0,
        close,
        volume: 1e6,
    }
}

#[test]
fn trailing_exit_wins_over_stop_loss() {
    let day = trading_day(
        -0.005,
        vec![
            enriched(9, 0, 1000.5, 999.5, 1000.0),
            // arms: 1006 >= 1000 * 1.005
            enriched(9, 5, 1006.0, 1004.5, 1005.0),
            // 1003.5 <= 1006 * 0.998
            enriched(9, 10, 1004.0, 1003.5, 1003.8),
        ],
    );

    let trade = match simulate_day("7203.T", &day, &plain_config(), None) {
        DayOutcome::Closed(t) => t,
        other => panic!("expected a closed trade, got {other:?}"),
    };
    assert_eq!(trade.exit_reason, ExitReason::Trailing);
    assert!((trade.exit_price - 1006.0 * 0.998).abs() < 1e-9);
    assert_eq!(trade.exit_time, at(4, 9, 10));
    assert_eq!(trade.bars_held, 2);
}

#[test]
fn trailing_exit_wins_even_when_low_breaks_the_stop() {
    let day = trading_day(
        -0.005,
        vec![
            enriched(9, 0, 1000.5, 999.5, 1000.0),
            enriched(9, 5, 1006.0, 1004.5, 1005.0),
            enriched(9, 10, 1004.0, 980.0, 985.0),
        ],
    );
    let outcome = simulate_day("7203.T", &day, &plain_config(), None);
    assert_eq!(outcome.trade().map(|t| t.exit_reason), Some(ExitReason::Trailing));
}

#[test]
fn first_in_window_bar_enters_with_filters_off() {
    let day = trading_day(
        0.0,
        vec![
            enriched(9, 0, 1001.0, 999.0, 1000.0),
            enriched(9, 5, 1002.0, 999.0, 1001.0),
        ],
    );
    let config = StrategyConfig {
        entry_start: chrono::NaiveTime::from_hms_opt(9, 5, 0).unwrap(),
        ..plain_config()
    };
    match simulate_day("T", &day, &config, None) {
        DayOutcome::OpenAtClose(p) => {
            assert_eq!(p.entry_time, at(4, 9, 5));
            assert_eq!(p.entry_price, 1001.0);
        }
        other => panic!("expected an open position, got {other:?}"),
    }
}

#[test]
fn no_forced_exit_when_bars_end_early() {
    let day = trading_day(
        0.0,
        vec![
            enriched(9, 0, 1001.0, 999.0, 1000.0),
            enriched(9, 5, 1002.0, 999.0, 1001.0),
            enriched(11, 30, 1003.0, 998.0, 1000.0),
        ],
    );
    let outcome = simulate_day("T", &day, &plain_config(), None);
    assert!(matches!(outcome, DayOutcome::OpenAtClose(_)));
    assert!(outcome.trade().is_none());
}

#[test]
fn gap_down_above_vwap_is_labelled_reversal() {
    let mut entry = enriched(9, 0, 1001.0, 999.0, 1000.0);
    entry.vwap = Some(998.0);
    let day = trading_day(-0.005, vec![entry, enriched(14, 55, 1001.0, 999.0, 1000.0)]);

    let trade = simulate_day("T", &day, &plain_config(), None)
        .trade()
        .cloned()
        .unwrap();
    assert_eq!(trade.pattern, PatternLabel::Reversal);
    assert_eq!(trade.exit_reason, ExitReason::ForceClose);
    assert_eq!(trade.entry_vwap, Some(998.0));
}

#[test]
fn alternate_rule_set_changes_only_the_label() {
    let mut entry = enriched(9, 0, 1001.0, 999.0, 1000.0);
    entry.vwap = Some(998.0);
    entry.rsi14 = Some(80.0);
    let day = trading_day(-0.005, vec![entry, enriched(14, 55, 1001.0, 999.0, 1000.0)]);

    let v1 = simulate_day("T", &day, &plain_config(), None);
    let config = StrategyConfig {
        pattern_rules: PatternRuleSet::RsiMomentumV2,
        ..plain_config()
    };
    let v2 = simulate_day("T", &day, &config, None);

    let (t1, t2) = (v1.trade().unwrap(), v2.trade().unwrap());
    assert_eq!(t1.pattern, PatternLabel::Reversal);
    assert_eq!(t2.pattern, PatternLabel::Breakout);
    assert_eq!(t1.exit_price, t2.exit_price);
}

#[test]
fn slippage_moves_fills_against_the_trade() {
    let day = trading_day(
        0.0,
        vec![
            enriched(9, 0, 1001.0, 999.0, 1000.0),
            enriched(14, 55, 1001.0, 999.0, 1000.0),
        ],
    );
    let config = StrategyConfig {
        slippage_pct: 0.001,
        ..plain_config()
    };
    let trade = simulate_day("T", &day, &config, None).trade().cloned().unwrap();
    assert!(trade.entry_price > 1000.0);
    assert!(trade.exit_price < 1000.0);
    let expected = (trade.exit_price - trade.entry_price) / trade.entry_price;
    assert!((trade.pnl_pct - expected).abs() < 1e-12);
}

#[test]
fn atr_stop_uses_prior_day_volatility() {
    let day = trading_day(
        0.0,
        vec![
            enriched(9, 0, 1001.0, 999.0, 1000.0),
            // 1000 - 20 * 1.5 = 970; this low stays above it
            enriched(9, 5, 1001.0, 975.0, 980.0),
            enriched(9, 10, 1001.0, 969.0, 975.0),
        ],
    );
    let config = StrategyConfig {
        use_atr_stop: true,
        atr_multiplier: 1.5,
        ..plain_config()
    };
    let trade = simulate_day("T", &day, &config, Some(20.0)).trade().cloned().unwrap();
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert_eq!(trade.stop_source, StopSource::Atr);
    assert!((trade.applied_stop_pct - 0.03).abs() < 1e-12);
    assert!((trade.exit_price - 970.0).abs() < 1e-9);
}

#[test]
fn atr_fallback_is_recorded_on_the_trade() {
    let day = trading_day(
        0.0,
        vec![
            enriched(9, 0, 1001.0, 999.0, 1000.0),
            enriched(9, 5, 1001.0, 990.0, 991.0),
        ],
    );
    let config = StrategyConfig {
        use_atr_stop: true,
        ..plain_config()
    };
    let trade = simulate_day("T", &day, &config, None).trade().cloned().unwrap();
    assert_eq!(trade.stop_source, StopSource::AtrFallback);
    assert!((trade.applied_stop_pct - 0.007).abs() < 1e-12);
}

#[test]
fn date_without_prior_close_is_skipped_quietly() {
    // Daily series starts on the 5th, so the 4th has no prior close.
    let intraday = vec![
        raw(4, 9, 0, 1001.0, 999.0, 1000.0),
        raw(4, 14, 55, 1001.0, 999.0, 1000.0),
        raw(6, 9, 0, 1001.0, 999.0, 1000.0),
        raw(6, 14, 55, 1001.0, 999.0, 1000.0),
    ];
    let daily = vec![daily(5, 1000.0, 1000.0), daily(6, 1000.0, 1000.0)];

    let run = simulate_ticker("T", &intraday, &daily, &plain_config());
    assert_eq!(run.skips, vec![Skip::day("T", date(4), SkipReason::NoPriorClose)]);
    assert_eq!(run.days_simulated, 1);
    assert_eq!(run.trades.len(), 1);
    assert_eq!(run.trades[0].date, date(6));
}

#[test]
fn prior_close_lookup_skips_non_trading_days() {
    // Friday close, Monday session: the gap is measured against Friday.
    let intraday = vec![
        raw(11, 9, 0, 981.0, 979.0, 980.0),
        raw(11, 14, 55, 981.0, 979.0, 980.0),
    ];
    let daily = vec![daily(8, 990.0, 1000.0), daily(11, 985.0, 980.0)];

    let run = simulate_ticker("T", &intraday, &daily, &plain_config());
    let trade = &run.trades[0];
    assert_eq!(trade.prev_close, 1000.0);
    assert_eq!(trade.day_open, 985.0);
    assert!((trade.gap_pct - (-0.015)).abs() < 1e-12);
}

#[test]
fn one_trade_per_day_at_most() {
    let intraday: Vec<IntradayBar> = [
        (9, 0, 1000.0),
        (9, 5, 990.0),
        (9, 10, 1000.0),
        (9, 15, 1000.0),
        (14, 55, 1000.0),
    ]
    .iter()
    .map(|&(h, m, c)| raw(4, h, m, c + 1.0, c - 1.0, c))
    .collect();
    let daily = vec![daily(1, 1000.0, 1000.0)];

    let run = simulate_ticker("T", &intraday, &daily, &plain_config());
    assert_eq!(run.trades.len(), 1);
    assert_eq!(run.trades[0].exit_reason, ExitReason::StopLoss);
}

#[test]
fn simulation_is_deterministic() {
    let intraday: Vec<IntradayBar> = (0..60)
        .map(|i| {
            let c = 1000.0 + (i as f64 * 0.9).sin() * 6.0;
            let t = at(4, 9, 0) + chrono::Duration::minutes(5 * i);
            IntradayBar {
                timestamp: t,
                open: c - 0.5,
                high: c + 2.0,
                low: c - 2.0,
                close: c,
                volume: 100.0 + i as f64,
            }
        })
        .collect();
    let daily = vec![daily(1, 1000.0, 1002.0)];
    let config = plain_config();

    let a = simulate_ticker("T", &intraday, &daily, &config);
    let b = simulate_ticker("T", &intraday, &daily, &config);
    assert_eq!(a, b);
}
