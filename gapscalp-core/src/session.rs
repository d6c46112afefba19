//! Session window and trading-day assembly.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::config::hhmm;
use crate::daily::DailyHistory;
use crate::domain::{EnrichedBar, TradingDay};
use crate::gap::analyze_gap;
use crate::recorder::SkipReason;

/// Inclusive wall-clock window of the regular session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionWindow {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl SessionWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

impl Default for SessionWindow {
    /// 09:00–15:00.
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
            end: NaiveTime::from_hms_opt(15, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Group time-ordered enriched bars into trading days.
///
/// Each calendar date present in `bars` yields exactly one entry, in date
/// order: either an assembled `TradingDay` (in-window bars plus gap context)
/// or the reason the date cannot be simulated.
pub fn assemble_days(
    bars: &[EnrichedBar],
    history: &DailyHistory,
    window: &SessionWindow,
) -> Vec<Result<TradingDay, (NaiveDate, SkipReason)>> {
    bars.chunk_by(|a, b| a.date() == b.date())
        .map(|chunk| {
            let date = chunk[0].date();
            let session: Vec<EnrichedBar> = chunk
                .iter()
                .filter(|b| window.contains(b.time()))
                .copied()
                .collect();

            if session.is_empty() {
                return Err((date, SkipReason::NoSessionBars));
            }

            let gap = analyze_gap(date, history, session.first().map(|b| b.open()))
                .map_err(|reason| (date, reason))?;

            Ok(TradingDay {
                date,
                bars: session,
                prev_close: gap.prev_close,
                day_open: gap.day_open,
                gap_pct: gap.gap_pct,
            })
        })
        .collect()
}
