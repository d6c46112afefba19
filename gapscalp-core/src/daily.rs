//! Daily bar history: as-of lookups for prior close, official open, and ATR.
//!
//! Every lookup for a date `d` only sees daily bars strictly before `d`
//! (except `open_on`, which is the open of `d` itself). Weekends and holidays
//! need no special handling: "prior" means the most recent bar in the
//! series, not the previous calendar day.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{defined, DailyBar};
use crate::indicators::{Atr, Indicator};

/// Indexed daily series for one ticker.
#[derive(Debug, Clone, Default)]
pub struct DailyHistory {
    bars: BTreeMap<NaiveDate, DailyBar>,
    /// ATR as of the close of each date (not yet shifted).
    atr: BTreeMap<NaiveDate, f64>,
}

impl DailyHistory {
    /// Index `bars` by date. Duplicate dates keep the last occurrence.
    pub fn new(bars: &[DailyBar], atr_period: usize) -> Self {
        let bars: BTreeMap<NaiveDate, DailyBar> = bars.iter().map(|b| (b.date, *b)).collect();

        let ordered: Vec<DailyBar> = bars.values().copied().collect();
        let atr = Atr::new(atr_period.max(1))
            .compute(&ordered)
            .into_iter()
            .zip(&ordered)
            .filter_map(|(v, b)| defined(v).map(|v| (b.date, v)))
            .collect();

        Self { bars, atr }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Close of the most recent daily bar strictly before `date`.
    pub fn prev_close(&self, date: NaiveDate) -> Option<f64> {
        self.bars
            .range(..date)
            .next_back()
            .map(|(_, bar)| bar.close)
            .filter(|c| c.is_finite())
    }

    /// Official opening price on `date`, if the daily series has that date.
    pub fn open_on(&self, date: NaiveDate) -> Option<f64> {
        self.bars
            .get(&date)
            .map(|bar| bar.open)
            .filter(|o| o.is_finite())
    }

    /// ATR known before the open of `date`: the value computed at the most
    /// recent daily bar strictly before it. `None` while ATR is still warming
    /// up at that point.
    pub fn prior_atr(&self, date: NaiveDate) -> Option<f64> {
        let (prior_date, _) = self.bars.range(..date).next_back()?;
        self.atr.get(prior_date).copied()
    }
}
