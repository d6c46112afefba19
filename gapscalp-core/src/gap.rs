//! Opening gap classification.
//!
//! gap = (day_open - prev_close) / prev_close, where prev_close is the most
//! recent daily close strictly before the session date and day_open is the
//! official open of the session. A day with either side missing is not
//! simulated.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::daily::DailyHistory;
use crate::recorder::SkipReason;

/// Gap context of one session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub prev_close: f64,
    pub day_open: f64,
    pub gap_pct: f64,
}

impl Gap {
    pub fn is_gap_down(&self) -> bool {
        self.gap_pct < 0.0
    }
}

/// Compute the gap for `date`.
///
/// `first_bar_open` is the open of the first in-session intraday bar. It is
/// used when the daily series has no bar for `date` yet.
pub fn analyze_gap(
    date: NaiveDate,
    history: &DailyHistory,
    first_bar_open: Option<f64>,
) -> Result<Gap, SkipReason> {
    let prev_close = history.prev_close(date).ok_or(SkipReason::NoPriorClose)?;
    if prev_close <= 0.0 {
        return Err(SkipReason::InvalidPriorClose(prev_close));
    }

    let day_open = history
        .open_on(date)
        .or(first_bar_open.filter(|o| o.is_finite()))
        .ok_or(SkipReason::NoDayOpen)?;

    Ok(Gap {
        prev_close,
        day_open,
        gap_pct: (day_open - prev_close) / prev_close,
    })
}
