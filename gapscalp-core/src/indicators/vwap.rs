//! Session VWAP.
//!
//! VWAP = cumulative(typical price * volume) / cumulative(volume), where
//! typical price = (high + low + close) / 3.
//!
//! Accumulation restarts at the first in-window bar of every calendar date and
//! only bars inside the session window contribute. Bars outside the window are
//! NaN. Until the session has traded any volume the value is NaN; after that a
//! zero-volume bar carries the previous value forward (the cumulative sums do
//! not move).

use super::Indicator;
use crate::domain::IntradayBar;
use crate::session::SessionWindow;

#[derive(Debug, Clone)]
pub struct SessionVwap {
    window: SessionWindow,
}

impl SessionVwap {
    pub fn new(window: SessionWindow) -> Self {
        Self { window }
    }
}

impl Indicator<IntradayBar> for SessionVwap {
    fn name(&self) -> &str {
        "vwap_session"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[IntradayBar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        let mut session = None;
        let mut cum_pv = 0.0;
        let mut cum_vol = 0.0;

        for bar in bars {
            if !self.window.contains(bar.time()) {
                result.push(f64::NAN);
                continue;
            }

            if session != Some(bar.date()) {
                session = Some(bar.date());
                cum_pv = 0.0;
                cum_vol = 0.0;
            }

            cum_pv += bar.typical_price() * bar.volume;
            cum_vol += bar.volume;

            result.push(if cum_vol > 0.0 {
                cum_pv / cum_vol
            } else {
                f64::NAN
            });
        }

        result
    }
}
