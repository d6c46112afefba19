//! Wilder ATR. Used on daily bars to size volatility stops.
//!
//! The first bar has no previous close, so its true range is its high-low
//! range. ATR is seeded with the mean of the first `period` true ranges and
//! first lands on index `period - 1`.

use super::smooth::wilder_mean_seeded;
use super::Indicator;
use crate::domain::PriceBar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// True range against the previous close; high-low for the first bar.
pub fn true_range<B: PriceBar>(bars: &[B]) -> Vec<f64> {
    bars.first()
        .map(|b| b.high() - b.low())
        .into_iter()
        .chain(bars.windows(2).map(|w| {
            let prev_close = w[0].close();
            let (high, low) = (w[1].high(), w[1].low());
            (high - low)
                .max((high - prev_close).abs())
                .max((low - prev_close).abs())
        }))
        .collect()
}

impl<B: PriceBar> Indicator<B> for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period - 1
    }

    fn compute(&self, bars: &[B]) -> Vec<f64> {
        wilder_mean_seeded(&true_range(bars), self.period)
    }
}
